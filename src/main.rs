//! TICKERSCOPE: stock research from the command line
//!
//! Entry point. Loads `.env`, initialises structured logging on stderr and
//! runs one subcommand to completion.

use anyhow::Result;
use clap::Parser;
use tracing::error;

use tickerscope::cli::{self, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let args = Cli::parse();
    init_logging();

    if let Err(e) = cli::run(args).await {
        error!(error = %e, "Command failed");
        return Err(e);
    }
    Ok(())
}

/// Logs go to stderr so stdout stays clean for JSON payloads.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tickerscope=info"));

    let json_logging = std::env::var("TICKERSCOPE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
    }
}
