//! Command-line interface and command dispatch.
//!
//! | Command | Output |
//! |---------|--------|
//! | `report` | Fundamentals research report (text or JSON) |
//! | `metrics` | Quick trailing and forward metrics |
//! | `chart` | Yahoo chart payload with indicators (JSON) |
//! | `finnhub-chart` | Finnhub chart payload with indicators (JSON) |
//! | `sec` | Growth and margins from SEC filings |
//! | `news` | Stock news or top business headlines |
//! | `tweets` | Collect recent posts into the CSV file |
//! | `analyze` | Build the sentiment prompt and summarize it |
//! | `pipeline` | `tweets` then `analyze` |

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use secrecy::SecretString;
use serde::Serialize;
use std::io::{self, BufRead, IsTerminal, Write};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::llm::gemini::GeminiClient;
use crate::llm::Summarizer;
use crate::providers::finnhub::FinnhubClient;
use crate::providers::news::NewsClient;
use crate::providers::sec::SecClient;
use crate::providers::twitter::TwitterClient;
use crate::providers::yahoo::YahooClient;
use crate::providers::{BarRequest, NewsSource};
use crate::report::chart::{fetch_chart, ChartPayload};
use crate::report::fundamentals::build_report;
use crate::report::metrics::build_metrics;
use crate::report::news::NewsDigest;
use crate::report::sec::build_sec_report;
use crate::sentiment::{analyze_file, fetch_posts, run_pipeline};
use crate::types::{Interval, ScoutError};

/// Stock research from the command line.
#[derive(Debug, Parser)]
#[command(name = "tickerscope", version, about = "Stock research reports, chart payloads and market sentiment")]
pub struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, default_value = crate::config::DEFAULT_CONFIG_FILE)]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fundamentals research report: growth, margins, surprises, short interest.
    Report(TickerArgs),

    /// Quick metrics: FCF growth, gross margin, earnings, forward estimates.
    Metrics(TickerArgs),

    /// Chart payload from Yahoo Finance.
    ///
    ///   tickerscope chart AAPL 1d 1y
    Chart(ChartArgs),

    /// Chart payload from Finnhub candles (key from --api-key or FINNHUB_API_KEY).
    FinnhubChart(FinnhubChartArgs),

    /// Growth and EBITDA margins from SEC XBRL company facts.
    Sec(TickerArgs),

    /// Stock news from NewsAPI, or top business headlines with --top.
    News(NewsArgs),

    /// Collect recent posts from the configured accounts into CSV.
    Tweets,

    /// Build the sentiment prompt from the posts CSV and summarize it.
    Analyze(AnalyzeArgs),

    /// Collect posts, then analyze them.
    Pipeline,
}

#[derive(Debug, Args)]
pub struct TickerArgs {
    /// Ticker symbol; prompted for when omitted.
    pub ticker: Option<String>,

    /// Print JSON instead of the text report.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ChartArgs {
    pub ticker: Option<String>,
    /// Bar interval: 1m, 5m, 15m, 30m, 1h, 1d, 1wk, 1mo.
    pub interval: Option<String>,
    /// Look-back period: 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max.
    pub period: Option<String>,
}

#[derive(Debug, Args)]
pub struct FinnhubChartArgs {
    pub ticker: Option<String>,
    /// Look-back period: 1d, 5d, 1mo, 3mo, 1y, 5y, max.
    pub period: Option<String>,

    /// Finnhub API key; overrides the configured environment variable.
    #[arg(long)]
    pub api_key: Option<String>,
}

#[derive(Debug, Args)]
pub struct NewsArgs {
    pub ticker: Option<String>,

    /// Company name added to the search query.
    #[arg(long)]
    pub company: Option<String>,

    /// Top business headlines instead of stock news.
    #[arg(long)]
    pub top: bool,

    #[arg(long)]
    pub json: bool,

    /// NewsAPI key; overrides the configured environment variable.
    #[arg(long)]
    pub api_key: Option<String>,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Posts CSV to analyze; defaults to the configured path.
    #[arg(long)]
    pub csv: Option<String>,
}

// ---------------------------------------------------------------------------
// Interactive input
// ---------------------------------------------------------------------------

/// Ask for one line on stdin. Returns `None` when stdin is not a terminal
/// or the answer is blank.
fn ask(label: &str) -> Result<Option<String>> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return Ok(None);
    }
    print!("{label}");
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    stdin
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    let answer = line.trim().to_string();
    Ok((!answer.is_empty()).then_some(answer))
}

fn normalize_ticker(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Ticker from the argument, or from an interactive prompt.
fn require_ticker(arg: Option<&str>) -> Result<String> {
    let raw = match arg.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => t.to_string(),
        None => ask("Enter ticker symbol: ")?.ok_or_else(|| ScoutError::Config("ticker symbol required".to_string()))?,
    };
    Ok(normalize_ticker(&raw))
}

/// Credential given on the command line, else from the environment.
fn credential_or_env(arg: Option<&str>, env_name: &str) -> Result<SecretString, ScoutError> {
    match arg.map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => Ok(SecretString::new(key.to_string())),
        None => AppConfig::resolve_env(env_name),
    }
}

/// Credential from the argument or environment, or from an interactive prompt.
fn require_credential(arg: Option<&str>, env_name: &str, label: &str) -> Result<SecretString> {
    match credential_or_env(arg, env_name) {
        Ok(secret) => Ok(secret),
        Err(missing) => match ask(&format!("Enter your {label}: "))? {
            Some(value) => Ok(SecretString::new(value)),
            None => Err(missing.into()),
        },
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{text}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub async fn run(cli: Cli) -> Result<()> {
    let cfg = AppConfig::load_or_default(&cli.config)?;
    let timeout = cfg.providers.timeout_secs;

    match cli.command {
        Command::Report(args) => {
            let ticker = require_ticker(args.ticker.as_deref())?;
            let yahoo = YahooClient::new(timeout)?;
            let report = build_report(&yahoo, &ticker, Utc::now().date_naive()).await;
            if args.json {
                print_json(&report)?;
            } else {
                print!("{report}");
            }
        }

        Command::Metrics(args) => {
            let ticker = require_ticker(args.ticker.as_deref())?;
            let yahoo = YahooClient::new(timeout)?;
            let metrics = build_metrics(&yahoo, &ticker).await;
            if args.json {
                print_json(&metrics)?;
            } else {
                print!("{metrics}");
            }
        }

        Command::Chart(args) => {
            let payload = match args.ticker.as_deref().map(normalize_ticker).filter(|t| !t.is_empty()) {
                None => ChartPayload::failure_message("Ticker required"),
                Some(ticker) => {
                    let interval = args.interval.unwrap_or_else(|| cfg.chart.default_interval.clone());
                    let period = args.period.unwrap_or_else(|| cfg.chart.default_period.clone());
                    match interval.parse::<Interval>() {
                        Err(e) => ChartPayload::failure_message(&e.to_string()),
                        Ok(interval) => {
                            let yahoo = YahooClient::new(timeout)?;
                            let request = BarRequest { ticker, period, interval };
                            fetch_chart(&yahoo, &request).await
                        }
                    }
                }
            };
            println!("{}", payload.to_json()?);
        }

        Command::FinnhubChart(args) => {
            let ticker = args.ticker.as_deref().map(normalize_ticker).filter(|t| !t.is_empty());
            let key = credential_or_env(args.api_key.as_deref(), &cfg.providers.finnhub_key_env);
            let (ticker, key) = match (ticker, key) {
                (Some(ticker), Ok(key)) => (ticker, key),
                (ticker, key) => {
                    println!("{}", ChartPayload::failure_message("Ticker and API key required").to_json()?);
                    if let Err(missing) = key {
                        return Err(missing.into());
                    }
                    anyhow::bail!(ScoutError::Config(format!(
                        "ticker symbol required (got {ticker:?})"
                    )));
                }
            };
            let period = args.period.unwrap_or_else(|| cfg.chart.default_period.clone());
            let finnhub = FinnhubClient::new(key, timeout)?;
            let request = BarRequest {
                ticker,
                period,
                interval: Interval::OneDay,
            };
            println!("{}", fetch_chart(&finnhub, &request).await.to_json()?);
        }

        Command::Sec(args) => {
            let ticker = require_ticker(args.ticker.as_deref())?;
            let sec = SecClient::new(&cfg.providers.sec_user_agent, timeout)?;
            let report = build_sec_report(&sec, &ticker)
                .await
                .with_context(|| format!("SEC report for {ticker} failed"))?;
            if args.json {
                print_json(&report)?;
            } else {
                print!("{report}");
            }
        }

        Command::News(args) => {
            let key = require_credential(args.api_key.as_deref(), &cfg.providers.news_api_key_env, "NewsAPI key")?;
            let client = NewsClient::new(key, timeout, cfg.news.lookback_days)?;

            let digest = if args.top {
                NewsDigest::top_headlines(client.top_headlines(cfg.news.page_size).await?)
            } else {
                let prompted = args.ticker.is_none();
                let ticker = require_ticker(args.ticker.as_deref())?;
                let company = match args.company {
                    Some(c) => Some(c),
                    None if prompted => ask("Enter company name (optional): ")?,
                    None => None,
                };
                let articles = client
                    .stock_news(&ticker, company.as_deref(), cfg.news.page_size)
                    .await?;
                NewsDigest::for_ticker(&ticker, company.as_deref(), articles)
            };

            if args.json {
                print_json(&digest)?;
            } else {
                print!("{digest}");
            }
        }

        Command::Tweets => {
            let token = AppConfig::resolve_env(&cfg.providers.twitter_token_env)?;
            let twitter = TwitterClient::new(token, timeout)?;
            let summary = fetch_posts(&twitter, &cfg.sentiment, Utc::now()).await?;
            println!("\nSuccess! {summary}");
        }

        Command::Analyze(args) => {
            let path = args.csv.unwrap_or_else(|| cfg.sentiment.csv_path.clone());
            let gemini = match AppConfig::resolve_env(&cfg.providers.gemini_key_env) {
                Ok(key) => Some(GeminiClient::new(key, Some(cfg.sentiment.model.clone()), timeout)?),
                Err(e) => {
                    info!(error = %e, "No model credential, prompt only");
                    None
                }
            };
            let summarizer = gemini.as_ref().map(|g| g as &dyn Summarizer);
            let analysis = analyze_file(&path, summarizer).await?;
            print!("{analysis}");
        }

        Command::Pipeline => {
            // Both credentials are checked before any request goes out.
            let token = AppConfig::resolve_env(&cfg.providers.twitter_token_env)?;
            let key = AppConfig::resolve_env(&cfg.providers.gemini_key_env)?;
            let twitter = TwitterClient::new(token, timeout)?;
            let gemini = GeminiClient::new(key, Some(cfg.sentiment.model.clone()), timeout)?;

            println!("{}", "=".repeat(60));
            println!("   MARKET SENTIMENT PIPELINE");
            println!("{}", "=".repeat(60));

            match run_pipeline(&twitter, &gemini, &cfg.sentiment, Utc::now()).await {
                Ok((fetched, analysis)) => {
                    println!(">>> STEP 1: {fetched}");
                    println!(">>> STEP 2: Analyzing with {}", gemini.model_name());
                    print!("{analysis}");
                    println!("{}", "=".repeat(60));
                    println!("   PIPELINE COMPLETE");
                    println!("{}", "=".repeat(60));
                }
                Err(e) => {
                    warn!(error = %e, "Pipeline stopped");
                    return Err(e.context("Sentiment pipeline failed"));
                }
            }
        }
    }

    Ok(())
}
