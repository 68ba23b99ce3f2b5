//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! field has a default, so a missing file is not an error. Secrets (API
//! keys, bearer tokens) are referenced by env-var name in the config and
//! resolved at runtime into [`SecretString`]s.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::types::ScoutError;

/// Default config file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub providers: ProvidersConfig,
    pub chart: ChartConfig,
    pub news: NewsConfig,
    pub sentiment: SentimentConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Request timeout applied to every HTTP client.
    pub timeout_secs: u64,
    /// SEC asks for a contact in the User-Agent of every request.
    pub sec_user_agent: String,
    pub finnhub_key_env: String,
    pub news_api_key_env: String,
    pub twitter_token_env: String,
    pub gemini_key_env: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            sec_user_agent: "Research Analyst research@example.com".to_string(),
            finnhub_key_env: "FINNHUB_API_KEY".to_string(),
            news_api_key_env: "NEWS_API_KEY".to_string(),
            twitter_token_env: "TWITTER_BEARER_TOKEN".to_string(),
            gemini_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChartConfig {
    pub default_interval: String,
    pub default_period: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            default_interval: "1d".to_string(),
            default_period: "1y".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NewsConfig {
    pub lookback_days: i64,
    pub page_size: u32,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            lookback_days: 7,
            page_size: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SentimentConfig {
    pub accounts: Vec<String>,
    /// Maximum posts kept per account.
    pub per_author_cap: usize,
    /// Maximum search pages requested.
    pub max_pages: u32,
    /// Only posts newer than this many hours are kept.
    pub hours_back: i64,
    pub csv_path: String,
    pub model: String,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            accounts: [
                "tony_mansour", "jam_croissant", "vixologist", "_justinjc_",
                "NoelConvex", "vighnaraj2022", "jaredhstocks", "spotgamma",
                "lord_fed", "FedGuy12", "Ksidiii", "BergMilton",
                "KrisAbdelmessih", "wabuffo", "wesbury", "RyanDetrick",
                "zerohedge",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            per_author_cap: 3,
            max_pages: 10,
            hours_back: 24,
            csv_path: "market_tweets.csv".to_string(),
            model: "gemini-2.5-flash".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            debug!(path, "No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Resolve an environment variable name to a secret.
    ///
    /// Empty values count as missing.
    pub fn resolve_env(env_name: &str) -> Result<SecretString, ScoutError> {
        match std::env::var(env_name) {
            Ok(value) if !value.trim().is_empty() => Ok(SecretString::new(value.trim().to_string())),
            _ => Err(ScoutError::MissingCredential {
                name: env_name.to_string(),
            }),
        }
    }
}
