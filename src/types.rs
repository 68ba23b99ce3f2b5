//! Shared types for TICKERSCOPE.
//!
//! These types form the data model used across all modules: price bars,
//! derived time series, quarterly statement facts, news articles and
//! social posts. Provider adapters translate into these shapes; the
//! analytics and report modules only ever see these.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Price data
// ---------------------------------------------------------------------------

/// One OHLCV bar. Immutable once fetched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Unix timestamp (seconds) of the bar open.
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Whether the bar closed at or above its open.
    pub fn is_up(&self) -> bool {
        self.close >= self.open
    }
}

impl fmt::Display for Bar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={} O={:.2} H={:.2} L={:.2} C={:.2} V={:.0}",
            self.time, self.open, self.high, self.low, self.close, self.volume,
        )
    }
}

/// A single (timestamp, value) point of a derived series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub time: i64,
    pub value: f64,
}

/// Bar interval accepted by the chart providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    OneDay,
    OneWeek,
    OneMonth,
}

impl Interval {
    /// Wire code used by Yahoo's chart endpoint.
    pub fn as_code(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::ThirtyMinutes => "30m",
            Interval::OneHour => "1h",
            Interval::OneDay => "1d",
            Interval::OneWeek => "1wk",
            Interval::OneMonth => "1mo",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

impl std::str::FromStr for Interval {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1m" => Ok(Interval::OneMinute),
            "5m" => Ok(Interval::FiveMinutes),
            "15m" => Ok(Interval::FifteenMinutes),
            "30m" => Ok(Interval::ThirtyMinutes),
            "1h" | "60m" => Ok(Interval::OneHour),
            "1d" => Ok(Interval::OneDay),
            "1wk" => Ok(Interval::OneWeek),
            "1mo" => Ok(Interval::OneMonth),
            other => Err(ScoutError::Config(format!(
                "invalid interval '{other}', expected one of 1m, 5m, 15m, 30m, 1h, 1d, 1wk, 1mo"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Fundamentals
// ---------------------------------------------------------------------------

/// Fiscal period label as reported in regulatory filings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FiscalPeriod {
    Q1,
    Q2,
    Q3,
    Q4,
    FY,
}

impl FiscalPeriod {
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "Q1" => Some(FiscalPeriod::Q1),
            "Q2" => Some(FiscalPeriod::Q2),
            "Q3" => Some(FiscalPeriod::Q3),
            "Q4" => Some(FiscalPeriod::Q4),
            "FY" => Some(FiscalPeriod::FY),
            _ => None,
        }
    }

    /// Whether this period is one of the interim quarters covered by 10-Q filings.
    pub fn is_interim(&self) -> bool {
        matches!(self, FiscalPeriod::Q1 | FiscalPeriod::Q2 | FiscalPeriod::Q3)
    }
}

impl fmt::Display for FiscalPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FiscalPeriod::Q1 => write!(f, "Q1"),
            FiscalPeriod::Q2 => write!(f, "Q2"),
            FiscalPeriod::Q3 => write!(f, "Q3"),
            FiscalPeriod::Q4 => write!(f, "Q4"),
            FiscalPeriod::FY => write!(f, "FY"),
        }
    }
}

/// A quarterly financial fact keyed by XBRL concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterlyFact {
    /// Period end date.
    pub end: NaiveDate,
    pub fiscal_year: Option<i32>,
    pub fiscal_period: Option<FiscalPeriod>,
    pub value: f64,
    pub filed: Option<NaiveDate>,
    pub form: Option<String>,
}

impl QuarterlyFact {
    /// A fact with no fiscal metadata, as reported by statement providers
    /// that only expose the period end date.
    pub fn dated(end: NaiveDate, value: f64) -> Self {
        QuarterlyFact {
            end,
            fiscal_year: None,
            fiscal_period: None,
            value,
            filed: None,
            form: None,
        }
    }

    /// Human-readable period label ("FY2024 Q2" or the end date).
    pub fn label(&self) -> String {
        match (self.fiscal_year, self.fiscal_period) {
            (Some(fy), Some(fp)) => format!("FY{fy} {fp}"),
            _ => self.end.format("%Y-%m-%d").to_string(),
        }
    }
}

/// One earnings event: a reported quarter or an upcoming announcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsEvent {
    pub date: NaiveDate,
    pub reported_eps: Option<f64>,
    pub estimated_eps: Option<f64>,
}

impl EarningsEvent {
    pub fn is_reported(&self) -> bool {
        self.reported_eps.is_some()
    }
}

/// Headline company facts from the quote summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
}

/// Short-interest statistics. Each field is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortStats {
    /// Fraction of float sold short (0.05 = 5%).
    pub short_percent_of_float: Option<f64>,
    pub shares_short: Option<u64>,
    pub shares_short_prior_month: Option<u64>,
    /// Days to cover.
    pub short_ratio: Option<f64>,
}

/// Analyst consensus for one forward period ("0q", "+1q", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateTrend {
    pub period: String,
    pub revenue_avg: Option<f64>,
    pub revenue_year_ago: Option<f64>,
    pub eps_avg: Option<f64>,
    pub eps_year_ago: Option<f64>,
}

// ---------------------------------------------------------------------------
// News and social
// ---------------------------------------------------------------------------

/// A news article normalised from NewsAPI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    pub description: String,
    pub source: String,
    pub author: String,
    pub published_at: String,
    pub url: String,
}

/// A social post collected for sentiment analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub handle: String,
    pub name: String,
    pub text: String,
    pub likes: u64,
    pub retweets: u64,
}

impl Post {
    pub fn url(&self) -> String {
        format!("https://twitter.com/{}/status/{}", self.handle, self.id)
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@{} [{}] {} (likes={}, retweets={})",
            self.handle,
            self.created_at.format("%Y-%m-%d %H:%M"),
            self.text,
            self.likes,
            self.retweets,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for TICKERSCOPE.
#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    #[error("Missing credential: set {name} in the environment or .env")]
    MissingCredential { name: String },

    #[error("No data available for {0}")]
    NoData(String),

    #[error("Provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    #[error("Malformed response from {provider}: {message}")]
    MalformedResponse { provider: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ScoutError {
    pub fn provider(provider: &str, message: impl Into<String>) -> Self {
        ScoutError::Provider {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    pub fn malformed(provider: &str, message: impl Into<String>) -> Self {
        ScoutError::MalformedResponse {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_roundtrip() {
        for code in ["1m", "5m", "15m", "30m", "1h", "1d", "1wk", "1mo"] {
            let interval: Interval = code.parse().unwrap();
            assert_eq!(interval.as_code(), code);
        }
    }

    #[test]
    fn test_interval_invalid() {
        let err = "2d".parse::<Interval>().unwrap_err();
        assert!(err.to_string().contains("invalid interval"));
    }

    #[test]
    fn test_fiscal_period_parse() {
        assert_eq!(FiscalPeriod::parse("q2"), Some(FiscalPeriod::Q2));
        assert_eq!(FiscalPeriod::parse("FY"), Some(FiscalPeriod::FY));
        assert_eq!(FiscalPeriod::parse("H1"), None);
        assert!(FiscalPeriod::Q3.is_interim());
        assert!(!FiscalPeriod::FY.is_interim());
    }

    #[test]
    fn test_bar_direction() {
        let up = Bar { time: 0, open: 10.0, high: 11.0, low: 9.5, close: 10.0, volume: 1.0 };
        let down = Bar { close: 9.9, ..up };
        assert!(up.is_up());
        assert!(!down.is_up());
    }

    #[test]
    fn test_post_url() {
        let post = Post {
            id: "1790000000000000000".into(),
            created_at: Utc::now(),
            handle: "spotgamma".into(),
            name: "SpotGamma".into(),
            text: "gamma flip".into(),
            likes: 4,
            retweets: 1,
        };
        assert_eq!(post.url(), "https://twitter.com/spotgamma/status/1790000000000000000");
    }

    #[test]
    fn test_error_display() {
        let e = ScoutError::MissingCredential { name: "FINNHUB_API_KEY".into() };
        assert!(e.to_string().contains("FINNHUB_API_KEY"));
        let e = ScoutError::provider("sec", "HTTP 404");
        assert_eq!(e.to_string(), "Provider error (sec): HTTP 404");
    }
}
