//! External data adapters.
//!
//! Each adapter is a narrow translation layer between one provider's
//! response shape and the types in [`crate::types`]. The traits below are
//! the seams the report builders depend on, so the builders can be tested
//! against mocks without any network.

pub mod finnhub;
pub mod news;
pub mod sec;
pub mod twitter;
pub mod yahoo;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use std::time::Duration;

use crate::types::{
    Article, Bar, CompanyProfile, EarningsEvent, EstimateTrend, Interval, Post, QuarterlyFact,
    ScoutError, ShortStats,
};

/// User-Agent sent to providers that do not require a specific one.
pub const USER_AGENT: &str = "tickerscope/0.1.0";

// ---------------------------------------------------------------------------
// Request / response shapes
// ---------------------------------------------------------------------------

/// Historical bar request. How `period` and `interval` map onto the wire
/// is up to each adapter.
#[derive(Debug, Clone)]
pub struct BarRequest {
    pub ticker: String,
    /// Look-back label: 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max.
    pub period: String,
    pub interval: Interval,
}

/// Bars returned by a [`BarSource`], ascending by time.
#[derive(Debug, Clone)]
pub struct BarSeries {
    pub ticker: String,
    /// Interval label as the provider understood it ("1d", "D", "60", ...).
    pub interval: String,
    pub bars: Vec<Bar>,
}

/// Quarterly statement line items available from the market-data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementItem {
    TotalRevenue,
    GrossProfit,
    FreeCashFlow,
}

impl StatementItem {
    pub fn label(&self) -> &'static str {
        match self {
            StatementItem::TotalRevenue => "Total Revenue",
            StatementItem::GrossProfit => "Gross Profit",
            StatementItem::FreeCashFlow => "Free Cash Flow",
        }
    }
}

/// One page of social search results.
#[derive(Debug, Clone, Default)]
pub struct PostPage {
    /// Posts in provider order (newest first), authors already resolved.
    /// Posts whose author could not be resolved are dropped.
    pub posts: Vec<Post>,
    /// Whether the provider returned any data at all for this page.
    pub had_data: bool,
    /// Timestamps of the first and last post in provider order, including
    /// posts that were dropped for an unresolved author.
    pub first_created: Option<DateTime<Utc>>,
    pub last_created: Option<DateTime<Utc>>,
    pub next_token: Option<String>,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Source of historical OHLCV bars.
#[async_trait]
pub trait BarSource: Send + Sync {
    async fn fetch_bars(&self, request: &BarRequest) -> Result<BarSeries>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

/// Source of company fundamentals from a market-data provider.
#[async_trait]
pub trait FundamentalsSource: Send + Sync {
    async fn company_profile(&self, ticker: &str) -> Result<CompanyProfile>;

    /// Quarterly values of one statement line, in any order.
    async fn quarterly_statement(
        &self,
        ticker: &str,
        item: StatementItem,
    ) -> Result<Vec<QuarterlyFact>>;

    /// Past (reported) and upcoming earnings events.
    async fn earnings_events(&self, ticker: &str) -> Result<Vec<EarningsEvent>>;

    async fn short_stats(&self, ticker: &str) -> Result<ShortStats>;

    /// Analyst consensus trend for upcoming periods.
    async fn estimate_trends(&self, ticker: &str) -> Result<Vec<EstimateTrend>>;
}

/// Source of news articles.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn stock_news(
        &self,
        ticker: &str,
        company_name: Option<&str>,
        limit: u32,
    ) -> Result<Vec<Article>>;

    async fn top_headlines(&self, limit: u32) -> Result<Vec<Article>>;
}

/// Cursor-paginated social post search.
#[async_trait]
pub trait PostSearch: Send + Sync {
    async fn search_page(&self, query: &str, next_token: Option<&str>) -> Result<PostPage>;
}

// ---------------------------------------------------------------------------
// Shared HTTP helpers
// ---------------------------------------------------------------------------

/// Build an HTTP client with the given User-Agent and request timeout.
pub fn http_client(user_agent: &str, timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(user_agent)
        .build()
        .context("Failed to build HTTP client")
}

/// Turn a non-success response into a provider error carrying the body.
pub async fn ensure_success(resp: Response, provider: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let snippet: String = body.chars().take(200).collect();
    Err(ScoutError::provider(provider, format!("HTTP {status}: {snippet}")).into())
}

/// Sort bars by time and keep the last bar for any repeated timestamp.
pub(crate) fn dedup_ascending(mut bars: Vec<Bar>) -> Vec<Bar> {
    bars.sort_by_key(|b| b.time);
    let mut out: Vec<Bar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match out.last_mut() {
            Some(last) if last.time == bar.time => *last = bar,
            _ => out.push(bar),
        }
    }
    out
}
