//! Yahoo Finance adapter.
//!
//! Three endpoints cover everything the reports need:
//!
//! - `/v8/finance/chart/{ticker}`: OHLCV bars by interval and range.
//! - `/ws/fundamentals-timeseries/v1/finance/timeseries/{ticker}`:
//!   quarterly statement lines (revenue, gross profit, free cash flow).
//! - `/v10/finance/quoteSummary/{ticker}`: profile, short interest,
//!   earnings history, calendar and analyst trend. Needs a session cookie
//!   (from `fc.yahoo.com`) and a crumb token, fetched once per adapter.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{dedup_ascending, ensure_success, BarRequest, BarSeries, BarSource, FundamentalsSource, StatementItem};
use crate::types::{
    Bar, CompanyProfile, EarningsEvent, EstimateTrend, QuarterlyFact, ScoutError, ShortStats,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const BASE_URL: &str = "https://query1.finance.yahoo.com";
const SESSION_URL: &str = "https://fc.yahoo.com";
const PROVIDER_NAME: &str = "yahoo";

/// Yahoo rejects obviously non-browser agents on the crumb endpoint.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// How far back to ask for quarterly statement lines.
const STATEMENT_LOOKBACK_DAYS: i64 = 5 * 366;

/// Results are announced before the following quarter closes.
const ANNOUNCEMENT_WINDOW_DAYS: u64 = 92;

// ---------------------------------------------------------------------------
// API response types (Yahoo JSON → Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesResponse {
    timeseries: TimeseriesEnvelope,
}

#[derive(Debug, Deserialize)]
struct TimeseriesEnvelope {
    #[serde(default)]
    result: Vec<TimeseriesResult>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesResult {
    meta: TimeseriesMeta,
    /// The series itself sits under a key named after the requested type.
    #[serde(flatten)]
    series: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesMeta {
    #[serde(default, rename = "type")]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeseriesEntry {
    as_of_date: NaiveDate,
    #[serde(default)]
    reported_value: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummaryEnvelope,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryEnvelope {
    #[serde(default)]
    result: Option<Vec<QuoteSummaryResult>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    #[serde(default)]
    price: Option<PriceModule>,
    #[serde(default)]
    financial_data: Option<FinancialDataModule>,
    #[serde(default)]
    default_key_statistics: Option<KeyStatisticsModule>,
    #[serde(default)]
    earnings_history: Option<EarningsHistoryModule>,
    #[serde(default)]
    earnings: Option<EarningsModule>,
    #[serde(default)]
    calendar_events: Option<CalendarEventsModule>,
    #[serde(default)]
    earnings_trend: Option<EarningsTrendModule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    #[serde(default)]
    long_name: Option<String>,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    market_cap: Option<RawValue>,
    #[serde(default)]
    regular_market_price: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialDataModule {
    #[serde(default)]
    current_price: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatisticsModule {
    #[serde(default)]
    shares_short: Option<RawValue>,
    #[serde(default)]
    shares_short_prior_month: Option<RawValue>,
    #[serde(default)]
    short_ratio: Option<RawValue>,
    #[serde(default)]
    short_percent_of_float: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct EarningsHistoryModule {
    #[serde(default)]
    history: Vec<EarningsHistoryEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EarningsHistoryEntry {
    #[serde(default)]
    eps_actual: Option<RawValue>,
    #[serde(default)]
    eps_estimate: Option<RawValue>,
    /// Fiscal quarter end as a unix timestamp.
    #[serde(default)]
    quarter: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EarningsModule {
    #[serde(default)]
    earnings_chart: Option<EarningsChart>,
}

#[derive(Debug, Deserialize)]
struct EarningsChart {
    #[serde(default)]
    quarterly: Vec<EarningsChartQuarter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EarningsChartQuarter {
    /// Announcement date as a unix timestamp.
    #[serde(default)]
    reported_date: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct CalendarEventsModule {
    #[serde(default)]
    earnings: Option<CalendarEarnings>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarEarnings {
    #[serde(default)]
    earnings_date: Vec<RawValue>,
    #[serde(default)]
    earnings_average: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct EarningsTrendModule {
    #[serde(default)]
    trend: Vec<TrendEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrendEntry {
    period: String,
    #[serde(default)]
    revenue_estimate: Option<RevenueEstimate>,
    #[serde(default)]
    earnings_estimate: Option<EpsEstimate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RevenueEstimate {
    #[serde(default)]
    avg: Option<RawValue>,
    #[serde(default)]
    year_ago_revenue: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EpsEstimate {
    #[serde(default)]
    avg: Option<RawValue>,
    #[serde(default)]
    year_ago_eps: Option<RawValue>,
}

/// Yahoo wraps most numbers as `{"raw": 1.0, "fmt": "1.00"}`; missing
/// values come back as `{}`.
#[derive(Debug, Clone, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}

fn raw(value: &Option<RawValue>) -> Option<f64> {
    value.as_ref().and_then(|v| v.raw).filter(|v| v.is_finite())
}

fn unix_to_date(secs: f64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(secs as i64, 0).map(|dt| dt.date_naive())
}

// ---------------------------------------------------------------------------
// Quote summary modules
// ---------------------------------------------------------------------------

const PROFILE_MODULES: &str = "price,financialData";
const SHORT_MODULES: &str = "defaultKeyStatistics";
const EARNINGS_MODULES: &str = "earningsHistory,earnings,calendarEvents";
const TREND_MODULES: &str = "earningsTrend";

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct YahooClient {
    http: Client,
    base_url: String,
    session_url: String,
    crumb: OnceCell<String>,
}

impl YahooClient {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .context("Failed to build Yahoo HTTP client")?;

        Ok(Self {
            http,
            base_url: BASE_URL.to_string(),
            session_url: SESSION_URL.to_string(),
            crumb: OnceCell::new(),
        })
    }

    /// Point every endpoint (including the session cookie) at `base_url`.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        self.session_url = base.clone();
        self.base_url = base;
        self
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self
            .http
            .get(url)
            .header("referer", "https://finance.yahoo.com/")
            .send()
            .await
            .with_context(|| format!("Yahoo request failed: {url}"))?;
        let resp = ensure_success(resp, PROVIDER_NAME).await?;
        resp.json::<T>()
            .await
            .map_err(|e| ScoutError::malformed(PROVIDER_NAME, e.to_string()).into())
    }

    /// Session cookie + crumb, fetched on first use.
    async fn crumb(&self) -> Result<&str> {
        let crumb = self
            .crumb
            .get_or_try_init(|| async {
                // Only the Set-Cookie matters; the page itself is usually a 404.
                if let Err(e) = self.http.get(&self.session_url).send().await {
                    debug!(error = %e, url = %self.session_url, "Yahoo session cookie request failed");
                }

                let url = format!("{}/v1/test/getcrumb", self.base_url);
                let resp = self
                    .http
                    .get(&url)
                    .send()
                    .await
                    .context("Yahoo crumb request failed")?;
                let body = ensure_success(resp, PROVIDER_NAME).await?.text().await?;
                let crumb = body.trim().to_string();

                if crumb.is_empty() || crumb.len() > 100 || crumb.contains(' ') || crumb.contains('<') {
                    anyhow::bail!(ScoutError::malformed(PROVIDER_NAME, "unusable crumb token"));
                }
                debug!("Yahoo crumb acquired");
                Ok::<String, anyhow::Error>(crumb)
            })
            .await?;
        Ok(crumb.as_str())
    }

    async fn quote_summary(&self, ticker: &str, modules: &str) -> Result<QuoteSummaryResult> {
        let crumb = self.crumb().await?;
        let url = format!(
            "{}/v10/finance/quoteSummary/{}?modules={}&crumb={}",
            self.base_url,
            urlencoding::encode(ticker),
            modules,
            urlencoding::encode(crumb),
        );
        let body: QuoteSummaryResponse = self.get_json(&url).await?;
        parse_quote_summary(ticker, body)
    }
}

fn parse_chart(ticker: &str, body: ChartResponse) -> Result<Vec<Bar>> {
    if let Some(error) = body.chart.error.filter(|e| !e.is_null()) {
        debug!(ticker, %error, "Yahoo chart returned an error object");
        return Err(ScoutError::NoData(ticker.to_string()).into());
    }

    let result = body
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ScoutError::NoData(ticker.to_string()))?;

    let timestamps = result.timestamp.unwrap_or_default();
    let Some(quote) = result.indicators.quote.first() else {
        return Err(ScoutError::NoData(ticker.to_string()).into());
    };

    let mut bars: Vec<Bar> = Vec::with_capacity(timestamps.len());
    for (i, &time) in timestamps.iter().enumerate() {
        // Rows with any missing price are dropped, not zero-filled
        let field = |col: &[Option<f64>]| col.get(i).copied().flatten();
        let (Some(open), Some(high), Some(low), Some(close)) = (
            field(quote.open.as_slice()),
            field(quote.high.as_slice()),
            field(quote.low.as_slice()),
            field(quote.close.as_slice()),
        ) else {
            continue;
        };
        let volume = field(quote.volume.as_slice()).unwrap_or(0.0);
        bars.push(Bar { time, open, high, low, close, volume });
    }

    Ok(dedup_ascending(bars))
}

fn parse_timeseries(type_name: &str, body: TimeseriesResponse) -> Result<Vec<QuarterlyFact>> {
    let Some(result) = body
        .timeseries
        .result
        .into_iter()
        .find(|r| r.meta.types.iter().any(|t| t == type_name))
    else {
        return Ok(Vec::new());
    };

    let Some(raw_series) = result.series.get(type_name) else {
        return Ok(Vec::new());
    };

    let entries: Vec<Option<TimeseriesEntry>> = serde_json::from_value(raw_series.clone())
        .map_err(|e| ScoutError::malformed(PROVIDER_NAME, format!("{type_name}: {e}")))?;

    let mut facts: Vec<QuarterlyFact> = entries
        .into_iter()
        .flatten()
        .filter_map(|e| raw(&e.reported_value).map(|v| QuarterlyFact::dated(e.as_of_date, v)))
        .collect();
    facts.sort_by(|a, b| b.end.cmp(&a.end));
    facts.dedup_by(|a, b| a.end == b.end);
    Ok(facts)
}

fn parse_quote_summary(ticker: &str, body: QuoteSummaryResponse) -> Result<QuoteSummaryResult> {
    if let Some(error) = body.quote_summary.error.filter(|e| !e.is_null()) {
        debug!(ticker, %error, "Yahoo quoteSummary returned an error object");
        return Err(ScoutError::NoData(ticker.to_string()).into());
    }
    body.quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ScoutError::NoData(ticker.to_string()).into())
}

fn statement_type(item: StatementItem) -> &'static str {
    match item {
        StatementItem::TotalRevenue => "quarterlyTotalRevenue",
        StatementItem::GrossProfit => "quarterlyGrossProfit",
        StatementItem::FreeCashFlow => "quarterlyFreeCashFlow",
    }
}

fn profile_from(summary: &QuoteSummaryResult) -> CompanyProfile {
    let price = summary.price.as_ref();
    CompanyProfile {
        name: price.and_then(|p| p.long_name.clone().or_else(|| p.short_name.clone())),
        price: summary
            .financial_data
            .as_ref()
            .and_then(|f| raw(&f.current_price))
            .or_else(|| price.and_then(|p| raw(&p.regular_market_price))),
        market_cap: price.and_then(|p| raw(&p.market_cap)),
    }
}

fn short_stats_from(summary: &QuoteSummaryResult) -> ShortStats {
    let Some(stats) = summary.default_key_statistics.as_ref() else {
        return ShortStats::default();
    };
    ShortStats {
        short_percent_of_float: raw(&stats.short_percent_of_float),
        shares_short: raw(&stats.shares_short).map(|v| v as u64),
        shares_short_prior_month: raw(&stats.shares_short_prior_month).map(|v| v as u64),
        short_ratio: raw(&stats.short_ratio),
    }
}

/// First known announcement falling after `quarter_end` and before the
/// following quarter closes.
fn announcement_after(announced: &[NaiveDate], quarter_end: NaiveDate) -> Option<NaiveDate> {
    let limit = quarter_end.checked_add_days(Days::new(ANNOUNCEMENT_WINDOW_DAYS))?;
    announced
        .iter()
        .copied()
        .find(|d| *d > quarter_end && *d <= limit)
}

/// Reported quarters from the history plus upcoming calendar dates,
/// most recent first. Reported quarters are dated by announcement; the
/// quarter end is used only when no announcement date is known.
fn earnings_from(summary: &QuoteSummaryResult) -> Vec<EarningsEvent> {
    let calendar = summary.calendar_events.as_ref().and_then(|c| c.earnings.as_ref());
    let calendar_dates: Vec<NaiveDate> = calendar
        .map(|c| c.earnings_date.iter().filter_map(|d| d.raw).filter_map(unix_to_date).collect())
        .unwrap_or_default();

    let mut announced: Vec<NaiveDate> = summary
        .earnings
        .as_ref()
        .and_then(|e| e.earnings_chart.as_ref())
        .map(|c| {
            c.quarterly
                .iter()
                .filter_map(|q| raw(&q.reported_date))
                .filter_map(unix_to_date)
                .collect()
        })
        .unwrap_or_default();
    announced.extend(calendar_dates.iter().copied());
    announced.sort();
    announced.dedup();

    let mut events: Vec<EarningsEvent> = summary
        .earnings_history
        .as_ref()
        .map(|h| {
            h.history
                .iter()
                .filter_map(|entry| {
                    let quarter_end = raw(&entry.quarter).and_then(unix_to_date)?;
                    let date = announcement_after(&announced, quarter_end).unwrap_or_else(|| {
                        debug!(%quarter_end, "No announcement date for quarter, using quarter end");
                        quarter_end
                    });
                    Some(EarningsEvent {
                        date,
                        reported_eps: raw(&entry.eps_actual),
                        estimated_eps: raw(&entry.eps_estimate),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let estimate = calendar.and_then(|c| raw(&c.earnings_average));
    for date in calendar_dates {
        // Already reported: the history entry carries the figures
        if events.iter().any(|e| e.date == date) {
            continue;
        }
        events.push(EarningsEvent {
            date,
            reported_eps: None,
            estimated_eps: estimate,
        });
    }

    events.sort_by(|a, b| b.date.cmp(&a.date));
    events
}

fn trends_from(summary: &QuoteSummaryResult) -> Vec<EstimateTrend> {
    summary
        .earnings_trend
        .as_ref()
        .map(|t| {
            t.trend
                .iter()
                .map(|entry| EstimateTrend {
                    period: entry.period.clone(),
                    revenue_avg: entry.revenue_estimate.as_ref().and_then(|r| raw(&r.avg)),
                    revenue_year_ago: entry
                        .revenue_estimate
                        .as_ref()
                        .and_then(|r| raw(&r.year_ago_revenue)),
                    eps_avg: entry.earnings_estimate.as_ref().and_then(|e| raw(&e.avg)),
                    eps_year_ago: entry
                        .earnings_estimate
                        .as_ref()
                        .and_then(|e| raw(&e.year_ago_eps)),
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl BarSource for YahooClient {
    async fn fetch_bars(&self, request: &BarRequest) -> Result<BarSeries> {
        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval={}&includePrePost=false",
            self.base_url,
            urlencoding::encode(&request.ticker),
            urlencoding::encode(&request.period),
            request.interval.as_code(),
        );

        let body: ChartResponse = self.get_json(&url).await?;
        let bars = parse_chart(&request.ticker, body)?;
        if bars.is_empty() {
            return Err(ScoutError::NoData(request.ticker.clone()).into());
        }

        info!(ticker = %request.ticker, count = bars.len(), "Yahoo bars fetched");
        Ok(BarSeries {
            ticker: request.ticker.clone(),
            interval: request.interval.as_code().to_string(),
            bars,
        })
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

#[async_trait]
impl FundamentalsSource for YahooClient {
    async fn company_profile(&self, ticker: &str) -> Result<CompanyProfile> {
        let summary = self.quote_summary(ticker, PROFILE_MODULES).await?;
        Ok(profile_from(&summary))
    }

    async fn quarterly_statement(
        &self,
        ticker: &str,
        item: StatementItem,
    ) -> Result<Vec<QuarterlyFact>> {
        let type_name = statement_type(item);
        let now = Utc::now().timestamp();
        let start = now - STATEMENT_LOOKBACK_DAYS * 86_400;
        let url = format!(
            "{}/ws/fundamentals-timeseries/v1/finance/timeseries/{}?type={}&period1={}&period2={}",
            self.base_url,
            urlencoding::encode(ticker),
            type_name,
            start,
            now,
        );

        let body: TimeseriesResponse = self.get_json(&url).await?;
        let facts = parse_timeseries(type_name, body)?;
        debug!(ticker, item = item.label(), count = facts.len(), "Yahoo statement fetched");
        Ok(facts)
    }

    async fn earnings_events(&self, ticker: &str) -> Result<Vec<EarningsEvent>> {
        let summary = self.quote_summary(ticker, EARNINGS_MODULES).await?;
        Ok(earnings_from(&summary))
    }

    async fn short_stats(&self, ticker: &str) -> Result<ShortStats> {
        let summary = self.quote_summary(ticker, SHORT_MODULES).await?;
        Ok(short_stats_from(&summary))
    }

    async fn estimate_trends(&self, ticker: &str) -> Result<Vec<EstimateTrend>> {
        let summary = self.quote_summary(ticker, TREND_MODULES).await?;
        Ok(trends_from(&summary))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chart(value: serde_json::Value) -> ChartResponse {
        serde_json::from_value(value).unwrap()
    }

    fn summary(value: serde_json::Value) -> QuoteSummaryResult {
        let body: QuoteSummaryResponse =
            serde_json::from_value(json!({ "quoteSummary": { "result": [value], "error": null } }))
                .unwrap();
        parse_quote_summary("TEST", body).unwrap()
    }

    #[test]
    fn test_parse_chart_skips_incomplete_rows() {
        let body = chart(json!({
            "chart": {
                "result": [{
                    "timestamp": [300, 100, 200],
                    "indicators": { "quote": [{
                        "open":   [3.0, 1.0, null],
                        "high":   [3.5, 1.5, 2.5],
                        "low":    [2.5, 0.5, 1.5],
                        "close":  [3.2, 1.2, 2.2],
                        "volume": [null, 1000, 2000]
                    }]}
                }],
                "error": null
            }
        }));
        let bars = parse_chart("TEST", body).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].time, 100);
        assert_eq!(bars[1].time, 300);
        assert_eq!(bars[1].volume, 0.0);
    }

    #[test]
    fn test_parse_chart_error_is_no_data() {
        let body = chart(json!({
            "chart": { "result": null, "error": { "code": "Not Found", "description": "No data found" } }
        }));
        let err = parse_chart("ZZZZ", body).unwrap_err();
        assert!(err.to_string().contains("No data available for ZZZZ"));
    }

    #[test]
    fn test_dedup_keeps_last() {
        let bar = |time, close| Bar { time, open: 1.0, high: 2.0, low: 0.5, close, volume: 1.0 };
        let out = dedup_ascending(vec![bar(2, 1.0), bar(1, 1.0), bar(2, 1.5)]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].close, 1.5);
    }

    #[test]
    fn test_parse_timeseries() {
        let body: TimeseriesResponse = serde_json::from_value(json!({
            "timeseries": {
                "result": [{
                    "meta": { "symbol": ["TEST"], "type": ["quarterlyTotalRevenue"] },
                    "timestamp": [1, 2, 3],
                    "quarterlyTotalRevenue": [
                        { "asOfDate": "2023-12-31", "periodType": "3M", "reportedValue": { "raw": 90.0, "fmt": "90" } },
                        null,
                        { "asOfDate": "2024-03-31", "periodType": "3M", "reportedValue": { "raw": 100.0, "fmt": "100" } },
                        { "asOfDate": "2024-06-30", "periodType": "3M", "reportedValue": {} }
                    ]
                }],
                "error": null
            }
        }))
        .unwrap();
        let facts = parse_timeseries("quarterlyTotalRevenue", body).unwrap();
        assert_eq!(facts.len(), 2);
        assert_eq!(facts[0].value, 100.0);
        assert_eq!(facts[0].end, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
        assert!(facts[0].fiscal_period.is_none());
    }

    #[test]
    fn test_parse_timeseries_missing_type_is_empty() {
        let body: TimeseriesResponse = serde_json::from_value(json!({
            "timeseries": { "result": [{ "meta": { "type": ["quarterlyGrossProfit"] } }] }
        }))
        .unwrap();
        assert!(parse_timeseries("quarterlyGrossProfit", body).unwrap().is_empty());
    }

    #[test]
    fn test_profile_prefers_current_price() {
        let s = summary(json!({
            "price": {
                "longName": "Palantir Technologies Inc.",
                "marketCap": { "raw": 4.2e11 },
                "regularMarketPrice": { "raw": 170.0 }
            },
            "financialData": { "currentPrice": { "raw": 171.5 } }
        }));
        let profile = profile_from(&s);
        assert_eq!(profile.name.as_deref(), Some("Palantir Technologies Inc."));
        assert_eq!(profile.price, Some(171.5));
        assert_eq!(profile.market_cap, Some(4.2e11));
    }

    #[test]
    fn test_short_stats_partial() {
        let s = summary(json!({
            "defaultKeyStatistics": {
                "sharesShort": { "raw": 5.5e7 },
                "shortRatio": {},
                "shortPercentOfFloat": { "raw": 0.0231 }
            }
        }));
        let stats = short_stats_from(&s);
        assert_eq!(stats.shares_short, Some(55_000_000));
        assert_eq!(stats.short_ratio, None);
        assert_eq!(stats.short_percent_of_float, Some(0.0231));
        assert_eq!(stats.shares_short_prior_month, None);
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_earnings_dated_by_announcement() {
        let s = summary(json!({
            "earningsHistory": { "history": [
                { "epsActual": { "raw": 0.14 }, "epsEstimate": { "raw": 0.13 }, "quarter": { "raw": 1711843200 } },
                { "epsActual": { "raw": 0.09 }, "epsEstimate": { "raw": 0.08 }, "quarter": { "raw": 1703980800 } }
            ]},
            "earnings": { "earningsChart": { "quarterly": [
                { "date": "4Q2023", "reportedDate": { "raw": 1707091200 } },
                { "date": "1Q2024", "reportedDate": { "raw": 1714003200 } }
            ]}},
            "calendarEvents": { "earnings": {
                "earningsDate": [{ "raw": 1730678400 }],
                "earningsAverage": { "raw": 0.09 }
            }}
        }));
        let events = earnings_from(&s);
        assert_eq!(events.len(), 3);
        assert!(!events[0].is_reported());
        assert_eq!(events[0].date, ymd(2024, 11, 4));
        assert_eq!(events[0].estimated_eps, Some(0.09));
        assert_eq!(events[1].date, ymd(2024, 4, 25));
        assert_eq!(events[1].reported_eps, Some(0.14));
        assert_eq!(events[2].date, ymd(2024, 2, 5));
    }

    #[test]
    fn test_calendar_date_merges_with_reported_quarter() {
        // Same report seen twice: history by quarter end, calendar by announcement
        let s = summary(json!({
            "earningsHistory": { "history": [
                { "epsActual": { "raw": 0.14 }, "epsEstimate": { "raw": 0.13 }, "quarter": { "raw": 1711843200 } }
            ]},
            "calendarEvents": { "earnings": {
                "earningsDate": [{ "raw": 1714003200 }],
                "earningsAverage": { "raw": 0.13 }
            }}
        }));
        let events = earnings_from(&s);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].date, ymd(2024, 4, 25));
        assert_eq!(events[0].reported_eps, Some(0.14));

        let dates = crate::report::fundamentals::earnings_dates(&events, ymd(2024, 5, 1));
        assert_eq!(dates.previous, Some(ymd(2024, 4, 25)));
        assert_eq!(dates.next, None);
    }

    #[test]
    fn test_next_quarter_date_stays_upcoming() {
        // 2024-08-05 is past the window for the quarter ending 2024-03-31
        let s = summary(json!({
            "earningsHistory": { "history": [
                { "epsActual": { "raw": 0.14 }, "epsEstimate": { "raw": 0.13 }, "quarter": { "raw": 1711843200 } }
            ]},
            "calendarEvents": { "earnings": { "earningsDate": [{ "raw": 1722816000 }] } }
        }));
        let events = earnings_from(&s);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].date, ymd(2024, 8, 5));
        assert!(!events[0].is_reported());
        assert_eq!(events[1].date, ymd(2024, 3, 31));
    }

    #[test]
    fn test_trends() {
        let s = summary(json!({
            "earningsTrend": { "trend": [
                { "period": "0q",
                  "revenueEstimate": { "avg": { "raw": 120.0 }, "yearAgoRevenue": { "raw": 100.0 } },
                  "earningsEstimate": { "avg": { "raw": 0.5 }, "yearAgoEps": {} } }
            ]}
        }));
        let trends = trends_from(&s);
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].period, "0q");
        assert_eq!(trends[0].revenue_year_ago, Some(100.0));
        assert_eq!(trends[0].eps_year_ago, None);
    }

    #[tokio::test]
    async fn test_crumb_survives_failed_session_request() {
        use httpmock::prelude::*;

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/test/getcrumb");
                then.status(200).body("Xy1crumb\n");
            })
            .await;

        let mut client = YahooClient::new(5).unwrap().with_base_url(&server.base_url());
        // Nothing listens on port 1
        client.session_url = "http://127.0.0.1:1".to_string();
        assert_eq!(client.crumb().await.unwrap(), "Xy1crumb");
    }

    #[test]
    fn test_client_construction() {
        let client = YahooClient::new(10).unwrap().with_base_url("http://localhost:9999/");
        assert_eq!(client.base_url, "http://localhost:9999");
        assert_eq!(client.name(), "yahoo");
    }
}
