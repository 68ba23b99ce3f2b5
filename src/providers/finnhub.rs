//! Finnhub candle adapter.
//!
//! API: `https://finnhub.io/api/v1/stock/candle`
//! Auth: API key via `token` query param.
//!
//! Finnhub has no "range" parameter; a chart period is translated into a
//! resolution code plus a day window ending now.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info};

use super::{dedup_ascending, ensure_success, http_client, BarRequest, BarSeries, BarSource, USER_AGENT};
use crate::types::{Bar, ScoutError};

const BASE_URL: &str = "https://finnhub.io/api/v1";
const PROVIDER_NAME: &str = "finnhub";

// ---------------------------------------------------------------------------
// Period mapping
// ---------------------------------------------------------------------------

/// Map a chart period label to `(resolution, days back)`.
///
/// Unknown labels fall back to one year of daily candles.
pub fn resolution_for(period: &str) -> (&'static str, i64) {
    match period {
        "1d" => ("D", 365),
        "5d" => ("5", 5),
        "1mo" => ("60", 30),
        "3mo" => ("D", 90),
        "1y" => ("D", 365),
        "5y" => ("W", 1825),
        "max" => ("M", 3650),
        _ => ("D", 365),
    }
}

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

/// Column-oriented candle response. `s` is "ok" or "no_data".
#[derive(Debug, Deserialize)]
struct CandleResponse {
    #[serde(default)]
    s: String,
    #[serde(default)]
    t: Vec<i64>,
    #[serde(default)]
    o: Vec<f64>,
    #[serde(default)]
    h: Vec<f64>,
    #[serde(default)]
    l: Vec<f64>,
    #[serde(default)]
    c: Vec<f64>,
    #[serde(default)]
    v: Vec<f64>,
}

fn parse_candles(ticker: &str, body: CandleResponse) -> Result<Vec<Bar>> {
    if body.s != "ok" {
        debug!(ticker, status = %body.s, "Finnhub returned no candles");
        return Err(ScoutError::NoData(ticker.to_string()).into());
    }

    let n = body.t.len();
    if [body.o.len(), body.h.len(), body.l.len(), body.c.len()]
        .iter()
        .any(|&len| len != n)
    {
        anyhow::bail!(ScoutError::malformed(PROVIDER_NAME, "candle columns differ in length"));
    }

    let bars: Vec<Bar> = (0..n)
        .map(|i| Bar {
            time: body.t[i],
            open: body.o[i],
            high: body.h[i],
            low: body.l[i],
            close: body.c[i],
            volume: body.v.get(i).copied().unwrap_or(0.0),
        })
        .collect();

    if bars.is_empty() {
        return Err(ScoutError::NoData(ticker.to_string()).into());
    }
    Ok(dedup_ascending(bars))
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct FinnhubClient {
    http: Client,
    api_key: SecretString,
    base_url: String,
}

impl FinnhubClient {
    pub fn new(api_key: SecretString, timeout_secs: u64) -> Result<Self> {
        let http = http_client(USER_AGENT, timeout_secs)
            .context("Failed to build Finnhub HTTP client")?;
        Ok(Self {
            http,
            api_key,
            base_url: BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl BarSource for FinnhubClient {
    async fn fetch_bars(&self, request: &BarRequest) -> Result<BarSeries> {
        let (resolution, days) = resolution_for(&request.period);
        let to = Utc::now().timestamp();
        let from = (to - days * 86_400).to_string();
        let to = to.to_string();

        let resp = self
            .http
            .get(format!("{}/stock/candle", self.base_url))
            .query(&[
                ("symbol", request.ticker.as_str()),
                ("resolution", resolution),
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("token", self.api_key.expose_secret().as_str()),
            ])
            .send()
            .await
            .context("Finnhub request failed")?;

        let resp = ensure_success(resp, PROVIDER_NAME).await?;
        let body: CandleResponse = resp
            .json()
            .await
            .map_err(|e| ScoutError::malformed(PROVIDER_NAME, e.to_string()))?;

        let bars = parse_candles(&request.ticker, body)?;
        info!(ticker = %request.ticker, resolution, count = bars.len(), "Finnhub candles fetched");

        Ok(BarSeries {
            ticker: request.ticker.clone(),
            interval: resolution.to_string(),
            bars,
        })
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
