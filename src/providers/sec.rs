//! SEC EDGAR adapter.
//!
//! Resolves a ticker to its CIK, downloads the company-facts XBRL bundle,
//! and extracts quarterly series for individual us-gaap concepts.
//!
//! API: `https://data.sec.gov/api/xbrl/companyfacts/CIK##########.json`
//! Ticker index: `https://www.sec.gov/files/company_tickers.json`
//! Auth: none, but every request must carry a User-Agent with a contact.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::{ensure_success, http_client};
use crate::types::{FiscalPeriod, QuarterlyFact, ScoutError};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const BASE_URL: &str = "https://data.sec.gov";
const TICKER_INDEX_URL: &str = "https://www.sec.gov/files/company_tickers.json";
const PROVIDER_NAME: &str = "sec";

/// Unit used for monetary concepts.
pub const USD: &str = "USD";

/// Revenue tags, most specific first.
pub const REVENUE_CONCEPTS: &[&str] = &[
    "Revenues",
    "RevenueFromContractWithCustomerExcludingAssessedTax",
    "SalesRevenueNet",
    "RevenueFromContractWithCustomer",
];

pub const EARNINGS_CONCEPTS: &[&str] = &[
    "NetIncomeLoss",
    "ProfitLoss",
    "NetIncomeLossAvailableToCommonStockholdersBasic",
];

/// Rarely tagged; most filers leave EBITDA out of their XBRL.
pub const EBITDA_CONCEPTS: &[&str] = &[
    "EBITDA",
    "EarningsBeforeInterestTaxesDepreciationAndAmortization",
];

/// CIKs for a few large caps, used when the ticker index is unreachable.
const FALLBACK_CIKS: &[(&str, &str)] = &[
    ("AAPL", "0000320193"),
    ("MSFT", "0000789019"),
    ("GOOGL", "0001652044"),
    ("GOOG", "0001652044"),
    ("TSLA", "0001318605"),
    ("META", "0001326801"),
    ("AMZN", "0001018724"),
    ("NVDA", "0001045810"),
    ("PLTR", "0001321655"),
];

/// Accepted length of a single fiscal quarter, in days.
const QUARTER_DAYS: std::ops::RangeInclusive<i64> = 80..=100;

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TickerIndexEntry {
    cik_str: u64,
    ticker: String,
}

/// The company-facts bundle: taxonomy → concept → unit → facts.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyFacts {
    #[serde(default)]
    pub entity_name: Option<String>,
    #[serde(default)]
    facts: HashMap<String, HashMap<String, ConceptFacts>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ConceptFacts {
    #[serde(default)]
    units: HashMap<String, Vec<RawFact>>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawFact {
    end: NaiveDate,
    #[serde(default)]
    start: Option<NaiveDate>,
    val: f64,
    #[serde(default)]
    fy: Option<i32>,
    #[serde(default)]
    fp: Option<String>,
    #[serde(default)]
    form: Option<String>,
    #[serde(default)]
    filed: Option<NaiveDate>,
}

impl RawFact {
    fn is_quarterly(&self) -> bool {
        let interim = self.form.as_deref() == Some("10-Q")
            || self
                .fp
                .as_deref()
                .and_then(FiscalPeriod::parse)
                .is_some_and(|fp| fp.is_interim());
        if !interim {
            return false;
        }
        // 10-Q filings also carry year-to-date totals; only single quarters pass
        match self.start {
            Some(start) => QUARTER_DAYS.contains(&(self.end - start).num_days()),
            None => true,
        }
    }
}

impl CompanyFacts {
    /// Quarterly us-gaap facts for `concept` in `unit`, most recent first.
    ///
    /// Each period end appears once. The same period is restated as a
    /// comparative in later filings whose fiscal labels belong to the later
    /// filing, so the earliest filing wins. An unknown concept or unit
    /// yields an empty vector.
    pub fn quarterly(&self, concept: &str, unit: &str) -> Vec<QuarterlyFact> {
        let Some(raw) = self
            .facts
            .get("us-gaap")
            .and_then(|gaap| gaap.get(concept))
            .and_then(|c| c.units.get(unit))
        else {
            debug!(concept, unit, "Concept not present in company facts");
            return Vec::new();
        };

        let mut by_end: HashMap<NaiveDate, &RawFact> = HashMap::new();
        for fact in raw.iter().filter(|f| f.is_quarterly()) {
            by_end
                .entry(fact.end)
                .and_modify(|kept| {
                    if filed_before(fact.filed, kept.filed) {
                        *kept = fact;
                    }
                })
                .or_insert(fact);
        }

        let mut out: Vec<QuarterlyFact> = by_end
            .into_values()
            .map(|f| QuarterlyFact {
                end: f.end,
                fiscal_year: f.fy,
                fiscal_period: f.fp.as_deref().and_then(FiscalPeriod::parse),
                value: f.val,
                filed: f.filed,
                form: f.form.clone(),
            })
            .collect();
        out.sort_by(|a, b| b.end.cmp(&a.end));
        out
    }

    /// Try each concept in order; return the first with quarterly data.
    pub fn first_available<'a>(
        &self,
        concepts: &[&'a str],
        unit: &str,
    ) -> Option<(&'a str, Vec<QuarterlyFact>)> {
        concepts.iter().find_map(|&concept| {
            let facts = self.quarterly(concept, unit);
            (!facts.is_empty()).then_some((concept, facts))
        })
    }
}

fn filed_before(candidate: Option<NaiveDate>, kept: Option<NaiveDate>) -> bool {
    match (candidate, kept) {
        (Some(c), Some(k)) => c < k,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Look up a ticker in the built-in CIK table.
pub fn fallback_cik(ticker: &str) -> Option<&'static str> {
    let ticker = ticker.to_uppercase();
    FALLBACK_CIKS
        .iter()
        .find(|(t, _)| *t == ticker)
        .map(|(_, cik)| *cik)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct SecClient {
    http: Client,
    base_url: String,
    ticker_index_url: String,
}

impl SecClient {
    pub fn new(user_agent: &str, timeout_secs: u64) -> Result<Self> {
        let http = http_client(user_agent, timeout_secs)
            .context("Failed to build SEC HTTP client")?;
        Ok(Self {
            http,
            base_url: BASE_URL.to_string(),
            ticker_index_url: TICKER_INDEX_URL.to_string(),
        })
    }

    /// Serve both the facts API and the ticker index from `base_url`.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        self.ticker_index_url = format!("{base}/files/company_tickers.json");
        self.base_url = base;
        self
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("SEC request failed: {url}"))?;
        let resp = ensure_success(resp, PROVIDER_NAME).await?;
        resp.json::<T>()
            .await
            .map_err(|e| ScoutError::malformed(PROVIDER_NAME, e.to_string()).into())
    }

    /// Ten-digit, zero-padded CIK for `ticker`.
    pub async fn resolve_cik(&self, ticker: &str) -> Result<String> {
        let wanted = ticker.to_uppercase();

        match self
            .get_json::<HashMap<String, TickerIndexEntry>>(&self.ticker_index_url)
            .await
        {
            Ok(index) => {
                if let Some(entry) = index.values().find(|e| e.ticker.eq_ignore_ascii_case(&wanted)) {
                    return Ok(format!("{:010}", entry.cik_str));
                }
                debug!(ticker = %wanted, "Ticker not in SEC index");
            }
            Err(e) => warn!(error = %e, "SEC ticker index unavailable, using built-in table"),
        }

        fallback_cik(&wanted)
            .map(str::to_string)
            .ok_or_else(|| ScoutError::NoData(format!("{wanted} (no CIK found)")).into())
    }

    pub async fn company_facts(&self, cik: &str) -> Result<CompanyFacts> {
        let url = format!("{}/api/xbrl/companyfacts/CIK{cik}.json", self.base_url);
        let facts: CompanyFacts = self.get_json(&url).await?;
        info!(cik, entity = facts.entity_name.as_deref().unwrap_or("?"), "SEC company facts fetched");
        Ok(facts)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
