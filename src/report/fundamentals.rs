//! Fundamentals research report: company info, growth, margins, earnings
//! surprises, short interest and earnings dates for one ticker.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use tracing::info;

use super::{money, pct, round2, rule, section_noted, thousands, write_heading, RULE_WIDTH};
use crate::analytics::growth::{margins, surprise_pct, yoy_growth, YoyMatch};
use crate::providers::{FundamentalsSource, StatementItem};
use crate::types::{CompanyProfile, EarningsEvent, QuarterlyFact, ScoutError, ShortStats};

/// Quarters shown in each section.
pub const SALES_QUARTERS: usize = 3;
pub const FCF_QUARTERS: usize = 4;
pub const MARGIN_QUARTERS: usize = 4;
pub const SURPRISE_EVENTS: usize = 4;

// ---------------------------------------------------------------------------
// Report rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthRow {
    pub quarter: usize,
    pub date: NaiveDate,
    pub current: f64,
    pub prior: f64,
    #[serde(serialize_with = "round2")]
    pub growth_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginRow {
    pub quarter: usize,
    pub date: NaiveDate,
    pub gross_profit: f64,
    pub revenue: f64,
    #[serde(serialize_with = "round2")]
    pub margin_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurpriseRow {
    pub date: NaiveDate,
    pub reported_eps: f64,
    pub estimated_eps: f64,
    #[serde(serialize_with = "round2")]
    pub surprise_pct: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsDates {
    pub previous: Option<NaiveDate>,
    pub next: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundamentalsReport {
    pub ticker: String,
    /// Set when the provider knows nothing about the ticker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Sections whose fetch failed and are therefore empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unavailable: Vec<String>,
    pub company_info: CompanyProfile,
    pub sales_growth: Vec<GrowthRow>,
    pub fcf_growth: Vec<GrowthRow>,
    pub gross_margins: Vec<MarginRow>,
    pub earnings_surprise: Vec<SurpriseRow>,
    pub short_interest: ShortStats,
    pub earnings_dates: EarningsDates,
}

// ---------------------------------------------------------------------------
// Derivations
// ---------------------------------------------------------------------------

/// YoY growth rows for date-only statements (four-quarter offset).
pub fn growth_rows(facts: &[QuarterlyFact], quarters: usize) -> Vec<GrowthRow> {
    yoy_growth(facts, quarters, YoyMatch::FOUR_QUARTERS)
        .into_iter()
        .map(|g| GrowthRow {
            quarter: g.quarter,
            date: g.current.end,
            current: g.current.value,
            prior: g.prior.value,
            growth_pct: g.growth_pct,
        })
        .collect()
}

pub fn margin_rows(
    gross_profit: &[QuarterlyFact],
    revenue: &[QuarterlyFact],
    quarters: usize,
) -> Vec<MarginRow> {
    margins(gross_profit, revenue, quarters)
        .into_iter()
        .map(|m| MarginRow {
            quarter: m.quarter,
            date: m.numerator.end,
            gross_profit: m.numerator.value,
            revenue: m.denominator.value,
            margin_pct: m.margin_pct,
        })
        .collect()
}

/// Surprise rows for the most recent events carrying both EPS figures.
pub fn surprise_rows(events: &[EarningsEvent], limit: usize) -> Vec<SurpriseRow> {
    let mut sorted: Vec<&EarningsEvent> = events.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));

    sorted
        .into_iter()
        .filter_map(|e| {
            let reported = e.reported_eps?;
            let estimated = e.estimated_eps?;
            Some(SurpriseRow {
                date: e.date,
                reported_eps: reported,
                estimated_eps: estimated,
                surprise_pct: surprise_pct(reported, estimated),
            })
        })
        .take(limit)
        .collect()
}

/// Most recent reported event and the nearest unreported one on or after `today`.
pub fn earnings_dates(events: &[EarningsEvent], today: NaiveDate) -> EarningsDates {
    EarningsDates {
        previous: events
            .iter()
            .filter(|e| e.is_reported())
            .map(|e| e.date)
            .max(),
        next: events
            .iter()
            .filter(|e| !e.is_reported() && e.date >= today)
            .map(|e| e.date)
            .min(),
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Fetch every section independently and assemble the report.
pub async fn build_report(
    source: &dyn FundamentalsSource,
    ticker: &str,
    today: NaiveDate,
) -> FundamentalsReport {
    let mut unavailable = Vec::new();

    let profile = source.company_profile(ticker).await;
    let unknown = matches!(
        profile.as_ref().err().and_then(|e| e.downcast_ref::<ScoutError>()),
        Some(ScoutError::NoData(_))
    );
    let company_info = section_noted("company info", ticker, profile, &mut unavailable);

    let revenue = section_noted(
        "revenue",
        ticker,
        source.quarterly_statement(ticker, StatementItem::TotalRevenue).await,
        &mut unavailable,
    );
    let fcf = section_noted(
        "free cash flow",
        ticker,
        source.quarterly_statement(ticker, StatementItem::FreeCashFlow).await,
        &mut unavailable,
    );
    let gross_profit = section_noted(
        "gross profit",
        ticker,
        source.quarterly_statement(ticker, StatementItem::GrossProfit).await,
        &mut unavailable,
    );
    let events = section_noted("earnings", ticker, source.earnings_events(ticker).await, &mut unavailable);
    let short_interest =
        section_noted("short interest", ticker, source.short_stats(ticker).await, &mut unavailable);

    let report = FundamentalsReport {
        ticker: ticker.to_string(),
        error: unknown.then(|| ScoutError::NoData(ticker.to_string()).to_string()),
        unavailable,
        company_info,
        sales_growth: growth_rows(&revenue, SALES_QUARTERS),
        fcf_growth: growth_rows(&fcf, FCF_QUARTERS),
        gross_margins: margin_rows(&gross_profit, &revenue, MARGIN_QUARTERS),
        earnings_surprise: surprise_rows(&events, SURPRISE_EVENTS),
        short_interest,
        earnings_dates: earnings_dates(&events, today),
    };

    info!(
        ticker,
        sales_rows = report.sales_growth.len(),
        fcf_rows = report.fcf_growth.len(),
        margin_rows = report.gross_margins.len(),
        surprise_rows = report.earnings_surprise.len(),
        "Fundamentals report assembled"
    );
    report
}

// ---------------------------------------------------------------------------
// Console rendering
// ---------------------------------------------------------------------------

fn heading(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    write_heading(f, title, RULE_WIDTH)
}

impl fmt::Display for FundamentalsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        heading(f, &format!("RESEARCH REPORT: {}", self.ticker))?;
        if let Some(error) = &self.error {
            writeln!(f, "{error}")?;
            writeln!(f)?;
        }
        if !self.unavailable.is_empty() {
            writeln!(f, "Unavailable: {}", self.unavailable.join(", "))?;
        }
        let info = &self.company_info;
        writeln!(f, "Company: {}", info.name.as_deref().unwrap_or("N/A"))?;
        match info.price {
            Some(p) => writeln!(f, "Price: ${p:.2}")?,
            None => writeln!(f, "Price: $N/A")?,
        }
        writeln!(f, "Market Cap: {}", money(info.market_cap.unwrap_or(0.0)))?;

        writeln!(f)?;
        heading(f, "SALES GROWTH Y/Y (Last 3 Quarters)")?;
        for row in &self.sales_growth {
            writeln!(f, "Quarter {} ({}):", row.quarter, row.date)?;
            writeln!(f, "  Current Revenue: {}", money(row.current))?;
            writeln!(f, "  Last Year Revenue: {}", money(row.prior))?;
            writeln!(f, "  Y/Y Growth: {}", pct(row.growth_pct))?;
            writeln!(f)?;
        }

        heading(f, "FREE CASH FLOW GROWTH (Last 4 Quarters)")?;
        for row in &self.fcf_growth {
            writeln!(
                f,
                "Q{}: {} | Y/Y Growth: {}",
                row.quarter,
                money(row.current),
                pct(row.growth_pct)
            )?;
        }

        writeln!(f)?;
        heading(f, "GROSS MARGINS (Last 4 Quarters)")?;
        for row in &self.gross_margins {
            writeln!(f, "Q{}: {}", row.quarter, pct(row.margin_pct))?;
        }

        writeln!(f)?;
        heading(f, "EARNINGS SURPRISE HISTORY")?;
        for row in &self.earnings_surprise {
            writeln!(f, "{}:", row.date)?;
            writeln!(f, "  Reported EPS: ${:.2}", row.reported_eps)?;
            writeln!(f, "  Estimated EPS: ${:.2}", row.estimated_eps)?;
            writeln!(f, "  Surprise: {}", pct(row.surprise_pct))?;
            writeln!(f)?;
        }

        heading(f, "SHORT INTEREST")?;
        let short = &self.short_interest;
        if let Some(p) = short.short_percent_of_float {
            writeln!(f, "Short % of Float: {}", pct(Some(p * 100.0)))?;
        }
        if let Some(shares) = short.shares_short {
            writeln!(f, "Shares Short: {}", thousands(shares as i64))?;
        }
        if let Some(ratio) = short.short_ratio {
            writeln!(f, "Days to Cover: {ratio:.2}")?;
        }

        writeln!(f)?;
        heading(f, "EARNINGS DATES")?;
        if let Some(date) = self.earnings_dates.previous {
            writeln!(f, "Previous Earnings: {date}")?;
        }
        if let Some(date) = self.earnings_dates.next {
            writeln!(f, "Next Earnings: {date}")?;
        }

        writeln!(f)?;
        writeln!(f, "{}", rule(RULE_WIDTH))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn quarterly(values: &[f64]) -> Vec<QuarterlyFact> {
        // Most recent first, one quarter apart
        let ends = [
            d(2024, 6, 30),
            d(2024, 3, 31),
            d(2023, 12, 31),
            d(2023, 9, 30),
            d(2023, 6, 30),
            d(2023, 3, 31),
            d(2022, 12, 31),
            d(2022, 9, 30),
        ];
        values
            .iter()
            .zip(ends)
            .map(|(&v, end)| QuarterlyFact::dated(end, v))
            .collect()
    }

    fn event(date: NaiveDate, reported: Option<f64>, estimated: Option<f64>) -> EarningsEvent {
        EarningsEvent {
            date,
            reported_eps: reported,
            estimated_eps: estimated,
        }
    }

    #[test]
    fn test_growth_rows_offset_four() {
        let rows = growth_rows(&quarterly(&[100.0, 110.0, 90.0, 120.0, 95.0]), SALES_QUARTERS);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quarter, 1);
        assert_eq!(rows[0].date, d(2024, 6, 30));
        assert_eq!(pct(rows[0].growth_pct), "5.26%");
    }

    #[test]
    fn test_margin_rows_match_dates() {
        let revenue = quarterly(&[200.0, 0.0, 100.0]);
        // Gross profit is missing the most recent quarter
        let gp: Vec<QuarterlyFact> = quarterly(&[0.0, 50.0, 40.0, 30.0])
            .into_iter()
            .skip(1)
            .collect();
        let rows = margin_rows(&gp, &revenue, MARGIN_QUARTERS);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, d(2024, 3, 31));
        assert_eq!(rows[0].margin_pct, None);
        assert!((rows[1].margin_pct.unwrap() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_surprise_rows() {
        let events = vec![
            event(d(2024, 11, 4), None, Some(0.09)),
            event(d(2023, 12, 31), Some(0.08), Some(0.08)),
            event(d(2024, 6, 30), Some(0.09), Some(0.0)),
            event(d(2024, 3, 31), Some(0.10), Some(0.08)),
        ];
        let rows = surprise_rows(&events, SURPRISE_EVENTS);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].date, d(2024, 6, 30));
        assert_eq!(rows[0].surprise_pct, None);
        assert_eq!(pct(rows[1].surprise_pct), "25.00%");
        assert_eq!(rows[2].surprise_pct, Some(0.0));
    }

    #[test]
    fn test_earnings_dates() {
        let events = vec![
            event(d(2025, 2, 3), None, None),
            event(d(2024, 11, 4), None, None),
            event(d(2024, 6, 30), Some(0.09), None),
            event(d(2024, 1, 1), None, None),
        ];
        let dates = earnings_dates(&events, d(2024, 8, 1));
        assert_eq!(dates.previous, Some(d(2024, 6, 30)));
        assert_eq!(dates.next, Some(d(2024, 11, 4)));
    }

    #[test]
    fn test_json_keys_and_rounding() {
        let report = FundamentalsReport {
            ticker: "PLTR".to_string(),
            error: None,
            unavailable: vec![],
            company_info: CompanyProfile::default(),
            sales_growth: growth_rows(&quarterly(&[100.0, 110.0, 90.0, 120.0, 95.0]), 3),
            fcf_growth: vec![],
            gross_margins: vec![],
            earnings_surprise: vec![],
            short_interest: ShortStats::default(),
            earnings_dates: EarningsDates::default(),
        };
        let json = serde_json::to_value(&report).unwrap();
        for key in [
            "ticker",
            "companyInfo",
            "salesGrowth",
            "fcfGrowth",
            "grossMargins",
            "earningsSurprise",
            "shortInterest",
            "earningsDates",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["salesGrowth"][0]["growthPct"], 5.26);
        assert!(json.get("error").is_none());
        assert!(json.get("unavailable").is_none());
    }

    #[test]
    fn test_display_sections() {
        let report = FundamentalsReport {
            ticker: "PLTR".to_string(),
            error: None,
            unavailable: vec![],
            company_info: CompanyProfile {
                name: Some("Palantir Technologies Inc.".to_string()),
                price: Some(25.5),
                market_cap: Some(54_000_000_000.0),
            },
            sales_growth: vec![],
            fcf_growth: vec![],
            gross_margins: vec![],
            earnings_surprise: vec![],
            short_interest: ShortStats {
                short_percent_of_float: Some(0.0231),
                shares_short: Some(55_000_000),
                shares_short_prior_month: None,
                short_ratio: Some(1.5),
            },
            earnings_dates: EarningsDates::default(),
        };
        let text = report.to_string();
        assert!(text.contains("RESEARCH REPORT: PLTR"));
        assert!(text.contains("Market Cap: $54,000,000,000"));
        assert!(text.contains("Short % of Float: 2.31%"));
        assert!(text.contains("Shares Short: 55,000,000"));
        assert!(text.contains("Days to Cover: 1.50"));
        assert!(!text.contains("Next Earnings"));
    }
}
