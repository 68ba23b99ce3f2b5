//! Filings report from SEC company facts: sales growth, earnings growth
//! and EBITDA margins, all fiscal-period matched.

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use tracing::info;

use super::{money, pct, round2, rule, write_heading, RULE_WIDTH};
use crate::analytics::growth::{margins, yoy_growth, YoyMatch};
use crate::providers::sec::{
    CompanyFacts, SecClient, EARNINGS_CONCEPTS, EBITDA_CONCEPTS, REVENUE_CONCEPTS, USD,
};
use crate::types::QuarterlyFact;

pub const SEC_QUARTERS: usize = 3;

const EBITDA_UNAVAILABLE: &str = "EBITDA data not directly available in SEC filings. \
     This metric may need to be calculated from other line items.";

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecGrowthRow {
    pub label: String,
    pub date: NaiveDate,
    pub current: f64,
    pub prior: f64,
    #[serde(serialize_with = "round2")]
    pub growth_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecMarginRow {
    pub label: String,
    pub date: NaiveDate,
    pub ebitda: f64,
    pub revenue: f64,
    #[serde(serialize_with = "round2")]
    pub margin_pct: Option<f64>,
}

/// One report section: the concept used, its rows, and a note when empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecSection<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concept: Option<String>,
    pub rows: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl<T> SecSection<T> {
    fn empty(note: &str) -> Self {
        Self {
            concept: None,
            rows: Vec::new(),
            note: Some(note.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecReport {
    pub ticker: String,
    pub cik: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,
    pub sales_growth: SecSection<SecGrowthRow>,
    pub earnings_growth: SecSection<SecGrowthRow>,
    pub ebitda_margins: SecSection<SecMarginRow>,
}

// ---------------------------------------------------------------------------
// Derivations
// ---------------------------------------------------------------------------

fn growth_section(
    found: Option<(&str, Vec<QuarterlyFact>)>,
    missing_note: &str,
) -> SecSection<SecGrowthRow> {
    let Some((concept, facts)) = found else {
        return SecSection::empty(missing_note);
    };

    let rows: Vec<SecGrowthRow> = yoy_growth(&facts, SEC_QUARTERS, YoyMatch::FiscalPeriod)
        .into_iter()
        .map(|g| SecGrowthRow {
            label: format!("Q{} - {}", g.quarter, g.current.label()),
            date: g.current.end,
            current: g.current.value,
            prior: g.prior.value,
            growth_pct: g.growth_pct,
        })
        .collect();

    SecSection {
        concept: Some(concept.to_string()),
        note: rows
            .is_empty()
            .then(|| "Insufficient data for Y/Y comparison".to_string()),
        rows,
    }
}

fn ebitda_section(facts: &CompanyFacts) -> SecSection<SecMarginRow> {
    let ebitda = facts.first_available(EBITDA_CONCEPTS, USD);
    let revenue = facts.first_available(REVENUE_CONCEPTS, USD);
    let (Some((concept, ebitda)), Some((_, revenue))) = (ebitda, revenue) else {
        return SecSection::empty(EBITDA_UNAVAILABLE);
    };

    let rows: Vec<SecMarginRow> = margins(&ebitda, &revenue, SEC_QUARTERS)
        .into_iter()
        .filter(|m| m.margin_pct.is_some())
        .map(|m| SecMarginRow {
            label: format!("Q{} - {}", m.quarter, m.numerator.end),
            date: m.numerator.end,
            ebitda: m.numerator.value,
            revenue: m.denominator.value,
            margin_pct: m.margin_pct,
        })
        .collect();

    SecSection {
        concept: Some(concept.to_string()),
        note: rows.is_empty().then(|| "EBITDA data not available".to_string()),
        rows,
    }
}

/// Build the report from an already-fetched facts bundle.
pub fn from_facts(ticker: &str, cik: &str, facts: &CompanyFacts) -> SecReport {
    SecReport {
        ticker: ticker.to_string(),
        cik: cik.to_string(),
        entity_name: facts.entity_name.clone(),
        sales_growth: growth_section(
            facts.first_available(REVENUE_CONCEPTS, USD),
            "No revenue data found",
        ),
        earnings_growth: growth_section(
            facts.first_available(EARNINGS_CONCEPTS, USD),
            "No earnings data found",
        ),
        ebitda_margins: ebitda_section(facts),
    }
}

/// Resolve the CIK, fetch company facts and build the report.
pub async fn build_sec_report(client: &SecClient, ticker: &str) -> Result<SecReport> {
    let ticker = ticker.to_uppercase();
    let cik = client.resolve_cik(&ticker).await?;
    let facts = client.company_facts(&cik).await?;
    let report = from_facts(&ticker, &cik, &facts);
    info!(
        ticker = %report.ticker,
        cik = %report.cik,
        sales_rows = report.sales_growth.rows.len(),
        earnings_rows = report.earnings_growth.rows.len(),
        "SEC report assembled"
    );
    Ok(report)
}

// ---------------------------------------------------------------------------
// Console rendering
// ---------------------------------------------------------------------------

fn write_growth(
    f: &mut fmt::Formatter<'_>,
    section: &SecSection<SecGrowthRow>,
    current_label: &str,
    prior_label: &str,
) -> fmt::Result {
    if let Some(note) = &section.note {
        writeln!(f, "{note}")?;
    }
    for row in &section.rows {
        writeln!(f, "{}:", row.label)?;
        writeln!(f, "  date: {}", row.date)?;
        writeln!(f, "  {current_label}: {}", money(row.current))?;
        writeln!(f, "  {prior_label}: {}", money(row.prior))?;
        writeln!(f, "  yoyGrowth: {}", pct(row.growth_pct))?;
    }
    Ok(())
}

impl fmt::Display for SecReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        write_heading(f, &format!("SEC DATA REPORT: {}", self.ticker), RULE_WIDTH)?;
        writeln!(f, "CIK: {}", self.cik)?;
        if let Some(name) = &self.entity_name {
            writeln!(f, "Entity: {name}")?;
        }
        writeln!(f)?;

        write_heading(f, "SALES GROWTH Y/Y (from SEC filings)", RULE_WIDTH)?;
        write_growth(f, &self.sales_growth, "currentRevenue", "priorYearRevenue")?;

        writeln!(f)?;
        write_heading(f, "EARNINGS GROWTH Y/Y (from SEC filings)", RULE_WIDTH)?;
        write_growth(f, &self.earnings_growth, "currentEarnings", "priorYearEarnings")?;

        writeln!(f)?;
        write_heading(f, "EBITDA MARGINS (from SEC filings)", RULE_WIDTH)?;
        if let Some(note) = &self.ebitda_margins.note {
            writeln!(f, "note: {note}")?;
        }
        for row in &self.ebitda_margins.rows {
            writeln!(f, "{}:", row.label)?;
            writeln!(f, "  ebitda: {}", money(row.ebitda))?;
            writeln!(f, "  revenue: {}", money(row.revenue))?;
            writeln!(f, "  ebitdaMargin: {}", pct(row.margin_pct))?;
        }

        writeln!(f)?;
        writeln!(f, "{}", rule(RULE_WIDTH))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
