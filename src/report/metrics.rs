//! Quick metrics snapshot: FCF and margin trends, quarterly earnings,
//! forward growth estimates and short stats. Figures are fractions
//! (0.12 = 12%), printed to four decimals.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use super::section;
use crate::analytics::growth::{estimate_growth, margins, most_recent_first, pct_change_periods};
use crate::providers::{FundamentalsSource, StatementItem};
use crate::types::{EarningsEvent, EstimateTrend, QuarterlyFact, ShortStats};

/// Rows kept in each trailing section.
pub const TRAILING_QUARTERS: usize = 4;
/// Forward quarterly periods considered for estimate growth.
pub const FORWARD_PERIODS: usize = 2;
/// Steps between a quarter and the same quarter a year earlier.
const YEAR_STEPS: usize = 4;

// ---------------------------------------------------------------------------
// Report rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatedFigure {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterEarnings {
    pub date: NaiveDate,
    pub eps_actual: Option<f64>,
    pub revenue: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForwardGrowth {
    pub period: String,
    pub growth: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    pub ticker: String,
    pub fcf_growth_yoy: Vec<DatedFigure>,
    pub gross_margin: Vec<DatedFigure>,
    pub quarterly_earnings: Vec<QuarterEarnings>,
    pub sales_growth_next2: Vec<ForwardGrowth>,
    pub eps_growth_next2: Vec<ForwardGrowth>,
    pub short_stats: ShortStats,
}

// ---------------------------------------------------------------------------
// Derivations
// ---------------------------------------------------------------------------

fn ascending(facts: &[QuarterlyFact]) -> Vec<QuarterlyFact> {
    let mut sorted = most_recent_first(facts);
    sorted.reverse();
    sorted
}

fn tail<T>(mut rows: Vec<T>, n: usize) -> Vec<T> {
    let skip = rows.len().saturating_sub(n);
    rows.drain(..skip);
    rows
}

/// Four-step fractional change over an ascending series, last `n` rows.
///
/// Rows without a year-earlier value are kept with `value: None`.
pub fn yoy_fraction_tail(facts: &[QuarterlyFact], n: usize) -> Vec<DatedFigure> {
    let sorted = ascending(facts);
    let values: Vec<f64> = sorted.iter().map(|f| f.value).collect();
    let changes = pct_change_periods(&values, YEAR_STEPS);

    let rows = sorted
        .iter()
        .zip(changes)
        .map(|(f, value)| DatedFigure { date: f.end, value })
        .collect();
    tail(rows, n)
}

/// Gross profit over revenue as a fraction, last `n` quarters ascending.
pub fn margin_fraction_tail(
    gross_profit: &[QuarterlyFact],
    revenue: &[QuarterlyFact],
    n: usize,
) -> Vec<DatedFigure> {
    let mut rows: Vec<DatedFigure> = margins(gross_profit, revenue, n)
        .into_iter()
        .map(|m| DatedFigure {
            date: m.numerator.end,
            value: m.margin_pct.map(|p| p / 100.0),
        })
        .collect();
    rows.reverse();
    rows
}

/// Reported quarters joined with revenue for the same period end.
pub fn quarterly_earnings(
    events: &[EarningsEvent],
    revenue: &[QuarterlyFact],
    n: usize,
) -> Vec<QuarterEarnings> {
    let mut rows: Vec<QuarterEarnings> = events
        .iter()
        .filter(|e| e.is_reported())
        .map(|e| QuarterEarnings {
            date: e.date,
            eps_actual: e.reported_eps,
            revenue: revenue.iter().find(|r| r.end == e.date).map(|r| r.value),
        })
        .collect();
    rows.sort_by_key(|r| r.date);
    tail(rows, n)
}

/// `avg / year_ago - 1` for the first `n` quarterly forward periods.
pub fn forward_growth(
    trends: &[EstimateTrend],
    n: usize,
    figures: impl Fn(&EstimateTrend) -> (Option<f64>, Option<f64>),
) -> Vec<ForwardGrowth> {
    trends
        .iter()
        .filter(|t| t.period.ends_with('q'))
        .take(n)
        .map(|t| {
            let (avg, year_ago) = figures(t);
            ForwardGrowth {
                period: t.period.clone(),
                growth: estimate_growth(avg, year_ago),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

pub async fn build_metrics(source: &dyn FundamentalsSource, ticker: &str) -> MetricsReport {
    let fcf = section(
        "free cash flow",
        ticker,
        source.quarterly_statement(ticker, StatementItem::FreeCashFlow).await,
    );
    let revenue = section(
        "revenue",
        ticker,
        source.quarterly_statement(ticker, StatementItem::TotalRevenue).await,
    );
    let gross_profit = section(
        "gross profit",
        ticker,
        source.quarterly_statement(ticker, StatementItem::GrossProfit).await,
    );
    let events = section("earnings", ticker, source.earnings_events(ticker).await);
    let trends = section("estimate trend", ticker, source.estimate_trends(ticker).await);
    let short_stats = section("short interest", ticker, source.short_stats(ticker).await);

    MetricsReport {
        ticker: ticker.to_string(),
        fcf_growth_yoy: yoy_fraction_tail(&fcf, TRAILING_QUARTERS),
        gross_margin: margin_fraction_tail(&gross_profit, &revenue, TRAILING_QUARTERS),
        quarterly_earnings: quarterly_earnings(&events, &revenue, TRAILING_QUARTERS),
        sales_growth_next2: forward_growth(&trends, FORWARD_PERIODS, |t| {
            (t.revenue_avg, t.revenue_year_ago)
        }),
        eps_growth_next2: forward_growth(&trends, FORWARD_PERIODS, |t| {
            (t.eps_avg, t.eps_year_ago)
        }),
        short_stats,
    }
}

// ---------------------------------------------------------------------------
// Console rendering
// ---------------------------------------------------------------------------

fn fraction(value: Option<f64>) -> String {
    value.map_or_else(|| "None".to_string(), |v| format!("{v:.4}"))
}

fn opt<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "None".to_string(), |v| v.to_string())
}

fn write_figures(f: &mut fmt::Formatter<'_>, rows: &[DatedFigure]) -> fmt::Result {
    if rows.is_empty() {
        return writeln!(f, "None");
    }
    for row in rows {
        writeln!(f, "{}    {}", row.date, fraction(row.value))?;
    }
    Ok(())
}

fn write_forward(f: &mut fmt::Formatter<'_>, rows: &[ForwardGrowth]) -> fmt::Result {
    if rows.is_empty() {
        return writeln!(f, "None");
    }
    for row in rows {
        writeln!(f, "{}: {}", row.period, fraction(row.growth))?;
    }
    Ok(())
}

impl fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== {} metrics ===", self.ticker)?;

        writeln!(f, "\nLast 4 quarters FCF YoY growth:")?;
        write_figures(f, &self.fcf_growth_yoy)?;

        writeln!(f, "\nLast 4 quarters Gross Margin:")?;
        write_figures(f, &self.gross_margin)?;

        writeln!(f, "\nQuarterly earnings (actual EPS & revenue):")?;
        if self.quarterly_earnings.is_empty() {
            writeln!(f, "None")?;
        }
        for row in &self.quarterly_earnings {
            let revenue = row.revenue.map(super::money);
            writeln!(f, "{}    EPS {}    Revenue {}", row.date, opt(row.eps_actual), opt(revenue))?;
        }

        writeln!(f, "\nNext 2 quarters estimated SALES growth (y/y):")?;
        write_forward(f, &self.sales_growth_next2)?;

        writeln!(f, "\nNext 2 quarters estimated EPS growth (y/y):")?;
        write_forward(f, &self.eps_growth_next2)?;

        writeln!(f, "\nShort interest stats (if available):")?;
        let s = &self.short_stats;
        writeln!(f, "sharesShort: {}", opt(s.shares_short))?;
        writeln!(f, "sharesShortPriorMonth: {}", opt(s.shares_short_prior_month))?;
        writeln!(f, "shortRatio: {}", opt(s.short_ratio))?;
        writeln!(f, "shortPercentOfFloat: {}", opt(s.short_percent_of_float))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
