//! Year-over-year growth and ratio derivations for quarterly statements.
//!
//! Two strategies locate "the same quarter last year":
//!
//! - [`YoyMatch::IndexOffset`]: the fact N positions further back in a
//!   most-recent-first series. Assumes a perfectly regular quarterly
//!   cadence; a missing or extra filing shifts every comparison.
//! - [`YoyMatch::FiscalPeriod`]: the fact with the same fiscal period and
//!   fiscal year minus one. Requires fiscal metadata; facts without it
//!   produce no row.
//!
//! The two disagree under irregular cadences or restated filings.
//! Fiscal-period matching is canonical wherever fiscal metadata exists.
//!
//! A prior value of zero never divides: the growth figure is `None`.

use serde::Serialize;

use crate::types::QuarterlyFact;

/// How to locate the prior-year comparison for a quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YoyMatch {
    /// Prior = the fact this many positions later in most-recent-first order.
    IndexOffset(usize),
    /// Prior = same fiscal period, fiscal year - 1.
    FiscalPeriod,
}

impl YoyMatch {
    /// Four quarters back, the usual offset for quarterly statements.
    pub const FOUR_QUARTERS: YoyMatch = YoyMatch::IndexOffset(4);
}

/// One year-over-year comparison row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YoyGrowth {
    /// 1-based position among the most recent quarters.
    pub quarter: usize,
    pub current: QuarterlyFact,
    pub prior: QuarterlyFact,
    /// `(current - prior) / |prior| * 100`; `None` when prior is zero.
    pub growth_pct: Option<f64>,
}

/// One margin row (numerator / denominator for a single period).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Margin {
    pub quarter: usize,
    pub numerator: QuarterlyFact,
    pub denominator: QuarterlyFact,
    pub margin_pct: Option<f64>,
}

// ---------------------------------------------------------------------------
// Scalar helpers
// ---------------------------------------------------------------------------

/// Percentage change relative to the magnitude of `prior`.
pub fn pct_change(current: f64, prior: f64) -> Option<f64> {
    if prior == 0.0 || !prior.is_finite() || !current.is_finite() {
        return None;
    }
    Some((current - prior) / prior.abs() * 100.0)
}

/// `numerator / denominator * 100`, `None` for a zero denominator.
pub fn ratio_pct(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        return None;
    }
    Some(numerator / denominator * 100.0)
}

/// Earnings surprise in percent of the estimate's magnitude.
pub fn surprise_pct(reported: f64, estimated: f64) -> Option<f64> {
    pct_change(reported, estimated)
}

/// Forward growth implied by a consensus figure: `avg / year_ago - 1`.
pub fn estimate_growth(avg: Option<f64>, year_ago: Option<f64>) -> Option<f64> {
    match (avg, year_ago) {
        (Some(avg), Some(year_ago)) if year_ago != 0.0 => Some(avg / year_ago - 1.0),
        _ => None,
    }
}

/// Fractional change over `periods` steps of an ascending series.
///
/// Index-aligned with the input; the first `periods` entries and any
/// comparison against zero are `None`.
pub fn pct_change_periods(values: &[f64], periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if periods == 0 || i < periods {
                return None;
            }
            let base = values[i - periods];
            if base == 0.0 {
                None
            } else {
                Some(values[i] / base - 1.0)
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Series operations
// ---------------------------------------------------------------------------

/// Sort facts most-recent-first by period end (stable for equal ends).
pub fn most_recent_first(facts: &[QuarterlyFact]) -> Vec<QuarterlyFact> {
    let mut sorted = facts.to_vec();
    sorted.sort_by(|a, b| b.end.cmp(&a.end));
    sorted
}

/// Year-over-year growth for the most recent `quarters` facts.
///
/// Quarters with no prior-year match are omitted, so the result may be
/// shorter than `quarters` and its `quarter` numbers may have gaps.
pub fn yoy_growth(facts: &[QuarterlyFact], quarters: usize, strategy: YoyMatch) -> Vec<YoyGrowth> {
    let sorted = most_recent_first(facts);

    sorted
        .iter()
        .take(quarters)
        .enumerate()
        .filter_map(|(i, current)| {
            let prior = match strategy {
                YoyMatch::IndexOffset(offset) => sorted.get(i + offset),
                YoyMatch::FiscalPeriod => find_prior_fiscal(&sorted, current),
            }?;
            Some(YoyGrowth {
                quarter: i + 1,
                current: current.clone(),
                prior: prior.clone(),
                growth_pct: pct_change(current.value, prior.value),
            })
        })
        .collect()
}

fn find_prior_fiscal<'a>(
    facts: &'a [QuarterlyFact],
    current: &QuarterlyFact,
) -> Option<&'a QuarterlyFact> {
    let fy = current.fiscal_year?;
    let fp = current.fiscal_period?;
    facts
        .iter()
        .find(|f| f.fiscal_period == Some(fp) && f.fiscal_year == Some(fy - 1))
}

/// Margin of `numerator` over `denominator` for the most recent
/// `quarters` numerator facts, matching periods by end date.
///
/// When both sides carry a fiscal period it must agree as well.
/// Numerator periods without a matching denominator are omitted.
pub fn margins(
    numerator: &[QuarterlyFact],
    denominator: &[QuarterlyFact],
    quarters: usize,
) -> Vec<Margin> {
    let sorted = most_recent_first(numerator);

    sorted
        .iter()
        .take(quarters)
        .enumerate()
        .filter_map(|(i, num)| {
            let den = denominator.iter().find(|d| {
                d.end == num.end
                    && match (d.fiscal_period, num.fiscal_period) {
                        (Some(a), Some(b)) => a == b,
                        _ => true,
                    }
            })?;
            Some(Margin {
                quarter: i + 1,
                numerator: num.clone(),
                denominator: den.clone(),
                margin_pct: ratio_pct(num.value, den.value),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
