//! Report assembly and rendering.
//!
//! Each submodule turns provider data into one output document: a struct
//! that serializes to the JSON contract and implements `Display` for the
//! console. Sections are independent; a failed fetch leaves its section
//! empty and the rest of the report proceeds.
//!
//! Rounding for display happens here and nowhere else.

pub mod chart;
pub mod fundamentals;
pub mod metrics;
pub mod news;
pub mod sec;

use anyhow::Result;
use serde::Serializer;
use std::fmt;
use tracing::warn;

use crate::analytics::{round_to, DISPLAY_DECIMALS};

/// Width of the `=` rules framing console sections.
pub const RULE_WIDTH: usize = 60;

/// A line of `=` characters.
pub fn rule(width: usize) -> String {
    "=".repeat(width)
}

/// A title framed by `=` rules above and below.
pub(crate) fn write_heading(f: &mut fmt::Formatter<'_>, title: &str, width: usize) -> fmt::Result {
    writeln!(f, "{}", rule(width))?;
    writeln!(f, "{title}")?;
    writeln!(f, "{}", rule(width))
}

/// Unwrap a section result, logging and defaulting on failure.
pub fn section<T: Default>(name: &str, ticker: &str, result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(section = name, ticker, error = %e, "Section unavailable");
            T::default()
        }
    }
}

/// Like [`section`], also recording the section name when it failed.
pub fn section_noted<T: Default>(
    name: &str,
    ticker: &str,
    result: Result<T>,
    unavailable: &mut Vec<String>,
) -> T {
    if result.is_err() {
        unavailable.push(name.to_string());
    }
    section(name, ticker, result)
}

/// Group an integer's digits in threes: `1234567` → `1,234,567`.
pub fn thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if value < 0 {
        format!("-{out}")
    } else {
        out
    }
}

/// Whole-dollar amount with thousands separators: `$1,234,567`.
pub fn money(value: f64) -> String {
    format!("${}", thousands(value.round() as i64))
}

/// Percentage with two decimals, or `n/a`.
pub fn pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}%", round_to(v, DISPLAY_DECIMALS)),
        None => "n/a".to_string(),
    }
}

/// Serialize an optional figure rounded to display precision.
pub(crate) fn round2<S: Serializer>(value: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => s.serialize_some(&round_to(*v, DISPLAY_DECIMALS)),
        None => s.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1_000), "1,000");
        assert_eq!(thousands(1_234_567), "1,234,567");
        assert_eq!(thousands(-45_000), "-45,000");
    }

    #[test]
    fn test_money() {
        assert_eq!(money(2_890_000_000.4), "$2,890,000,000");
        assert_eq!(money(-1_500.6), "$-1,501");
    }

    #[test]
    fn test_pct() {
        assert_eq!(pct(Some(5.263157)), "5.26%");
        assert_eq!(pct(Some(-1.236)), "-1.24%");
        assert_eq!(pct(None), "n/a");
    }

    #[test]
    fn test_section_defaults_on_error() {
        let ok: Vec<u32> = section("demo", "T", Ok(vec![1, 2]));
        assert_eq!(ok, vec![1, 2]);
        let failed: Vec<u32> = section("demo", "T", Err(anyhow::anyhow!("boom")));
        assert!(failed.is_empty());
    }
}
