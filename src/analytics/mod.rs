//! Numeric transforms.
//!
//! Pure functions over ordered numeric sequences: rolling technical
//! indicators and year-over-year growth / ratio derivations. Nothing in
//! here performs I/O; every function can be exercised with plain vectors.

pub mod growth;
pub mod indicators;

use crate::types::TimePoint;

/// Decimal places for price-scale display values (SMA, EMA, RSI, bands).
pub const DISPLAY_DECIMALS: u32 = 2;

/// Decimal places for the MACD family (line, signal, histogram).
pub const MACD_DECIMALS: u32 = 4;

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Pair a derived series with the input timestamps, dropping undefined
/// points and rounding the rest for display.
///
/// `series` must be index-aligned with `times`.
pub fn align(times: &[i64], series: &[Option<f64>], decimals: u32) -> Vec<TimePoint> {
    times
        .iter()
        .zip(series)
        .filter_map(|(&time, value)| {
            value.map(|v| TimePoint {
                time,
                value: round_to(v, decimals),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(1.23456, 4), 1.2346);
        assert_eq!(round_to(-0.125, 2), -0.13);
        assert_eq!(round_to(100.0, 2), 100.0);
    }

    #[test]
    fn test_align_drops_undefined() {
        let times = [10, 20, 30, 40];
        let series = [None, None, Some(1.005), Some(2.0)];
        let points = align(&times, &series, 2);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].time, 30);
        assert_eq!(points[1], TimePoint { time: 40, value: 2.0 });
    }
}
