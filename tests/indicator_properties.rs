//! Indicator behaviour on synthetic price series.

use tickerscope::analytics::growth::{yoy_growth, YoyMatch};
use tickerscope::analytics::indicators::{bollinger, ema, macd, rsi, sma, MacdConfig};
use tickerscope::report::chart::compute_indicators;
use tickerscope::types::{Bar, QuarterlyFact};

fn flat_bars(n: usize, price: f64) -> Vec<Bar> {
    (0..n)
        .map(|i| Bar {
            time: 1_700_000_000 + i as i64 * 86_400,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 1_000.0,
        })
        .collect()
}

/// Deterministic zig-zag with drift, enough to move every indicator.
fn wavy(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + (i as f64) * 0.3 + if i % 3 == 0 { 4.0 } else { -2.5 })
        .collect()
}

#[test]
fn test_constant_series_collapses_indicators() {
    let indicators = compute_indicators(&flat_bars(30, 42.5));

    assert_eq!(indicators.sma20.len(), 11);
    assert!(indicators.sma20.iter().all(|p| p.value == 42.5));

    assert_eq!(indicators.ema12.len(), 19);
    assert!(indicators.ema12.iter().all(|p| p.value == 42.5));

    assert_eq!(indicators.rsi.len(), 16);
    assert!(indicators.rsi.iter().all(|p| p.value == 100.0));

    for band in [&indicators.bb_upper, &indicators.bb_middle, &indicators.bb_lower] {
        assert_eq!(band.len(), 11);
        assert!(band.iter().all(|p| p.value == 42.5));
    }

    // Not enough history for the longer windows
    assert!(indicators.sma50.is_empty());
    assert!(indicators.sma200.is_empty());
    assert_eq!(indicators.macd.len(), 5);
    assert!(indicators.macd_signal.is_empty());
}

#[test]
fn test_short_input_yields_empty_series() {
    let values = [1.0, 2.0, 3.0];
    assert!(sma(&values, 20).iter().all(Option::is_none));
    assert!(ema(&values, 12).iter().all(Option::is_none));
    assert!(rsi(&values, 14).iter().all(Option::is_none));
    assert!(bollinger(&values, 20, 2.0).middle.iter().all(Option::is_none));
    assert!(compute_indicators(&flat_bars(3, 10.0)).sma20.is_empty());
}

#[test]
fn test_ema_depends_on_order() {
    let values = wavy(40);
    let mut reversed = values.clone();
    reversed.reverse();

    let forward = ema(&values, 12);
    let backward = ema(&reversed, 12);
    assert_ne!(forward.last(), backward.last());
}

#[test]
fn test_rsi_bounds() {
    let values = wavy(120);
    let series = rsi(&values, 14);
    assert!(series[..14].iter().all(Option::is_none));
    assert!(series[14..]
        .iter()
        .flatten()
        .all(|v| (0.0..=100.0).contains(v)));

    let falling: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
    assert!(rsi(&falling, 14).iter().flatten().all(|v| *v == 0.0));
}

#[test]
fn test_bands_are_ordered() {
    let values = wavy(80);
    let bands = bollinger(&values, 20, 2.0);
    for i in 19..values.len() {
        let (u, m, l) = (
            bands.upper[i].unwrap(),
            bands.middle[i].unwrap(),
            bands.lower[i].unwrap(),
        );
        assert!(u >= m && m >= l, "bands out of order at {i}");
    }
}

#[test]
fn test_macd_alignment() {
    let values = wavy(60);
    let series = macd(&values, MacdConfig::default());
    assert!(series.macd[24].is_none());
    assert!(series.macd[25].is_some());
    assert!(series.signal[32].is_none());
    assert!(series.signal[33].is_some());
    assert_eq!(series.histogram.iter().flatten().count(), 60 - 33);
}

#[test]
fn test_revenue_yoy_example() {
    let ends = ["2024-06-30", "2024-03-31", "2023-12-31", "2023-09-30", "2023-06-30"];
    let facts: Vec<QuarterlyFact> = ends
        .iter()
        .zip([100.0, 110.0, 90.0, 120.0, 95.0])
        .map(|(e, v)| QuarterlyFact::dated(e.parse().unwrap(), v))
        .collect();

    let rows = yoy_growth(&facts, 3, YoyMatch::IndexOffset(4));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].quarter, 1);
    let growth = rows[0].growth_pct.unwrap();
    assert_eq!((growth * 100.0).round() / 100.0, 5.26);
}
