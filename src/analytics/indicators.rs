//! Technical indicators over ascending close-price series.
//!
//! Every function returns a vector index-aligned with its input, with
//! `None` wherever the indicator is undefined (insufficient history).
//! An input shorter than the indicator's window yields all `None`.

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Default RSI look-back.
pub const RSI_PERIOD: usize = 14;

/// Default Bollinger window and band width.
pub const BOLLINGER_WINDOW: usize = 20;
pub const BOLLINGER_K: f64 = 2.0;

/// MACD spans.
#[derive(Debug, Clone, Copy)]
pub struct MacdConfig {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

// ---------------------------------------------------------------------------
// Moving averages
// ---------------------------------------------------------------------------

/// Simple moving average over `window` values, defined from index `window - 1`.
pub fn sma(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }

    for i in (window - 1)..values.len() {
        let sum: f64 = values[i + 1 - window..=i].iter().sum();
        out[i] = Some(sum / window as f64);
    }
    out
}

/// Exponential moving average with span `span`.
///
/// Seeded with the simple mean of the first `span` values (placed at index
/// `span - 1`), then `ema = (x - prev) * 2/(span+1) + prev` left to right.
pub fn ema(values: &[f64], span: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if span == 0 || values.len() < span {
        return out;
    }

    let multiplier = 2.0 / (span as f64 + 1.0);
    let mut prev = values[..span].iter().sum::<f64>() / span as f64;
    out[span - 1] = Some(prev);

    for (i, &x) in values.iter().enumerate().skip(span) {
        prev = (x - prev) * multiplier + prev;
        out[i] = Some(prev);
    }
    out
}

/// EMA over a series whose defined values form a contiguous suffix
/// (e.g. the MACD line). The result keeps the input's alignment.
fn ema_of_defined(series: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; series.len()];
    let Some(start) = series.iter().position(Option::is_some) else {
        return out;
    };

    let tail: Vec<f64> = series[start..].iter().map_while(|v| *v).collect();
    for (offset, value) in ema(&tail, span).into_iter().enumerate() {
        out[start + offset] = value;
    }
    out
}

// ---------------------------------------------------------------------------
// Oscillators
// ---------------------------------------------------------------------------

/// Relative strength index over the trailing `period` price changes.
///
/// Uses plain (not Wilder-smoothed) averages of gains and losses. Defined
/// from index `period`; exactly 100 when the window holds no losses.
pub fn rsi(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() <= period {
        return out;
    }

    let deltas: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

    for i in period..values.len() {
        let window = &deltas[i - period..i];
        let avg_gain = window.iter().map(|d| d.max(0.0)).sum::<f64>() / period as f64;
        let avg_loss = window.iter().map(|d| (-d).max(0.0)).sum::<f64>() / period as f64;

        let value = if avg_loss == 0.0 {
            100.0
        } else {
            let rs = avg_gain / avg_loss;
            100.0 - 100.0 / (1.0 + rs)
        };
        out[i] = Some(value);
    }
    out
}

/// MACD line, signal line and histogram, all aligned with the input.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

/// MACD = EMA(fast) - EMA(slow), subtracted index by index so both EMAs
/// refer to the same bar despite their different warm-up lengths.
pub fn macd(values: &[f64], config: MacdConfig) -> MacdSeries {
    let fast = ema(values, config.fast);
    let slow = ema(values, config.slow);

    let line: Vec<Option<f64>> = fast
        .iter()
        .zip(&slow)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    let signal = ema_of_defined(&line, config.signal);

    let histogram = line
        .iter()
        .zip(&signal)
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => Some(m - s),
            _ => None,
        })
        .collect();

    MacdSeries {
        macd: line,
        signal,
        histogram,
    }
}

// ---------------------------------------------------------------------------
// Bands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Bollinger Bands: SMA(window) ± k × population standard deviation.
pub fn bollinger(values: &[f64], window: usize, k: f64) -> BollingerSeries {
    let middle = sma(values, window);
    let mut upper = vec![None; values.len()];
    let mut lower = vec![None; values.len()];

    for (i, mean) in middle.iter().enumerate() {
        let Some(mean) = *mean else { continue };
        let slice = &values[i + 1 - window..=i];
        let variance = slice.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / window as f64;
        let std_dev = variance.sqrt();
        upper[i] = Some(mean + k * std_dev);
        lower[i] = Some(mean - k * std_dev);
    }

    BollingerSeries {
        upper,
        middle,
        lower,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
