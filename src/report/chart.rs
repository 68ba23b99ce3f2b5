//! Chart payloads for the candlestick front end.
//!
//! A payload is either the full data set (bars, volume, indicator overlays)
//! or a `{"success": false, "error": ...}` marker. Both shapes carry the
//! `success` key.

use anyhow::Result;
use serde::Serialize;
use tracing::warn;

use crate::analytics::indicators::{
    bollinger, ema, macd, rsi, sma, MacdConfig, BOLLINGER_K, BOLLINGER_WINDOW, RSI_PERIOD,
};
use crate::analytics::{align, round_to, DISPLAY_DECIMALS, MACD_DECIMALS};
use crate::providers::{BarRequest, BarSeries, BarSource};
use crate::types::{Bar, ScoutError, TimePoint};

pub const UP_COLOR: &str = "#26a69a";
pub const DOWN_COLOR: &str = "#ef5350";

const NO_DATA_MESSAGE: &str = "No data available for this ticker";

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ChartPayload {
    Ok(ChartData),
    Failed(ChartFailure),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub success: bool,
    pub ticker: String,
    pub interval: String,
    pub candlesticks: Vec<Candle>,
    pub volume: Vec<VolumeBar>,
    pub indicators: IndicatorSet,
    pub current_price: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartFailure {
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeBar {
    pub time: i64,
    pub value: f64,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramPoint {
    pub time: i64,
    pub value: f64,
    pub color: &'static str,
}

/// Indicator overlays keyed the way the front end expects.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSet {
    pub sma20: Vec<TimePoint>,
    pub sma50: Vec<TimePoint>,
    pub sma200: Vec<TimePoint>,
    pub ema12: Vec<TimePoint>,
    pub ema26: Vec<TimePoint>,
    pub rsi: Vec<TimePoint>,
    pub macd: Vec<TimePoint>,
    pub macd_signal: Vec<TimePoint>,
    pub macd_histogram: Vec<HistogramPoint>,
    pub bb_upper: Vec<TimePoint>,
    pub bb_middle: Vec<TimePoint>,
    pub bb_lower: Vec<TimePoint>,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

fn color_for(up: bool) -> &'static str {
    if up {
        UP_COLOR
    } else {
        DOWN_COLOR
    }
}

/// Compute every overlay from ascending bars.
pub fn compute_indicators(bars: &[Bar]) -> IndicatorSet {
    let times: Vec<i64> = bars.iter().map(|b| b.time).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let macd_series = macd(&closes, MacdConfig::default());
    let bands = bollinger(&closes, BOLLINGER_WINDOW, BOLLINGER_K);

    let macd_histogram = times
        .iter()
        .zip(&macd_series.histogram)
        .filter_map(|(&time, value)| {
            value.map(|v| HistogramPoint {
                time,
                value: round_to(v, MACD_DECIMALS),
                color: color_for(v >= 0.0),
            })
        })
        .collect();

    IndicatorSet {
        sma20: align(&times, &sma(&closes, 20), DISPLAY_DECIMALS),
        sma50: align(&times, &sma(&closes, 50), DISPLAY_DECIMALS),
        sma200: align(&times, &sma(&closes, 200), DISPLAY_DECIMALS),
        ema12: align(&times, &ema(&closes, 12), DISPLAY_DECIMALS),
        ema26: align(&times, &ema(&closes, 26), DISPLAY_DECIMALS),
        rsi: align(&times, &rsi(&closes, RSI_PERIOD), DISPLAY_DECIMALS),
        macd: align(&times, &macd_series.macd, MACD_DECIMALS),
        macd_signal: align(&times, &macd_series.signal, MACD_DECIMALS),
        macd_histogram,
        bb_upper: align(&times, &bands.upper, DISPLAY_DECIMALS),
        bb_middle: align(&times, &bands.middle, DISPLAY_DECIMALS),
        bb_lower: align(&times, &bands.lower, DISPLAY_DECIMALS),
    }
}

impl ChartPayload {
    /// Build the payload from a fetched series. An empty series is a
    /// no-data failure.
    pub fn from_series(series: &BarSeries) -> Self {
        let Some(last) = series.bars.last() else {
            return Self::failure_message(NO_DATA_MESSAGE);
        };

        let candlesticks = series
            .bars
            .iter()
            .map(|b| Candle {
                time: b.time,
                open: round_to(b.open, DISPLAY_DECIMALS),
                high: round_to(b.high, DISPLAY_DECIMALS),
                low: round_to(b.low, DISPLAY_DECIMALS),
                close: round_to(b.close, DISPLAY_DECIMALS),
            })
            .collect();

        let volume = series
            .bars
            .iter()
            .map(|b| VolumeBar {
                time: b.time,
                value: b.volume,
                color: color_for(b.is_up()),
            })
            .collect();

        ChartPayload::Ok(ChartData {
            success: true,
            ticker: series.ticker.clone(),
            interval: series.interval.clone(),
            candlesticks,
            volume,
            indicators: compute_indicators(&series.bars),
            current_price: round_to(last.close, DISPLAY_DECIMALS),
        })
    }

    pub fn failure_message(message: &str) -> Self {
        ChartPayload::Failed(ChartFailure {
            success: false,
            error: message.to_string(),
        })
    }

    /// Failure payload for an error. No-data errors get the fixed marker
    /// text; anything else carries its own message.
    pub fn failure(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<ScoutError>() {
            Some(ScoutError::NoData(_)) => Self::failure_message(NO_DATA_MESSAGE),
            _ => Self::failure_message(&err.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ChartPayload::Ok(_))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Fetch bars and build the payload. Never fails: errors become the
/// failure payload.
pub async fn fetch_chart(source: &dyn BarSource, request: &BarRequest) -> ChartPayload {
    match source.fetch_bars(request).await {
        Ok(series) => ChartPayload::from_series(&series),
        Err(e) => {
            warn!(provider = source.name(), ticker = %request.ticker, error = %e, "Chart fetch failed");
            ChartPayload::failure(&e)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                time: 1_700_000_000 + i as i64 * 86_400,
                open: c - 0.5,
                high: c + 1.0,
                low: c - 1.0,
                close: c,
                volume: 1_000.0 + i as f64,
            })
            .collect()
    }

    fn series(closes: &[f64]) -> BarSeries {
        BarSeries {
            ticker: "PLTR".to_string(),
            interval: "1d".to_string(),
            bars: bars(closes),
        }
    }

    #[test]
    fn test_payload_shape() {
        let closes: Vec<f64> = (0..60).map(|i| 20.0 + (i as f64 * 0.3).sin()).collect();
        let payload = ChartPayload::from_series(&series(&closes));
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["ticker"], "PLTR");
        assert_eq!(json["candlesticks"].as_array().unwrap().len(), 60);
        assert_eq!(json["volume"][0]["color"], UP_COLOR);

        let ind = &json["indicators"];
        assert_eq!(ind["sma20"].as_array().unwrap().len(), 41);
        assert_eq!(ind["sma50"].as_array().unwrap().len(), 11);
        assert!(ind["sma200"].as_array().unwrap().is_empty());
        assert_eq!(ind["ema12"].as_array().unwrap().len(), 49);
        assert_eq!(ind["rsi"].as_array().unwrap().len(), 46);
        assert_eq!(ind["macd"].as_array().unwrap().len(), 35);
        assert_eq!(ind["macdSignal"].as_array().unwrap().len(), 27);
        assert_eq!(ind["macdHistogram"].as_array().unwrap().len(), 27);
        assert!(ind["bbUpper"].is_array());
        assert!(json.get("currentPrice").is_some());
    }

    #[test]
    fn test_current_price_rounded() {
        let payload = ChartPayload::from_series(&series(&[10.0, 12.3456]));
        let ChartPayload::Ok(data) = payload else {
            panic!("expected data");
        };
        assert_eq!(data.current_price, 12.35);
        assert_eq!(data.candlesticks[1].close, 12.35);
        assert!(data.indicators.sma20.is_empty());
    }

    #[test]
    fn test_histogram_colors() {
        let mut closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        closes.extend((0..20).map(|i| 139.0 - 3.0 * i as f64));
        let ind = compute_indicators(&bars(&closes));
        let last = ind.macd_histogram.last().unwrap();
        assert!(last.value < 0.0);
        assert_eq!(last.color, DOWN_COLOR);
    }

    #[test]
    fn test_failure_payloads() {
        let no_data: anyhow::Error = ScoutError::NoData("ZZZZ".to_string()).into();
        let json = serde_json::to_value(ChartPayload::failure(&no_data)).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "No data available for this ticker");

        let other = anyhow::anyhow!("connection reset");
        let payload = ChartPayload::failure(&other);
        assert!(!payload.is_success());
        assert!(payload.to_json().unwrap().contains("connection reset"));

        let empty = ChartPayload::from_series(&series(&[]));
        assert!(!empty.is_success());
    }
}
