//! OHLCV candle representation.

use crate::domain::error::Back2TradeError;
use serde::{Deserialize, Serialize};

/// One exchange candle. `time` is the open time in unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    fn first_non_finite(&self) -> Option<&'static str> {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite())
        .map(|(name, _)| name)
    }
}

pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// Checks that every field is finite and that `time` strictly increases.
pub fn validate_candles(candles: &[Candle]) -> Result<(), Back2TradeError> {
    for (i, candle) in candles.iter().enumerate() {
        if let Some(field) = candle.first_non_finite() {
            return Err(Back2TradeError::InvalidPriceData {
                index: i,
                reason: format!("{field} is not a finite number"),
            });
        }
        if i > 0 && candle.time <= candles[i - 1].time {
            return Err(Back2TradeError::UnorderedCandles {
                index: i,
                time: candle.time,
                previous: candles[i - 1].time,
            });
        }
    }
    Ok(())
}

/// Appends `newer` to `older`, dropping candles that do not advance past the
/// last kept time.
pub fn merge_candles(older: Vec<Candle>, newer: Vec<Candle>) -> Vec<Candle> {
    let mut merged = older;
    merged.reserve(newer.len());
    for candle in newer {
        match merged.last() {
            Some(last) if candle.time <= last.time => continue,
            _ => merged.push(candle),
        }
    }
    merged
}
