#![allow(dead_code)]

use back2trade::domain::backtest::BacktestConfig;
pub use back2trade::domain::candle::Candle;
use back2trade::domain::error::Back2TradeError;
use back2trade::domain::interval::Interval;
use back2trade::ports::candle_port::CandleSource;
use std::cell::RefCell;
use std::collections::HashMap;

pub const BASE_TIME: i64 = 1_694_390_400;

/// In-memory candle source keyed by symbol. Records every request.
pub struct MockCandleSource {
    pub data: HashMap<String, Vec<Candle>>,
    pub errors: HashMap<String, String>,
    pub requests: RefCell<Vec<(String, Interval, Option<i64>, Option<i64>)>>,
}

impl MockCandleSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_candles(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.data.insert(symbol.to_string(), candles);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl CandleSource for MockCandleSource {
    fn fetch_candles(
        &self,
        symbol: &str,
        interval: Interval,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<Vec<Candle>, Back2TradeError> {
        self.requests
            .borrow_mut()
            .push((symbol.to_string(), interval, start, end));
        if let Some(reason) = self.errors.get(symbol) {
            return Err(Back2TradeError::Fetch {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|candles| {
                candles
                    .iter()
                    .filter(|c| start.is_none_or(|s| c.time >= s) && end.is_none_or(|e| c.time <= e))
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub fn make_candle(index: usize, close: f64) -> Candle {
    Candle {
        time: BASE_TIME + index as i64 * 3_600,
        open: close,
        high: close,
        low: close,
        close,
        volume: 100.0,
    }
}

/// Hourly candles from `BASE_TIME`, one per close.
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_candle(i, close))
        .collect()
}

pub fn sample_config(fast_window: usize, slow_window: usize) -> BacktestConfig {
    BacktestConfig {
        symbol: "BTCUSDT".to_string(),
        interval: Interval::OneHour,
        fast_window,
        slow_window,
        start: None,
        end: None,
    }
}

/// Rises to 6 then falls back to 1.
pub const RISE_FALL: [f64; 11] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0];

/// Falls, rises past the start, then falls again.
pub const FALL_RISE_FALL: [f64; 12] = [6.0, 5.0, 4.0, 3.0, 2.0, 3.0, 4.0, 6.0, 8.0, 9.0, 7.0, 5.0];
