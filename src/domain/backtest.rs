//! Moving-average crossover backtest engine.
//!
//! A single forward scan over the candles holds at most one open position.
//! When the fast SMA crosses above the slow SMA any short is closed and a long
//! opened on the same candle; a cross below does the reverse. A cross in the
//! direction already held re-opens that position at the new close. A position
//! still open after the last candle is reported as `open_position` and never
//! counted as a trade.
//!
//! The crossing bar is the first bar with a strict `>`/`<`; the bar before it
//! only needs `<=`/`>=`, so a bar where the averages are equal is never itself
//! a crossing bar.

use super::candle::{closes, validate_candles, Candle};
use super::error::Back2TradeError;
use super::indicator::sma::calculate_sma;
use super::indicator::MovingAverageSeries;
use super::interval::Interval;
use super::metrics::Metrics;
use super::position::{Fill, Position, Trade};
use super::signal::{Signal, SignalKind};

/// Parameters of one backtest run. `start`/`end` are unix seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub symbol: String,
    pub interval: Interval,
    pub fast_window: usize,
    pub slow_window: usize,
    pub start: Option<i64>,
    pub end: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    pub signals: Vec<Signal>,
    pub metrics: Metrics,
    pub fast_ma: MovingAverageSeries,
    pub slow_ma: MovingAverageSeries,
    pub open_position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cross {
    Up,
    Down,
}

fn crossing(fast_prev: f64, slow_prev: f64, fast: f64, slow: f64) -> Option<Cross> {
    if fast > slow && fast_prev <= slow_prev {
        Some(Cross::Up)
    } else if fast < slow && fast_prev >= slow_prev {
        Some(Cross::Down)
    } else {
        None
    }
}

/// Runs the crossover scan. Candles must have finite prices and strictly
/// increasing times; anything else is rejected before scanning.
pub fn run_backtest(
    candles: &[Candle],
    fast_window: usize,
    slow_window: usize,
) -> Result<BacktestResult, Back2TradeError> {
    if candles.is_empty() {
        return Ok(BacktestResult {
            trades: Vec::new(),
            signals: Vec::new(),
            metrics: Metrics::default(),
            fast_ma: calculate_sma(&[], fast_window),
            slow_ma: calculate_sma(&[], slow_window),
            open_position: Position::Flat,
        });
    }

    validate_candles(candles)?;

    let prices = closes(candles);
    let fast_ma = calculate_sma(&prices, fast_window);
    let slow_ma = calculate_sma(&prices, slow_window);

    let mut position = Position::Flat;
    let mut trades = Vec::new();
    let mut signals = Vec::new();

    for i in 1..candles.len() {
        let (Some(fast), Some(slow), Some(fast_prev), Some(slow_prev)) = (
            fast_ma.get(i),
            slow_ma.get(i),
            fast_ma.get(i - 1),
            slow_ma.get(i - 1),
        ) else {
            continue;
        };

        let Some(cross) = crossing(fast_prev, slow_prev, fast, slow) else {
            continue;
        };

        let fill = Fill {
            index: i,
            time: candles[i].time,
            price: candles[i].close,
        };
        let signal = |kind| Signal {
            kind,
            index: fill.index,
            time: fill.time,
            price: fill.price,
        };

        // A cross in the held direction re-opens at this bar without
        // realizing a trade.
        match (cross, position) {
            (Cross::Up, Position::Long(_)) => {
                position = Position::Long(fill);
                signals.push(signal(SignalKind::LongEntry));
            }
            (Cross::Down, Position::Short(_)) => {
                position = Position::Short(fill);
                signals.push(signal(SignalKind::ShortEntry));
            }
            (Cross::Up, current) => {
                if let Some(trade) = current.close(fill) {
                    trades.push(trade);
                    signals.push(signal(SignalKind::ShortExit));
                }
                position = Position::Long(fill);
                signals.push(signal(SignalKind::LongEntry));
            }
            (Cross::Down, current) => {
                if let Some(trade) = current.close(fill) {
                    trades.push(trade);
                    signals.push(signal(SignalKind::LongExit));
                }
                position = Position::Short(fill);
                signals.push(signal(SignalKind::ShortEntry));
            }
        }
    }

    let metrics = Metrics::compute(&trades);

    Ok(BacktestResult {
        trades,
        signals,
        metrics,
        fast_ma,
        slow_ma,
        open_position: position,
    })
}
