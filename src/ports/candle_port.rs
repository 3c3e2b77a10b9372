//! Candle source port trait.

use crate::domain::candle::Candle;
use crate::domain::error::Back2TradeError;
use crate::domain::interval::Interval;

pub trait CandleSource {
    /// Candles for `symbol` ordered by strictly increasing time. `start` and
    /// `end` are inclusive bounds in unix seconds; `None` leaves that side
    /// open.
    fn fetch_candles(
        &self,
        symbol: &str,
        interval: Interval,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<Vec<Candle>, Back2TradeError>;
}
