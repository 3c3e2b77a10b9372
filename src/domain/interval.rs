//! Exchange kline intervals.

use crate::domain::error::Back2TradeError;
use std::fmt;
use std::str::FromStr;

const MINUTE_MS: i64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    OneHour,
    FourHours,
    OneDay,
}

impl Interval {
    pub const ALL: [Interval; 6] = [
        Interval::OneMinute,
        Interval::FiveMinutes,
        Interval::FifteenMinutes,
        Interval::OneHour,
        Interval::FourHours,
        Interval::OneDay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::OneHour => "1h",
            Interval::FourHours => "4h",
            Interval::OneDay => "1d",
        }
    }

    /// Candle length in milliseconds.
    pub fn millis(&self) -> i64 {
        match self {
            Interval::OneMinute => MINUTE_MS,
            Interval::FiveMinutes => 5 * MINUTE_MS,
            Interval::FifteenMinutes => 15 * MINUTE_MS,
            Interval::OneHour => 60 * MINUTE_MS,
            Interval::FourHours => 240 * MINUTE_MS,
            Interval::OneDay => 24 * 60 * MINUTE_MS,
        }
    }
}

impl FromStr for Interval {
    type Err = Back2TradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Interval::ALL
            .into_iter()
            .find(|i| i.as_str() == trimmed)
            .ok_or_else(|| Back2TradeError::UnknownInterval(s.to_string()))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
