//! Entry/exit signals emitted by the backtest scan, for display.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    LongEntry,
    LongExit,
    ShortEntry,
    ShortExit,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::LongEntry => "long_entry",
            SignalKind::LongExit => "long_exit",
            SignalKind::ShortEntry => "short_entry",
            SignalKind::ShortExit => "short_exit",
        }
    }

    pub fn is_entry(&self) -> bool {
        matches!(self, SignalKind::LongEntry | SignalKind::ShortEntry)
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signal {
    pub kind: SignalKind,
    pub index: usize,
    pub time: i64,
    pub price: f64,
}
