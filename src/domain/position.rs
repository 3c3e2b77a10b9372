//! Position state and realized trades.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Long,
    Short,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => f.write_str("long"),
            Side::Short => f.write_str("short"),
        }
    }
}

/// Where a position was opened or closed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub index: usize,
    pub time: i64,
    pub price: f64,
}

/// Open-position state held during a scan. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Position {
    #[default]
    Flat,
    Long(Fill),
    Short(Fill),
}

impl Position {
    pub fn is_flat(&self) -> bool {
        matches!(self, Position::Flat)
    }

    pub fn is_long(&self) -> bool {
        matches!(self, Position::Long(_))
    }

    pub fn is_short(&self) -> bool {
        matches!(self, Position::Short(_))
    }

    pub fn side(&self) -> Option<Side> {
        match self {
            Position::Flat => None,
            Position::Long(_) => Some(Side::Long),
            Position::Short(_) => Some(Side::Short),
        }
    }

    pub fn entry(&self) -> Option<Fill> {
        match self {
            Position::Flat => None,
            Position::Long(fill) | Position::Short(fill) => Some(*fill),
        }
    }

    /// Return the position would realize if closed at `price`.
    pub fn unrealized_return(&self, price: f64) -> Option<f64> {
        let side = self.side()?;
        let entry = self.entry()?;
        Some(return_fraction(side, entry.price, price))
    }

    /// Closes the position at `exit`. Flat positions yield no trade.
    pub fn close(self, exit: Fill) -> Option<Trade> {
        let side = self.side()?;
        let entry = self.entry()?;
        Some(Trade::new(side, entry, exit))
    }
}

/// Long: exit/entry - 1. Short: entry/exit - 1, since a short gains as the
/// price falls.
pub fn return_fraction(side: Side, entry_price: f64, exit_price: f64) -> f64 {
    match side {
        Side::Long => exit_price / entry_price - 1.0,
        Side::Short => entry_price / exit_price - 1.0,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub side: Side,
    pub entry_index: usize,
    pub entry_time: i64,
    pub entry_price: f64,
    pub exit_index: usize,
    pub exit_time: i64,
    pub exit_price: f64,
    pub return_fraction: f64,
}

impl Trade {
    pub fn new(side: Side, entry: Fill, exit: Fill) -> Self {
        Trade {
            side,
            entry_index: entry.index,
            entry_time: entry.time,
            entry_price: entry.price,
            exit_index: exit.index,
            exit_time: exit.time,
            exit_price: exit.price,
            return_fraction: return_fraction(side, entry.price, exit.price),
        }
    }

    pub fn is_win(&self) -> bool {
        self.return_fraction > 0.0
    }
}
