//! Technical indicator series.
//!
//! A [`MovingAverageSeries`] is aligned index-for-index with the candle
//! sequence it was computed from; warm-up positions hold `None`.

pub mod sma;

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct MovingAverageSeries {
    pub window: usize,
    pub values: Vec<Option<f64>>,
}

impl MovingAverageSeries {
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for MovingAverageSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SMA({})", self.window)
    }
}
