//! Core domain types and logic.

pub mod candle;
pub mod interval;
pub mod indicator;
pub mod signal;
pub mod position;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;
