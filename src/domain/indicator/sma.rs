//! Simple Moving Average.
//!
//! SMA(n)[i] = (P[i-n+1] + ... + P[i]) / n
//! Warmup: first (n-1) values are undefined. n == 0 or n > len leaves every
//! value undefined.

use crate::domain::indicator::MovingAverageSeries;

pub fn calculate_sma(closes: &[f64], window: usize) -> MovingAverageSeries {
    let divisor = window as f64;
    let values = (0..closes.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                None
            } else {
                // Each window is summed from scratch; no running total.
                let sum: f64 = closes[i + 1 - window..=i].iter().sum();
                Some(sum / divisor)
            }
        })
        .collect();

    MovingAverageSeries { window, values }
}
