//! Performance metrics over realized trades.
//!
//! Everything here is derived from the trade list alone and recomputed in
//! full on every run.

use super::position::Trade;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics {
    pub trade_count: usize,
    /// Compounded return over all trades, minus one.
    pub pnl: f64,
    pub win_rate: f64,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    pub largest_win: f64,
    pub largest_loss: f64,
}

impl Metrics {
    pub fn compute(trades: &[Trade]) -> Self {
        let mut growth = 1.0_f64;
        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut trades_breakeven = 0usize;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;

        for trade in trades {
            let r = trade.return_fraction;
            growth *= 1.0 + r;
            if trade.is_win() {
                trades_won += 1;
                largest_win = largest_win.max(r);
            } else if r < 0.0 {
                trades_lost += 1;
                largest_loss = largest_loss.max(r.abs());
            } else {
                trades_breakeven += 1;
            }
        }

        let trade_count = trades.len();
        let win_rate = if trade_count > 0 {
            trades_won as f64 / trade_count as f64
        } else {
            0.0
        };

        Metrics {
            trade_count,
            pnl: growth - 1.0,
            win_rate,
            trades_won,
            trades_lost,
            trades_breakeven,
            largest_win,
            largest_loss,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::{Fill, Side, Trade};

    fn make_trade(side: Side, entry: f64, exit: f64) -> Trade {
        Trade::new(
            side,
            Fill {
                index: 0,
                time: 0,
                price: entry,
            },
            Fill {
                index: 1,
                time: 60,
                price: exit,
            },
        )
    }

    #[test]
    fn metrics_no_trades() {
        let metrics = Metrics::compute(&[]);
        assert_eq!(metrics.trade_count, 0);
        assert_eq!(metrics.pnl, 0.0);
        assert_eq!(metrics.win_rate, 0.0);
        assert_eq!(metrics, Metrics::default());
    }

    #[test]
    fn metrics_pnl_compounds() {
        // 1.1 * 0.9 - 1 = -0.01
        let trades = vec![
            make_trade(Side::Long, 100.0, 110.0),
            make_trade(Side::Long, 100.0, 90.0),
        ];
        let metrics = Metrics::compute(&trades);
        assert!((metrics.pnl - (-0.01)).abs() < 1e-12);
        assert_eq!(metrics.trade_count, 2);
    }

    #[test]
    fn metrics_short_trade_contributes_inverse_return() {
        // 100 -> 80 short: 100/80 - 1 = 0.25
        let metrics = Metrics::compute(&[make_trade(Side::Short, 100.0, 80.0)]);
        assert!((metrics.pnl - 0.25).abs() < 1e-12);
        assert_eq!(metrics.win_rate, 1.0);
    }

    #[test]
    fn metrics_win_loss_breakeven() {
        let trades = vec![
            make_trade(Side::Long, 100.0, 120.0),
            make_trade(Side::Short, 100.0, 105.0),
            make_trade(Side::Long, 100.0, 100.0),
            make_trade(Side::Short, 100.0, 50.0),
        ];
        let metrics = Metrics::compute(&trades);

        assert_eq!(metrics.trades_won, 2);
        assert_eq!(metrics.trades_lost, 1);
        assert_eq!(metrics.trades_breakeven, 1);
        assert!((metrics.win_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn metrics_breakeven_is_not_a_win() {
        let metrics = Metrics::compute(&[make_trade(Side::Long, 10.0, 10.0)]);
        assert_eq!(metrics.win_rate, 0.0);
        assert_eq!(metrics.pnl, 0.0);
    }

    #[test]
    fn metrics_largest_win_and_loss() {
        let trades = vec![
            make_trade(Side::Long, 100.0, 130.0),
            make_trade(Side::Long, 100.0, 110.0),
            make_trade(Side::Long, 100.0, 95.0),
            make_trade(Side::Long, 100.0, 80.0),
        ];
        let metrics = Metrics::compute(&trades);

        assert!((metrics.largest_win - 0.3).abs() < 1e-12);
        assert!((metrics.largest_loss - 0.2).abs() < 1e-12);
    }
}
