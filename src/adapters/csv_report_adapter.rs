//! CSV report adapter implementing ReportPort.
//!
//! Trades go to the requested output path; signals go next to it as
//! `<stem>_signals.csv`. Times are written both as unix seconds and as
//! RFC 3339 UTC so the files sort and read naturally.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat};
use serde::Serialize;

use crate::adapters::csv_adapter::csv_error;
use crate::domain::backtest::{BacktestConfig, BacktestResult};
use crate::domain::error::Back2TradeError;
use crate::ports::report_port::ReportPort;

#[derive(Serialize)]
struct TradeRow<'a> {
    symbol: &'a str,
    interval: &'a str,
    side: String,
    entry_time: i64,
    entry_at: String,
    entry_price: f64,
    exit_time: i64,
    exit_at: String,
    exit_price: f64,
    return_pct: f64,
}

#[derive(Serialize)]
struct SignalRow<'a> {
    symbol: &'a str,
    kind: &'static str,
    index: usize,
    time: i64,
    at: String,
    price: f64,
}

const TRADE_HEADER: [&str; 10] = [
    "symbol",
    "interval",
    "side",
    "entry_time",
    "entry_at",
    "entry_price",
    "exit_time",
    "exit_at",
    "exit_price",
    "return_pct",
];

const SIGNAL_HEADER: [&str; 6] = ["symbol", "kind", "index", "time", "at", "price"];

/// Writer that emits `header` up front, so a report with no rows still
/// carries its schema.
fn writer_with_header(
    path: &Path,
    header: &[&str],
) -> Result<csv::Writer<fs::File>, Back2TradeError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_error)?;
    writer.write_record(header).map_err(csv_error)?;
    Ok(writer)
}

fn format_time(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

/// `trades.csv` -> `trades_signals.csv`, in the same directory.
pub fn signals_path(output_path: &Path) -> PathBuf {
    let stem = output_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());
    output_path.with_file_name(format!("{stem}_signals.csv"))
}

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        config: &BacktestConfig,
        output_path: &str,
    ) -> Result<(), Back2TradeError> {
        let path = Path::new(output_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut trades = writer_with_header(path, &TRADE_HEADER)?;
        for trade in &result.trades {
            trades
                .serialize(TradeRow {
                    symbol: &config.symbol,
                    interval: config.interval.as_str(),
                    side: trade.side.to_string(),
                    entry_time: trade.entry_time,
                    entry_at: format_time(trade.entry_time),
                    entry_price: trade.entry_price,
                    exit_time: trade.exit_time,
                    exit_at: format_time(trade.exit_time),
                    exit_price: trade.exit_price,
                    return_pct: trade.return_fraction * 100.0,
                })
                .map_err(csv_error)?;
        }
        trades.flush()?;

        let signals_file = signals_path(path);
        let mut signals = writer_with_header(&signals_file, &SIGNAL_HEADER)?;
        for signal in &result.signals {
            signals
                .serialize(SignalRow {
                    symbol: &config.symbol,
                    kind: signal.kind.as_str(),
                    index: signal.index,
                    time: signal.time,
                    at: format_time(signal.time),
                    price: signal.price,
                })
                .map_err(csv_error)?;
        }
        signals.flush()?;

        tracing::debug!(
            trades = result.trades.len(),
            signals = result.signals.len(),
            path = %path.display(),
            "wrote CSV report"
        );
        Ok(())
    }
}
