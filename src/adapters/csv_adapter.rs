//! CSV file candle adapter.
//!
//! One file per symbol and interval, `<SYMBOL>_<interval>.csv`, with the
//! header `time,open,high,low,close,volume` and `time` in unix seconds.

use crate::domain::candle::Candle;
use crate::domain::error::Back2TradeError;
use crate::domain::interval::Interval;
use crate::ports::candle_port::CandleSource;
use std::fs;
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn csv_path(&self, symbol: &str, interval: Interval) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", symbol.to_uppercase(), interval))
    }

    /// Writes candles to the file `fetch_candles` would read them from.
    pub fn save(
        &self,
        symbol: &str,
        interval: Interval,
        candles: &[Candle],
    ) -> Result<PathBuf, Back2TradeError> {
        fs::create_dir_all(&self.base_path)?;
        let path = self.csv_path(symbol, interval);
        write_candles(&path, candles)?;
        Ok(path)
    }
}

pub fn write_candles(path: &Path, candles: &[Candle]) -> Result<(), Back2TradeError> {
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    for candle in candles {
        writer.serialize(candle).map_err(csv_error)?;
    }
    writer.flush()?;
    tracing::debug!(path = %path.display(), rows = candles.len(), "wrote candles");
    Ok(())
}

/// Maps CSV write errors of every kind to `Io`.
pub(crate) fn csv_error(e: csv::Error) -> Back2TradeError {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => Back2TradeError::Io(io),
        other => Back2TradeError::Io(std::io::Error::other(format!("CSV error: {other:?}"))),
    }
}

impl CandleSource for CsvAdapter {
    fn fetch_candles(
        &self,
        symbol: &str,
        interval: Interval,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<Vec<Candle>, Back2TradeError> {
        let path = self.csv_path(symbol, interval);
        let content = fs::read_to_string(&path).map_err(|e| Back2TradeError::Fetch {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut candles = Vec::new();

        for (row, result) in rdr.deserialize::<Candle>().enumerate() {
            let candle = result.map_err(|e| Back2TradeError::Fetch {
                reason: format!("{} row {}: {}", path.display(), row + 1, e),
            })?;

            if start.is_some_and(|s| candle.time < s) || end.is_some_and(|e| candle.time > e) {
                continue;
            }
            candles.push(candle);
        }

        candles.sort_by_key(|c| c.time);
        let before = candles.len();
        candles.dedup_by_key(|c| c.time);
        if candles.len() < before {
            tracing::warn!(
                path = %path.display(),
                dropped = before - candles.len(),
                "dropped candles with duplicate times"
            );
        }

        tracing::debug!(symbol, %interval, rows = candles.len(), "loaded candles from CSV");
        Ok(candles)
    }
}
