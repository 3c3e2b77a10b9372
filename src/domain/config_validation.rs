//! Configuration validation.
//!
//! Validates all config fields before a backtest or fetch runs.

use crate::domain::error::Back2TradeError;
use crate::domain::interval::Interval;
use crate::ports::config_port::ConfigPort;
use chrono::{DateTime, NaiveDate, NaiveTime};
use std::str::FromStr;

/// Where candles are loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Csv,
    Binance,
}

impl FromStr for DataSource {
    type Err = Back2TradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(DataSource::Csv),
            "binance" => Ok(DataSource::Binance),
            other => Err(invalid(
                "data",
                "source",
                format!("unknown data source {other:?} (expected csv or binance)"),
            )),
        }
    }
}

/// Parses `YYYY-MM-DD` (midnight UTC) or RFC 3339 into unix seconds.
pub fn parse_timestamp(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN).and_utc().timestamp());
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.timestamp())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), Back2TradeError> {
    validate_symbol(config)?;
    validate_interval(config)?;
    validate_window(config, "fast_window")?;
    validate_window(config, "slow_window")?;
    validate_range(config)?;
    validate_data_source(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Back2TradeError {
    Back2TradeError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), Back2TradeError> {
    match config.get_string("backtest", "symbol") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(Back2TradeError::ConfigMissing {
            section: "backtest".to_string(),
            key: "symbol".to_string(),
        }),
    }
}

fn validate_interval(config: &dyn ConfigPort) -> Result<(), Back2TradeError> {
    if let Some(s) = config.get_string("backtest", "interval") {
        Interval::from_str(&s).map_err(|e| invalid("backtest", "interval", e.to_string()))?;
    }
    Ok(())
}

fn validate_window(config: &dyn ConfigPort, key: &str) -> Result<(), Back2TradeError> {
    let Some(raw) = config.get_string("backtest", key) else {
        return Ok(());
    };
    match raw.trim().parse::<i64>() {
        Ok(n) if n >= 1 => Ok(()),
        Ok(_) => Err(invalid("backtest", key, format!("{key} must be at least 1"))),
        Err(_) => Err(invalid("backtest", key, format!("{key} must be an integer"))),
    }
}

/// `start` must precede `end` when both are set.
pub fn validate_range(config: &dyn ConfigPort) -> Result<(), Back2TradeError> {
    let start = parse_optional_time(config, "start")?;
    let end = parse_optional_time(config, "end")?;

    match (start, end) {
        (Some(start), Some(end)) if start >= end => {
            Err(invalid("backtest", "start", "start must be before end"))
        }
        _ => Ok(()),
    }
}

fn parse_optional_time(config: &dyn ConfigPort, key: &str) -> Result<Option<i64>, Back2TradeError> {
    match config.get_string("backtest", key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_timestamp(&s).map(Some).ok_or_else(|| {
            invalid(
                "backtest",
                key,
                format!("invalid {key} format, expected YYYY-MM-DD or RFC 3339"),
            )
        }),
    }
}

fn validate_data_source(config: &dyn ConfigPort) -> Result<(), Back2TradeError> {
    let source = match config.get_string("data", "source") {
        Some(s) => DataSource::from_str(&s)?,
        None => DataSource::Csv,
    };

    if source == DataSource::Csv {
        match config.get_string("data", "csv_dir") {
            Some(s) if !s.trim().is_empty() => {}
            _ => {
                return Err(Back2TradeError::ConfigMissing {
                    section: "data".to_string(),
                    key: "csv_dir".to_string(),
                })
            }
        }
    }

    if config.get_double("data", "timeout_secs", 30.0) <= 0.0 {
        return Err(invalid("data", "timeout_secs", "timeout_secs must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    const DATA: &str = "[data]\nsource = csv\ncsv_dir = ./data\n";

    #[test]
    fn valid_backtest_config_passes() {
        let config = make_config(
            r#"
[backtest]
symbol = BTCUSDT
interval = 1h
fast_window = 20
slow_window = 50
start = 2023-09-11
end = 2023-09-14T23:59:59Z

[data]
source = csv
csv_dir = ./data
"#,
        );
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = make_config(&format!("[backtest]\nsymbol = ETHUSDT\n{DATA}"));
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn missing_symbol_fails() {
        let config = make_config(&format!("[backtest]\ninterval = 1h\n{DATA}"));
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, Back2TradeError::ConfigMissing { key, .. } if key == "symbol"));
    }

    #[test]
    fn unknown_interval_fails() {
        let config = make_config(&format!("[backtest]\nsymbol = BTCUSDT\ninterval = 3h\n{DATA}"));
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, Back2TradeError::ConfigInvalid { key, .. } if key == "interval"));
    }

    #[test]
    fn zero_window_fails() {
        let config = make_config(&format!("[backtest]\nsymbol = BTCUSDT\nfast_window = 0\n{DATA}"));
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, Back2TradeError::ConfigInvalid { key, .. } if key == "fast_window"));
    }

    #[test]
    fn non_numeric_window_fails() {
        let config =
            make_config(&format!("[backtest]\nsymbol = BTCUSDT\nslow_window = fifty\n{DATA}"));
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, Back2TradeError::ConfigInvalid { key, .. } if key == "slow_window"));
    }

    #[test]
    fn start_after_end_fails() {
        let config = make_config(&format!(
            "[backtest]\nsymbol = BTCUSDT\nstart = 2023-09-14\nend = 2023-09-11\n{DATA}"
        ));
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, Back2TradeError::ConfigInvalid { key, .. } if key == "start"));
    }

    #[test]
    fn validate_range_alone_rejects_equal_bounds() {
        let config = make_config("[backtest]\nstart = 2023-09-11\nend = 2023-09-11T00:00:00Z\n");
        let err = validate_range(&config).unwrap_err();
        assert!(matches!(err, Back2TradeError::ConfigInvalid { key, .. } if key == "start"));
        assert!(validate_range(&make_config("[backtest]\nend = 2023-09-11\n")).is_ok());
    }

    #[test]
    fn invalid_end_format_fails() {
        let config =
            make_config(&format!("[backtest]\nsymbol = BTCUSDT\nend = 14/09/2023\n{DATA}"));
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, Back2TradeError::ConfigInvalid { key, .. } if key == "end"));
    }

    #[test]
    fn unknown_source_fails() {
        let config = make_config("[backtest]\nsymbol = BTCUSDT\n[data]\nsource = kraken\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, Back2TradeError::ConfigInvalid { key, .. } if key == "source"));
    }

    #[test]
    fn csv_source_requires_dir() {
        let config = make_config("[backtest]\nsymbol = BTCUSDT\n[data]\nsource = csv\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, Back2TradeError::ConfigMissing { key, .. } if key == "csv_dir"));
    }

    #[test]
    fn binance_source_needs_no_dir() {
        let config = make_config("[backtest]\nsymbol = BTCUSDT\n[data]\nsource = binance\n");
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn non_positive_timeout_fails() {
        let config = make_config(
            "[backtest]\nsymbol = BTCUSDT\n[data]\nsource = binance\ntimeout_secs = 0\n",
        );
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, Back2TradeError::ConfigInvalid { key, .. } if key == "timeout_secs"));
    }

    #[test]
    fn parse_timestamp_date_is_midnight_utc() {
        assert_eq!(parse_timestamp("2023-09-11"), Some(1_694_390_400));
    }

    #[test]
    fn parse_timestamp_rfc3339() {
        assert_eq!(parse_timestamp("2023-09-11T01:00:00Z"), Some(1_694_394_000));
        assert_eq!(parse_timestamp("2023-09-11T03:00:00+02:00"), Some(1_694_394_000));
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
