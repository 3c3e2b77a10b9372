//! Domain error types.

/// Top-level error type for back2trade.
#[derive(Debug, thiserror::Error)]
pub enum Back2TradeError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown interval {0:?} (expected one of 1m, 5m, 15m, 1h, 4h, 1d)")]
    UnknownInterval(String),

    #[error("invalid price data at candle {index}: {reason}")]
    InvalidPriceData { index: usize, reason: String },

    #[error("candles out of order at index {index}: time {time} does not follow {previous}")]
    UnorderedCandles {
        index: usize,
        time: i64,
        previous: i64,
    },

    #[error("fetch failed: {reason}")]
    Fetch { reason: String },

    #[error("no data for {symbol} ({interval})")]
    NoData { symbol: String, interval: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&Back2TradeError> for std::process::ExitCode {
    fn from(err: &Back2TradeError) -> Self {
        let code: u8 = match err {
            Back2TradeError::Io(_) => 1,
            Back2TradeError::ConfigParse { .. }
            | Back2TradeError::ConfigMissing { .. }
            | Back2TradeError::ConfigInvalid { .. }
            | Back2TradeError::UnknownInterval(_) => 2,
            Back2TradeError::Fetch { .. } => 3,
            Back2TradeError::InvalidPriceData { .. }
            | Back2TradeError::UnorderedCandles { .. }
            | Back2TradeError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
