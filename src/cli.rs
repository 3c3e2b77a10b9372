//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::override_config_adapter::OverrideConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::candle::Candle;
use crate::domain::config_validation::{
    parse_timestamp, validate_backtest_config, validate_range, DataSource,
};
use crate::domain::error::Back2TradeError;
use crate::domain::interval::Interval;
use crate::domain::position::Position;
use crate::ports::candle_port::CandleSource;
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_INTERVAL: Interval = Interval::OneHour;
pub const DEFAULT_FAST_WINDOW: i64 = 20;
pub const DEFAULT_SLOW_WINDOW: i64 = 50;

#[derive(Parser, Debug)]
#[command(name = "back2trade", about = "SMA crossover backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        interval: Option<String>,
        /// Fast SMA window
        #[arg(long)]
        fast: Option<usize>,
        /// Slow SMA window
        #[arg(long)]
        slow: Option<usize>,
        /// YYYY-MM-DD or RFC 3339
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        /// Trades CSV; signals are written next to it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Download candles from Binance into a CSV directory
    Fetch {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        interval: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Backtest parameters given on the command line. Each one replaces the
/// matching `[backtest]` key.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub symbol: Option<String>,
    pub interval: Option<String>,
    pub fast: Option<usize>,
    pub slow: Option<usize>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl Overrides {
    pub fn apply<'a>(&self, base: &'a dyn ConfigPort) -> OverrideConfigAdapter<'a> {
        OverrideConfigAdapter::new(base)
            .with("backtest", "symbol", self.symbol.as_ref())
            .with("backtest", "interval", self.interval.as_ref())
            .with("backtest", "fast_window", self.fast)
            .with("backtest", "slow_window", self.slow)
            .with("backtest", "start", self.start.as_ref())
            .with("backtest", "end", self.end.as_ref())
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` wins over the `info`
/// default. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            symbol,
            interval,
            fast,
            slow,
            start,
            end,
            output,
        } => {
            let overrides = Overrides {
                symbol,
                interval,
                fast,
                slow,
                start,
                end,
            };
            run_backtest(&config, &overrides, output.as_deref())
        }
        Command::Fetch {
            config,
            symbol,
            interval,
            start,
            end,
            output,
        } => {
            let overrides = Overrides {
                symbol,
                interval,
                start,
                end,
                ..Overrides::default()
            };
            run_fetch(&config, &overrides, &output)
        }
        Command::Validate { config } => run_validate(&config),
    }
}

fn report_error(e: &Back2TradeError) -> ExitCode {
    eprintln!("error: {e}");
    e.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, Back2TradeError> {
    FileConfigAdapter::from_file(path).map_err(|e| Back2TradeError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, Back2TradeError> {
    let symbol = config
        .get_string("backtest", "symbol")
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Back2TradeError::ConfigMissing {
            section: "backtest".into(),
            key: "symbol".into(),
        })?;

    let interval = match config.get_string("backtest", "interval") {
        Some(s) => Interval::from_str(&s)?,
        None => DEFAULT_INTERVAL,
    };

    let fast_window = window(config, "fast_window", DEFAULT_FAST_WINDOW)?;
    let slow_window = window(config, "slow_window", DEFAULT_SLOW_WINDOW)?;
    if fast_window >= slow_window {
        tracing::warn!(
            fast_window,
            slow_window,
            "fast window is not shorter than slow window"
        );
    }

    Ok(BacktestConfig {
        symbol,
        interval,
        fast_window,
        slow_window,
        start: timestamp(config, "start")?,
        end: timestamp(config, "end")?,
    })
}

fn window(config: &dyn ConfigPort, key: &str, default: i64) -> Result<usize, Back2TradeError> {
    let value = config.get_int("backtest", key, default);
    usize::try_from(value)
        .ok()
        .filter(|&n| n >= 1)
        .ok_or_else(|| Back2TradeError::ConfigInvalid {
            section: "backtest".into(),
            key: key.into(),
            reason: format!("{key} must be at least 1"),
        })
}

fn timestamp(config: &dyn ConfigPort, key: &str) -> Result<Option<i64>, Back2TradeError> {
    match config.get_string("backtest", key) {
        Some(s) if !s.trim().is_empty() => parse_timestamp(&s).map(Some).ok_or_else(|| {
            Back2TradeError::ConfigInvalid {
                section: "backtest".into(),
                key: key.into(),
                reason: "invalid date format (expected YYYY-MM-DD or RFC 3339)".into(),
            }
        }),
        _ => Ok(None),
    }
}

pub fn data_source(config: &dyn ConfigPort) -> Result<DataSource, Back2TradeError> {
    match config.get_string("data", "source") {
        Some(s) => DataSource::from_str(&s),
        None => Ok(DataSource::Csv),
    }
}

/// Builds the candle source named by `[data] source`.
pub fn build_candle_source(
    config: &dyn ConfigPort,
) -> Result<Box<dyn CandleSource>, Back2TradeError> {
    match data_source(config)? {
        DataSource::Csv => {
            let dir = config
                .get_string("data", "csv_dir")
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| Back2TradeError::ConfigMissing {
                    section: "data".into(),
                    key: "csv_dir".into(),
                })?;
            Ok(Box::new(CsvAdapter::new(PathBuf::from(dir))))
        }
        #[cfg(feature = "binance")]
        DataSource::Binance => {
            use crate::adapters::binance_adapter::BinanceAdapter;
            Ok(Box::new(BinanceAdapter::from_config(config)?))
        }
        #[cfg(not(feature = "binance"))]
        DataSource::Binance => Err(Back2TradeError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: "binance feature is required for the binance source".into(),
        }),
    }
}

fn run_backtest(config_path: &Path, overrides: &Overrides, output_path: Option<&Path>) -> ExitCode {
    // Stage 1: Load config and layer command-line values over it
    eprintln!("Loading config from {}", config_path.display());
    let file_config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return report_error(&e),
    };
    let config = overrides.apply(&file_config);

    // Stage 2: Validate and resolve run parameters
    if let Err(e) = validate_backtest_config(&config) {
        return report_error(&e);
    }
    let bt_config = match build_backtest_config(&config) {
        Ok(c) => c,
        Err(e) => return report_error(&e),
    };

    // Stage 3: Candle source
    let source = match build_candle_source(&config) {
        Ok(s) => s,
        Err(e) => return report_error(&e),
    };

    let output = output_path
        .map(Path::to_path_buf)
        .or_else(|| config.get_string("report", "output").map(PathBuf::from));

    // Stages 4-6: Fetch, run, report
    match run_backtest_pipeline(source.as_ref(), &bt_config, output.as_deref()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => report_error(&e),
    }
}

/// Fetches candles, runs the engine, prints the summary and writes the CSV
/// report when `output_path` is set.
pub fn run_backtest_pipeline(
    source: &dyn CandleSource,
    bt_config: &BacktestConfig,
    output_path: Option<&Path>,
) -> Result<BacktestResult, Back2TradeError> {
    let candles = source.fetch_candles(
        &bt_config.symbol,
        bt_config.interval,
        bt_config.start,
        bt_config.end,
    )?;
    if candles.is_empty() {
        return Err(Back2TradeError::NoData {
            symbol: bt_config.symbol.clone(),
            interval: bt_config.interval.to_string(),
        });
    }

    eprintln!(
        "Running backtest: {} {}, {} candles, SMA {} / {}",
        bt_config.symbol,
        bt_config.interval,
        candles.len(),
        bt_config.fast_window,
        bt_config.slow_window,
    );

    let result =
        backtest_engine::run_backtest(&candles, bt_config.fast_window, bt_config.slow_window)?;

    eprint!("{}", format_summary(&candles, &result));

    if let Some(output) = output_path {
        CsvReportAdapter::new().write(&result, bt_config, &output.to_string_lossy())?;
        eprintln!("\nReport written to: {}", output.display());
    }

    Ok(result)
}

/// Console summary of a finished run.
pub fn format_summary(candles: &[Candle], result: &BacktestResult) -> String {
    let metrics = &result.metrics;
    let mut out = String::from("\n=== Backtest Results ===\n");
    out.push_str(&format!("Total Trades:     {}\n", metrics.trade_count));
    out.push_str(&format!(
        "Won / Lost / BE:  {} / {} / {}\n",
        metrics.trades_won, metrics.trades_lost, metrics.trades_breakeven
    ));
    out.push_str(&format!("Win Rate:         {:.1}%\n", metrics.win_rate * 100.0));
    out.push_str(&format!("PnL:              {:.2}%\n", metrics.pnl * 100.0));
    out.push_str(&format!("Largest Win:      {:.2}%\n", metrics.largest_win * 100.0));
    out.push_str(&format!("Largest Loss:     -{:.2}%\n", metrics.largest_loss * 100.0));
    out.push_str(&format!("Signals:          {}\n", result.signals.len()));

    match (result.open_position, candles.last()) {
        (Position::Flat, _) | (_, None) => out.push_str("Open Position:    none\n"),
        (position, Some(last)) => {
            let side = position.side().map(|s| s.to_string()).unwrap_or_default();
            let entry = position.entry().map(|f| f.price).unwrap_or_default();
            let unrealized = position.unrealized_return(last.close).unwrap_or_default();
            out.push_str(&format!(
                "Open Position:    {side} @ {entry} ({:+.2}% unrealized)\n",
                unrealized * 100.0
            ));
        }
    }
    out
}

fn run_fetch(config_path: &Path, overrides: &Overrides, output_dir: &Path) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let file_config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return report_error(&e),
    };
    let config = overrides.apply(&file_config);

    if let Err(e) = validate_range(&config) {
        return report_error(&e);
    }
    let bt_config = match build_backtest_config(&config) {
        Ok(c) => c,
        Err(e) => return report_error(&e),
    };

    #[cfg(feature = "binance")]
    {
        use crate::adapters::binance_adapter::BinanceAdapter;

        let source = match BinanceAdapter::from_config(&config) {
            Ok(s) => s,
            Err(e) => return report_error(&e),
        };

        match fetch_to_csv(&source, &bt_config, output_dir) {
            Ok(path) => {
                eprintln!("Candles written to: {}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => report_error(&e),
        }
    }

    #[cfg(not(feature = "binance"))]
    {
        let _ = (bt_config, output_dir);
        eprintln!("error: binance feature is required for fetch");
        ExitCode::from(1)
    }
}

/// Downloads the configured range from `source` and caches it as
/// `<dir>/<SYMBOL>_<interval>.csv`.
pub fn fetch_to_csv(
    source: &dyn CandleSource,
    bt_config: &BacktestConfig,
    output_dir: &Path,
) -> Result<PathBuf, Back2TradeError> {
    let candles = source.fetch_candles(
        &bt_config.symbol,
        bt_config.interval,
        bt_config.start,
        bt_config.end,
    )?;
    if candles.is_empty() {
        return Err(Back2TradeError::NoData {
            symbol: bt_config.symbol.clone(),
            interval: bt_config.interval.to_string(),
        });
    }
    tracing::info!(symbol = %bt_config.symbol, candles = candles.len(), "fetched candles");

    CsvAdapter::new(output_dir.to_path_buf()).save(&bt_config.symbol, bt_config.interval, &candles)
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return report_error(&e),
    };

    if let Err(e) = validate_backtest_config(&config) {
        return report_error(&e);
    }
    let bt_config = match build_backtest_config(&config) {
        Ok(c) => c,
        Err(e) => return report_error(&e),
    };
    let source = match data_source(&config) {
        Ok(s) => s,
        Err(e) => return report_error(&e),
    };

    eprintln!("\nRun parameters:");
    eprintln!("  symbol:   {}", bt_config.symbol);
    eprintln!("  interval: {}", bt_config.interval);
    eprintln!("  fast SMA: {}", bt_config.fast_window);
    eprintln!("  slow SMA: {}", bt_config.slow_window);
    eprintln!("  start:    {}", describe_time(bt_config.start));
    eprintln!("  end:      {}", describe_time(bt_config.end));
    eprintln!("  source:   {:?}", source);

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn describe_time(secs: Option<i64>) -> String {
    secs.and_then(|s| chrono::DateTime::from_timestamp(s, 0))
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| "open".to_string())
}
