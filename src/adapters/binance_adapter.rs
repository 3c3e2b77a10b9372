//! Binance REST candle adapter.
//!
//! Fetches klines from `/api/v3/klines`, at most [`PAGE_LIMIT`] per request.
//! Without a start bound a single page of the most recent candles is
//! returned; with one, pages are requested forward from the start until the
//! end bound is passed or the exchange has nothing more.
//!
//! There is no retry policy here. A failed request surfaces as
//! `Back2TradeError::Fetch` and the caller decides what to do.

use crate::domain::candle::{merge_candles, Candle};
use crate::domain::error::Back2TradeError;
use crate::domain::interval::Interval;
use crate::ports::candle_port::CandleSource;
use crate::ports::config_port::ConfigPort;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";
pub const PAGE_LIMIT: usize = 500;

/// Error body returned by the exchange on 4xx responses.
#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    msg: String,
}

pub struct BinanceAdapter {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl BinanceAdapter {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, Back2TradeError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Back2TradeError::Fetch {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, Back2TradeError> {
        let base_url = config
            .get_string("data", "binance_url")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout = Duration::try_from_secs_f64(config.get_double("data", "timeout_secs", 30.0))
            .unwrap_or(Duration::from_secs(30));
        Self::new(&base_url, timeout)
    }

    fn fetch_page(
        &self,
        symbol: &str,
        interval: Interval,
        start_ms: Option<i64>,
        end_ms: Option<i64>,
    ) -> Result<Vec<Candle>, Back2TradeError> {
        let url = klines_url(&self.base_url, symbol, interval, start_ms, end_ms);
        tracing::debug!(%url, "requesting klines");

        let response = self.client.get(&url).send().map_err(|e| Back2TradeError::Fetch {
            reason: format!("request to {url} failed: {e}"),
        })?;

        let status = response.status();
        let body = response.text().map_err(|e| Back2TradeError::Fetch {
            reason: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            let reason = match serde_json::from_str::<ApiError>(&body) {
                Ok(api) => format!("HTTP {status}: {} (code {})", api.msg, api.code),
                Err(_) => format!("HTTP {status}: {body}"),
            };
            return Err(Back2TradeError::Fetch { reason });
        }

        parse_klines(&body)
    }
}

pub fn klines_url(
    base_url: &str,
    symbol: &str,
    interval: Interval,
    start_ms: Option<i64>,
    end_ms: Option<i64>,
) -> String {
    let mut url = format!(
        "{}/api/v3/klines?symbol={}&interval={}&limit={}",
        base_url,
        symbol.to_uppercase(),
        interval,
        PAGE_LIMIT
    );
    if let Some(start) = start_ms {
        url.push_str(&format!("&startTime={start}"));
    }
    if let Some(end) = end_ms {
        url.push_str(&format!("&endTime={end}"));
    }
    url
}

/// Maps kline rows `[openTime, open, high, low, close, volume, ...]` to
/// candles. Open time is in milliseconds; prices arrive as decimal strings.
pub fn parse_klines(body: &str) -> Result<Vec<Candle>, Back2TradeError> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body).map_err(|e| Back2TradeError::Fetch {
        reason: format!("unexpected klines response: {e}"),
    })?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let bad = |what: &str| Back2TradeError::Fetch {
                reason: format!("kline {i}: {what}"),
            };
            if row.len() < 6 {
                return Err(bad("expected at least 6 fields"));
            }
            let open_ms = row[0].as_i64().ok_or_else(|| bad("open time is not an integer"))?;
            let num = |idx: usize, name: &str| {
                number(&row[idx]).ok_or_else(|| bad(&format!("{name} is not a number")))
            };
            Ok(Candle {
                time: open_ms.div_euclid(1000),
                open: num(1, "open")?,
                high: num(2, "high")?,
                low: num(3, "low")?,
                close: num(4, "close")?,
                volume: num(5, "volume")?,
            })
        })
        .collect()
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Walks forward from `start_ms` one page at a time. `fetch_page` receives
/// the page's start cursor in milliseconds. Stops on an empty or short page,
/// or once the cursor passes `end_ms`.
pub fn paginate<F>(
    interval: Interval,
    start_ms: i64,
    end_ms: Option<i64>,
    mut fetch_page: F,
) -> Result<Vec<Candle>, Back2TradeError>
where
    F: FnMut(i64) -> Result<Vec<Candle>, Back2TradeError>,
{
    let mut candles = Vec::new();
    let mut cursor_ms = start_ms;
    loop {
        let page = fetch_page(cursor_ms)?;
        let page_len = page.len();
        let Some(last_time) = page.last().map(|c| c.time) else {
            break;
        };
        candles = merge_candles(candles, page);
        tracing::info!(
            %interval,
            page = page_len,
            total = candles.len(),
            "fetched kline page"
        );

        if page_len < PAGE_LIMIT {
            break;
        }
        cursor_ms = last_time * 1000 + interval.millis();
        if end_ms.is_some_and(|e| cursor_ms > e) {
            break;
        }
    }
    Ok(candles)
}

impl CandleSource for BinanceAdapter {
    fn fetch_candles(
        &self,
        symbol: &str,
        interval: Interval,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<Vec<Candle>, Back2TradeError> {
        let end_ms = end.map(|e| e * 1000);

        let Some(start) = start else {
            return self.fetch_page(symbol, interval, None, end_ms);
        };

        paginate(interval, start * 1000, end_ms, |cursor_ms| {
            self.fetch_page(symbol, interval, Some(cursor_ms), end_ms)
        })
    }
}
