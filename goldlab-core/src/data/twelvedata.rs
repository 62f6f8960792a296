//! Twelve Data price feed.
//!
//! Fetches candles from the `/time_series` endpoint. Values arrive as strings,
//! newest first; they are parsed and reversed into ascending order. Errors can
//! come back as HTTP 200 with `"status": "error"` in the body.

use super::circuit_breaker::CircuitBreaker;
use super::http::{build_client, key_from_env, send_with_retry, RetryPolicy};
use super::provider::{CandleFeed, DataError};
use crate::domain::Candle;
use serde::Deserialize;
use std::sync::Arc;

const BASE_URL: &str = "https://api.twelvedata.com";

/// `/time_series` response. Success and error bodies share the envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct TimeSeriesResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    values: Option<Vec<TimeSeriesValue>>,
}

#[derive(Debug, Deserialize)]
struct TimeSeriesValue {
    datetime: String,
    open: String,
    high: String,
    low: String,
    close: String,
    #[serde(default)]
    volume: Option<String>,
}

pub struct TwelveDataFeed {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
    symbol: String,
    api_key: String,
}

impl TwelveDataFeed {
    pub fn new(
        symbol: impl Into<String>,
        api_key: impl Into<String>,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, DataError> {
        Ok(Self {
            client: build_client()?,
            circuit_breaker,
            retry: RetryPolicy::default(),
            symbol: symbol.into(),
            api_key: api_key.into(),
        })
    }

    /// Read the API key from `env_var`.
    pub fn from_env(
        symbol: impl Into<String>,
        env_var: &str,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, DataError> {
        Self::new(symbol, key_from_env(env_var)?, circuit_breaker)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Parse a response body into ascending candles.
    pub(crate) fn parse_response(
        symbol: &str,
        resp: TimeSeriesResponse,
    ) -> Result<Vec<Candle>, DataError> {
        if resp.status.as_deref() == Some("error") {
            let message = resp.message.unwrap_or_else(|| "unknown error".into());
            return Err(match resp.code {
                Some(429) => DataError::RateLimited {
                    retry_after_secs: 60,
                },
                Some(401) => DataError::AuthenticationRequired(message),
                Some(404) => DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                },
                _ => DataError::ResponseFormatChanged(format!("Twelve Data error: {message}")),
            });
        }

        let values = resp
            .values
            .ok_or_else(|| DataError::ResponseFormatChanged("no values in response".into()))?;

        let mut candles = values
            .into_iter()
            .map(|v| -> Result<Candle, DataError> {
                let field = |name: &str, raw: &str| {
                    raw.trim().parse::<f64>().map_err(|_| {
                        DataError::ResponseFormatChanged(format!(
                            "unparseable {name} '{raw}' at {}",
                            v.datetime
                        ))
                    })
                };
                let mut candle = Candle::new(
                    v.datetime.clone(),
                    field("open", &v.open)?,
                    field("high", &v.high)?,
                    field("low", &v.low)?,
                    field("close", &v.close)?,
                );
                if let Some(volume) = v.volume.as_deref().and_then(|s| s.parse::<f64>().ok()) {
                    candle = candle.with_volume(volume);
                }
                Ok(candle)
            })
            .collect::<Result<Vec<_>, _>>()?;

        candles.reverse();
        Ok(candles)
    }
}

impl CandleFeed for TwelveDataFeed {
    fn name(&self) -> &str {
        "twelve_data"
    }

    fn cache_identity(&self) -> String {
        format!("{BASE_URL}/time_series?symbol={}", self.symbol)
    }

    fn fetch(&self, interval: &str, lookback: usize) -> Result<Vec<Candle>, DataError> {
        let url = format!("{BASE_URL}/time_series");
        let outputsize = lookback.to_string();
        let resp = send_with_retry("Twelve Data", &self.circuit_breaker, self.retry, || {
            self.client.get(&url).query(&[
                ("symbol", self.symbol.as_str()),
                ("interval", interval),
                ("outputsize", outputsize.as_str()),
                ("apikey", self.api_key.as_str()),
            ])
        })?;

        let body: TimeSeriesResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse Twelve Data response: {e}"))
        })?;
        let candles = Self::parse_response(&self.symbol, body)?;
        tracing::info!(
            symbol = %self.symbol,
            interval,
            count = candles.len(),
            "fetched candles"
        );
        Ok(candles)
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}
