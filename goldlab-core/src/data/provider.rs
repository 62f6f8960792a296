//! Candle feed trait and structured error types.
//!
//! The CandleFeed trait abstracts over price sources (Twelve Data, CSV import,
//! synthetic series) so the loader can swap implementations and tests can mock them.

use crate::domain::Candle;
use thiserror::Error;

/// Structured error types for feed and store operations.
///
/// Shared by the candle feeds, the news feeds and the sentiment scorers.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("candle store error: {0}")]
    StoreError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("csv error: {0}")]
    CsvError(String),

    #[error("no stored candles for '{symbol}'")]
    NoStoredData { symbol: String },

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// Missing API key for the named environment variable.
    pub fn missing_key(env_var: &str) -> Self {
        DataError::AuthenticationRequired(format!("environment variable {env_var} is not set"))
    }
}

/// Trait for candle feeds.
///
/// Implementations return candles sorted ascending by date. The store and
/// fallback logic sit above this trait; feeds don't know about them.
pub trait CandleFeed: Send + Sync {
    /// Human-readable name of this feed.
    fn name(&self) -> &str;

    /// Identifies where this feed's candles come from (endpoint and symbol,
    /// file path). Two feeds with the same identity serve the same data.
    fn cache_identity(&self) -> String {
        self.name().to_string()
    }

    /// Fetch the most recent `lookback` candles at `interval` (e.g. "1day", "4h").
    fn fetch(&self, interval: &str, lookback: usize) -> Result<Vec<Candle>, DataError>;

    /// Check if the feed is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool {
        true
    }
}

/// Keep only the newest `lookback` candles of an ascending series.
pub(crate) fn tail(mut candles: Vec<Candle>, lookback: usize) -> Vec<Candle> {
    if candles.len() > lookback {
        candles.drain(..candles.len() - lookback);
    }
    candles
}

/// Modification time and length of a local file, or `missing`.
pub(crate) fn file_stamp(path: &std::path::Path) -> String {
    let Ok(meta) = std::fs::metadata(path) else {
        return "missing".into();
    };
    let modified = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_nanos());
    format!("{modified}:{}", meta.len())
}
