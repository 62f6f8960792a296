//! Candle: the fundamental market data unit.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLC(V) candle for one time bucket.
///
/// `date` is kept as the feed delivered it: an ISO date (`2024-01-02`) or an
/// ISO datetime (`2024-01-02 14:00:00`, `2024-01-02T14:00:00Z`). Forex feeds
/// usually omit volume, hence the `Option`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
}

impl Candle {
    pub fn new(date: impl Into<String>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date: date.into(),
            open,
            high,
            low,
            close,
            volume: None,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Parsed timestamp of `date`. Date-only values map to midnight.
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        parse_candle_time(&self.date)
    }

    /// Returns true if any OHLC field is non-finite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}

/// Parse the date formats the feeds deliver.
pub fn parse_candle_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.naive_utc())
}

/// Precondition violations for candle sequences.
///
/// The detectors do not check these themselves; callers validate at the
/// boundary where data enters the system.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CandleError {
    #[error("candle {index} has an unparseable date '{date}'")]
    InvalidDate { index: usize, date: String },

    #[error("candle {index} ({date}) has non-finite prices")]
    NonFinite { index: usize, date: String },

    #[error("candle {index} ({date}) is earlier than the candle before it")]
    OutOfOrder { index: usize, date: String },

    #[error("candle {index} ({date}) has inconsistent prices (high/low do not bound open/close)")]
    Inconsistent { index: usize, date: String },
}

/// Check that a sequence is finite, internally consistent and monotonically
/// non-decreasing in date.
pub fn validate_series(candles: &[Candle]) -> Result<(), CandleError> {
    let mut previous: Option<NaiveDateTime> = None;
    for (index, candle) in candles.iter().enumerate() {
        let ts = candle.timestamp().ok_or_else(|| CandleError::InvalidDate {
            index,
            date: candle.date.clone(),
        })?;
        if candle.is_void() {
            return Err(CandleError::NonFinite {
                index,
                date: candle.date.clone(),
            });
        }
        if !candle.is_sane() {
            return Err(CandleError::Inconsistent {
                index,
                date: candle.date.clone(),
            });
        }
        if previous.is_some_and(|p| ts < p) {
            return Err(CandleError::OutOfOrder {
                index,
                date: candle.date.clone(),
            });
        }
        previous = Some(ts);
    }
    Ok(())
}

/// Sort candles ascending by parsed date. Unparseable dates sort first.
pub fn sort_ascending(candles: &mut [Candle]) {
    candles.sort_by_key(|c| c.timestamp());
}
