//! CSV candle import.
//!
//! Expected header: `date,open,high,low,close[,volume]`. Rows may be in any
//! order; they are sorted ascending and validated before being returned.

use super::provider::{file_stamp, tail, CandleFeed, DataError};
use crate::domain::{sort_ascending, validate_series, Candle};
use std::path::{Path, PathBuf};

pub struct CsvCandleFeed {
    path: PathBuf,
}

impl CsvCandleFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every candle in the file.
    pub fn read_all(&self) -> Result<Vec<Candle>, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| DataError::CsvError(format!("{}: {e}", self.path.display())))?;

        let mut candles = reader
            .deserialize::<Candle>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DataError::CsvError(format!("{}: {e}", self.path.display())))?;

        sort_ascending(&mut candles);
        validate_series(&candles).map_err(|e| DataError::ValidationError(e.to_string()))?;
        Ok(candles)
    }
}

impl CandleFeed for CsvCandleFeed {
    fn name(&self) -> &str {
        "csv"
    }

    /// Path plus modification time, so a rewritten file is a different source.
    fn cache_identity(&self) -> String {
        format!("csv:{}@{}", self.path.display(), file_stamp(&self.path))
    }

    /// The interval is whatever the file holds; only `lookback` applies.
    fn fetch(&self, _interval: &str, lookback: usize) -> Result<Vec<Candle>, DataError> {
        Ok(tail(self.read_all()?, lookback))
    }
}
