//! Parquet store for the last valid candle sequence.
//!
//! Layout: `{store_dir}/symbol={SYMBOL}/interval={INTERVAL}/candles.parquet`
//!
//! Features:
//! - Atomic writes (write to .tmp, rename into place)
//! - Integrity validation on load (schema check, row count > 0, series order)
//! - Quarantine for corrupt files (`candles.parquet.quarantined`)
//! - Metadata sidecar (content hash, date range, source feed)

use super::provider::DataError;
use crate::domain::{validate_series, Candle};
use crate::fingerprint::dataset_hash;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const EXPECTED_COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

/// Metadata sidecar for a stored sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreMeta {
    pub symbol: String,
    pub interval: String,
    pub first_date: String,
    pub last_date: String,
    pub candle_count: usize,
    pub data_hash: String,
    pub source: String,
    pub stored_at: chrono::NaiveDateTime,
}

pub struct CandleStore {
    store_dir: PathBuf,
}

impl CandleStore {
    pub fn new(store_dir: impl Into<PathBuf>) -> Self {
        Self {
            store_dir: store_dir.into(),
        }
    }

    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    /// `/` and other path separators in symbols ("XAU/USD") become `_`.
    fn series_dir(&self, symbol: &str, interval: &str) -> PathBuf {
        let clean = |s: &str| s.replace(['/', '\\', ':'], "_");
        self.store_dir
            .join(format!("symbol={}", clean(symbol)))
            .join(format!("interval={}", clean(interval)))
    }

    fn data_path(&self, symbol: &str, interval: &str) -> PathBuf {
        self.series_dir(symbol, interval).join("candles.parquet")
    }

    fn meta_path(&self, symbol: &str, interval: &str) -> PathBuf {
        self.series_dir(symbol, interval).join("meta.json")
    }

    /// Replace the stored sequence for `(symbol, interval)`.
    pub fn write(
        &self,
        symbol: &str,
        interval: &str,
        source: &str,
        candles: &[Candle],
    ) -> Result<StoreMeta, DataError> {
        let (Some(first), Some(last)) = (candles.first(), candles.last()) else {
            return Err(DataError::StoreError("no candles to store".into()));
        };

        let dir = self.series_dir(symbol, interval);
        fs::create_dir_all(&dir)
            .map_err(|e| DataError::StoreError(format!("failed to create dir: {e}")))?;

        let mut df = candles_to_dataframe(candles)?;
        let path = self.data_path(symbol, interval);
        let tmp_path = path.with_extension("parquet.tmp");
        write_parquet(&mut df, &tmp_path)?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::StoreError(format!("atomic rename failed: {e}"))
        })?;

        let meta = StoreMeta {
            symbol: symbol.to_string(),
            interval: interval.to_string(),
            first_date: first.date.clone(),
            last_date: last.date.clone(),
            candle_count: candles.len(),
            data_hash: dataset_hash(candles),
            source: source.to_string(),
            stored_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::StoreError(format!("meta serialization: {e}")))?;
        fs::write(self.meta_path(symbol, interval), meta_json)
            .map_err(|e| DataError::StoreError(format!("meta write: {e}")))?;

        tracing::debug!(symbol, interval, count = candles.len(), "stored candles");
        Ok(meta)
    }

    /// Load the stored sequence, ascending by date.
    ///
    /// A file that fails validation is quarantined and reported as missing.
    pub fn load(&self, symbol: &str, interval: &str) -> Result<Vec<Candle>, DataError> {
        let path = self.data_path(symbol, interval);
        if !path.exists() {
            return Err(DataError::NoStoredData {
                symbol: symbol.to_string(),
            });
        }

        match load_and_validate_parquet(&path) {
            Ok(candles) => Ok(candles),
            Err(e) => {
                let quarantine = path.with_extension("parquet.quarantined");
                tracing::warn!(path = %path.display(), error = %e, "quarantining corrupt candle file");
                let _ = fs::rename(&path, &quarantine);
                Err(DataError::NoStoredData {
                    symbol: symbol.to_string(),
                })
            }
        }
    }

    /// Sidecar for `(symbol, interval)`, if a sequence is stored.
    pub fn meta(&self, symbol: &str, interval: &str) -> Option<StoreMeta> {
        let content = fs::read_to_string(self.meta_path(symbol, interval)).ok()?;
        serde_json::from_str(&content).ok()
    }
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

fn candles_to_dataframe(candles: &[Candle]) -> Result<DataFrame, DataError> {
    let dates: Vec<String> = candles.iter().map(|c| c.date.clone()).collect();
    let opens: Vec<f64> = candles.iter().map(|c| c.open).collect();
    let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let volumes: Vec<Option<f64>> = candles.iter().map(|c| c.volume).collect();

    DataFrame::new(vec![
        Column::new("date".into(), dates),
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
    ])
    .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<(), DataError> {
    let file =
        fs::File::create(path).map_err(|e| DataError::ParquetError(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(df)
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;
    Ok(())
}

fn load_and_validate_parquet(path: &Path) -> Result<Vec<Candle>, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::ParquetError(format!("open: {e}")))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read: {e}")))?;

    if df.height() == 0 {
        return Err(DataError::ValidationError("empty parquet file".into()));
    }
    for col_name in EXPECTED_COLUMNS {
        if df.column(col_name).is_err() {
            return Err(DataError::ValidationError(format!(
                "missing column '{col_name}'"
            )));
        }
    }

    let candles = dataframe_to_candles(&df)?;
    validate_series(&candles).map_err(|e| DataError::ValidationError(e.to_string()))?;
    Ok(candles)
}

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, DataError> {
    df.column(name)
        .map_err(|e| DataError::ParquetError(format!("column read: {e}")))
}

fn dataframe_to_candles(df: &DataFrame) -> Result<Vec<Candle>, DataError> {
    let type_err = |name: &str, e: PolarsError| {
        DataError::ParquetError(format!("{name} column type: {e}"))
    };

    let date_ca = column(df, "date")?.str().map_err(|e| type_err("date", e))?;
    let open_ca = column(df, "open")?.f64().map_err(|e| type_err("open", e))?;
    let high_ca = column(df, "high")?.f64().map_err(|e| type_err("high", e))?;
    let low_ca = column(df, "low")?.f64().map_err(|e| type_err("low", e))?;
    let close_ca = column(df, "close")?.f64().map_err(|e| type_err("close", e))?;
    let vol_ca = column(df, "volume")?.f64().map_err(|e| type_err("volume", e))?;

    (0..df.height())
        .map(|i| -> Result<Candle, DataError> {
            let date = date_ca
                .get(i)
                .ok_or_else(|| DataError::ParquetError(format!("null date at row {i}")))?;
            Ok(Candle {
                date: date.to_string(),
                open: open_ca.get(i).unwrap_or(f64::NAN),
                high: high_ca.get(i).unwrap_or(f64::NAN),
                low: low_ca.get(i).unwrap_or(f64::NAN),
                close: close_ca.get(i).unwrap_or(f64::NAN),
                volume: vol_ca.get(i),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_candles() -> Vec<Candle> {
        vec![
            Candle::new("2024-01-02", 2062.1, 2078.9, 2055.0, 2064.9).with_volume(1200.0),
            Candle::new("2024-01-03", 2065.0, 2070.5, 2040.2, 2042.9),
        ]
    }

    #[test]
    fn write_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CandleStore::new(dir.path());

        store.write("XAU/USD", "1day", "twelve_data", &sample_candles()).unwrap();
        let loaded = store.load("XAU/USD", "1day").unwrap();

        assert_eq!(loaded, sample_candles());
    }

    #[test]
    fn symbols_with_slashes_stay_in_one_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = CandleStore::new(dir.path());
        store.write("XAU/USD", "1day", "csv", &sample_candles()).unwrap();
        assert!(dir.path().join("symbol=XAU_USD").join("interval=1day").is_dir());
    }

    #[test]
    fn load_missing_returns_no_stored_data() {
        let dir = tempfile::tempdir().unwrap();
        let store = CandleStore::new(dir.path());
        assert!(matches!(
            store.load("XAU/USD", "1day"),
            Err(DataError::NoStoredData { .. })
        ));
    }

    #[test]
    fn meta_sidecar_records_range_and_hash() {
        let dir = tempfile::tempdir().unwrap();
        let store = CandleStore::new(dir.path());
        store.write("XAU/USD", "1day", "twelve_data", &sample_candles()).unwrap();

        let meta = store.meta("XAU/USD", "1day").unwrap();
        assert_eq!(meta.candle_count, 2);
        assert_eq!(meta.first_date, "2024-01-02");
        assert_eq!(meta.last_date, "2024-01-03");
        assert_eq!(meta.data_hash, dataset_hash(&sample_candles()));
        assert_eq!(meta.source, "twelve_data");
    }

    #[test]
    fn empty_write_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = CandleStore::new(dir.path());
        assert!(store.write("XAU/USD", "1day", "csv", &[]).is_err());
    }

    #[test]
    fn corrupt_file_is_quarantined() {
        let dir = tempfile::tempdir().unwrap();
        let store = CandleStore::new(dir.path());
        store.write("XAU/USD", "1day", "csv", &sample_candles()).unwrap();

        let path = store.data_path("XAU/USD", "1day");
        fs::write(&path, b"not parquet").unwrap();

        assert!(store.load("XAU/USD", "1day").is_err());
        assert!(!path.exists());
        assert!(path.with_extension("parquet.quarantined").exists());
    }
}
