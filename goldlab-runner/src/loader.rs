//! Candle loading with the last-valid-sequence fallback.
//!
//! Fallback policy:
//! 1. Feed available and online → fetch, validate, store, use
//! 2. Feed failed or offline → serve the stored sequence
//! 3. Nothing stored and `synthetic` → generate synthetic candles (tagged)
//! 4. Otherwise → fail with a clear error
//!
//! A feed failure is "no new data", never a pipeline failure on its own.

use chrono::NaiveDate;
use goldlab_core::data::{generate_gold_candles, CandleFeed, CandleStore, DataError};
use goldlab_core::domain::{validate_series, Candle};
use goldlab_core::fingerprint::dataset_hash;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(
        "no stored candles for '{symbol}' and no network access (use --synthetic for synthetic data)"
    )]
    NoStoredDataOffline { symbol: String },

    #[error("no stored candles for '{symbol}' and fetch failed: {reason}")]
    FetchFailed { symbol: String, reason: String },

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

/// Where a loaded sequence came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum CandleSource {
    /// Fresh from the named feed.
    Feed(String),
    /// Last valid sequence from the candle store.
    Store,
    Synthetic,
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub symbol: String,
    pub interval: String,
    pub lookback: usize,
    /// Never call the feed.
    pub offline: bool,
    /// Generate synthetic candles when nothing else is available.
    pub synthetic: bool,
    /// Synthetic candles end on or before this date.
    pub synthetic_end: NaiveDate,
    pub seed: u64,
}

#[derive(Debug, Clone)]
pub struct LoadedCandles {
    pub candles: Vec<Candle>,
    pub source: CandleSource,
    /// BLAKE3 over dates and prices.
    pub dataset_hash: String,
}

impl LoadedCandles {
    fn new(candles: Vec<Candle>, source: CandleSource) -> Self {
        let dataset_hash = dataset_hash(&candles);
        Self {
            candles,
            source,
            dataset_hash,
        }
    }
}

pub fn load_candles(
    feed: Option<&dyn CandleFeed>,
    store: &CandleStore,
    opts: &LoadOptions,
) -> Result<LoadedCandles, LoadError> {
    let mut fetch_failure: Option<String> = None;

    // Step 1: feed
    if !opts.offline {
        if let Some(feed) = feed.filter(|f| f.is_available()) {
            match fetch_valid(feed, opts) {
                Ok(candles) => {
                    if let Err(e) = store.write(&opts.symbol, &opts.interval, feed.name(), &candles)
                    {
                        tracing::warn!(error = %e, "failed to store fetched candles");
                    }
                    tracing::info!(feed = feed.name(), count = candles.len(), "fetched candles");
                    return Ok(LoadedCandles::new(
                        candles,
                        CandleSource::Feed(feed.name().to_string()),
                    ));
                }
                Err(e) => {
                    tracing::warn!(
                        feed = feed.name(),
                        error = %e,
                        "candle feed failed, falling back to stored candles"
                    );
                    fetch_failure = Some(e.to_string());
                }
            }
        }
    }

    // Step 2: last valid stored sequence
    match store.load(&opts.symbol, &opts.interval) {
        Ok(mut candles) => {
            if candles.len() > opts.lookback {
                candles.drain(..candles.len() - opts.lookback);
            }
            tracing::info!(count = candles.len(), "using stored candles");
            return Ok(LoadedCandles::new(candles, CandleSource::Store));
        }
        Err(DataError::NoStoredData { .. }) => {}
        Err(e) => return Err(e.into()),
    }

    // Step 3: synthetic
    if opts.synthetic {
        tracing::warn!(
            symbol = %opts.symbol,
            "generating synthetic candles, results are tagged as synthetic"
        );
        let candles = generate_gold_candles(opts.lookback, opts.synthetic_end, opts.seed);
        return Ok(LoadedCandles::new(candles, CandleSource::Synthetic));
    }

    // Step 4: fail
    let symbol = opts.symbol.clone();
    match fetch_failure {
        Some(reason) => Err(LoadError::FetchFailed { symbol, reason }),
        None if opts.offline || feed.is_none() => Err(LoadError::NoStoredDataOffline { symbol }),
        None => Err(LoadError::FetchFailed {
            symbol,
            reason: "feed unavailable".into(),
        }),
    }
}

fn fetch_valid(feed: &dyn CandleFeed, opts: &LoadOptions) -> Result<Vec<Candle>, DataError> {
    let candles = feed.fetch(&opts.interval, opts.lookback)?;
    if candles.is_empty() {
        return Err(DataError::ResponseFormatChanged("feed returned no candles".into()));
    }
    validate_series(&candles).map_err(|e| DataError::ValidationError(e.to_string()))?;
    Ok(candles)
}
