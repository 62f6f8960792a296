//! GoldLab Runner: pipeline orchestration over `goldlab-core`.
//!
//! This crate provides:
//! - TOML configuration with validated defaults
//! - A TTL-keyed stage cache behind the `StageCache` interface
//! - Candle loading with feed/store/synthetic fallback
//! - The single-flight pipeline: news ∥ patterns → strategies → evaluation
//! - Text summaries and artifact export

pub mod cache;
pub mod config;
pub mod export;
pub mod loader;
pub mod pipeline;
pub mod summary;

pub use cache::{CacheError, FileStageCache, MemoryStageCache, StageCache};
pub use config::{ConfigError, PipelineConfig};
pub use loader::{load_candles, CandleSource, LoadError, LoadOptions, LoadedCandles};
pub use pipeline::{
    MarketSnapshot, Pipeline, PipelineError, PipelineOutcome, PipelineStatus, Stage, StageState,
};
pub use summary::summarize;
