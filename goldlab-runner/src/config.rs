//! Serializable pipeline configuration.
//!
//! Every field has a default, so an empty TOML file is a valid config.

use goldlab_core::{EvaluationWindow, EvaluatorConfig, TradeSynthesis};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Full configuration for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub market: MarketConfig,
    pub news: NewsConfig,
    pub backtest: BacktestConfig,
    pub cache: CacheConfig,
    pub api: ApiConfig,
}

/// Which candles to request and how detections are labelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Feed symbol, e.g. "XAU/USD".
    pub symbol: String,
    /// Feed interval, e.g. "1day".
    pub interval: String,
    /// Number of candles requested from the feed.
    pub lookback: usize,
    /// Timeframe label attached to detections and strategies.
    pub timeframe: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            symbol: "XAU/USD".into(),
            interval: "1day".into(),
            lookback: 60,
            timeframe: "1D".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub query: String,
    pub count: usize,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            query: "gold XAUUSD".into(),
            count: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Evaluation window in candles; 0 evaluates the entire series.
    pub window: usize,
    pub initial_balance: f64,
    pub synthesis: TradeSynthesis,
    pub seed: u64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        let evaluator = EvaluatorConfig::default();
        Self {
            window: 10,
            initial_balance: evaluator.initial_balance,
            synthesis: evaluator.synthesis,
            seed: evaluator.seed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Root directory for the stage cache and the candle store.
    pub dir: PathBuf,
    /// Stage-result time-to-live in seconds.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".goldlab/cache"),
            ttl_secs: 300,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.ttl_secs)
    }

    /// Directory of the stage cache.
    pub fn stages_dir(&self) -> PathBuf {
        self.dir.join("stages")
    }

    /// Directory of the last-valid candle store.
    pub fn candles_dir(&self) -> PathBuf {
        self.dir.join("candles")
    }
}

/// Names of the environment variables holding API keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub twelvedata_key_env: String,
    pub serper_key_env: String,
    pub twinword_key_env: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            twelvedata_key_env: "TWELVEDATA_API_KEY".into(),
            serper_key_env: "SERPER_API_KEY".into(),
            twinword_key_env: "TWINWORD_API_KEY".into(),
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.market.lookback == 0 {
            return Err(ConfigError::Invalid("market.lookback must be at least 1".into()));
        }
        if self.news.count == 0 {
            return Err(ConfigError::Invalid("news.count must be at least 1".into()));
        }
        let balance = self.backtest.initial_balance;
        if !balance.is_finite() || balance <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "backtest.initial_balance must be positive, got {balance}"
            )));
        }
        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::Invalid("cache.ttl_secs must be at least 1".into()));
        }
        Ok(())
    }

    pub fn evaluator_config(&self) -> EvaluatorConfig {
        let window = match self.backtest.window {
            0 => EvaluationWindow::Full,
            n => EvaluationWindow::FirstN(n),
        };
        EvaluatorConfig {
            window,
            initial_balance: self.backtest.initial_balance,
            synthesis: self.backtest.synthesis,
            seed: self.backtest.seed,
        }
    }
}
