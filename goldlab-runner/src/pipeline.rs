//! Pipeline orchestration: news ∥ patterns → strategies → evaluation.
//!
//! Each stage result is memoized in a [`StageCache`] under a content-addressed
//! key. A stage failure marks that stage as errored and halts everything
//! downstream; nothing after it runs. A second `run()` while one is in flight
//! returns [`PipelineError::AlreadyRunning`] immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use goldlab_core::data::{CandleFeed, CandleStore};
use goldlab_core::domain::{BacktestResult, Candle, PatternDetection, SentimentRecord, Strategy};
use goldlab_core::fingerprint::{fingerprint, short};
use goldlab_core::news::{fetch_scored_news, NewsFeed, SentimentScorer};
use goldlab_core::{detect_patterns, evaluate_with, generate_strategies};

use crate::cache::StageCache;
use crate::config::PipelineConfig;
use crate::loader::{load_candles, CandleSource, LoadOptions};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("pipeline is already running")]
    AlreadyRunning,

    #[error("{stage} stage failed: {message}")]
    StageFailed { stage: Stage, message: String },
}

/// The four pipeline stages, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    News,
    Patterns,
    Strategies,
    Evaluation,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::News, Stage::Patterns, Stage::Strategies, Stage::Evaluation];

    /// Cache key prefix for this stage's results.
    pub fn cache_prefix(self) -> &'static str {
        match self {
            Stage::News => "pipeline_newsAgent",
            Stage::Patterns => "pipeline_patternAgent",
            Stage::Strategies => "pipeline_strategyAgent",
            Stage::Evaluation => "pipeline_evaluationAgent",
        }
    }

    /// Prefix of the user-visible failure message.
    fn error_label(self) -> &'static str {
        match self {
            Stage::News => "News API error",
            Stage::Patterns => "Pattern API error",
            Stage::Strategies => "Strategy API error",
            Stage::Evaluation => "Evaluation API error",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::News => "news",
            Stage::Patterns => "patterns",
            Stage::Strategies => "strategies",
            Stage::Evaluation => "evaluation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "message")]
pub enum StageState {
    #[default]
    Idle,
    Running,
    Completed,
    Error(String),
}

/// Snapshot of a pipeline's progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineStatus {
    pub news: StageState,
    pub patterns: StageState,
    pub strategies: StageState,
    pub evaluation: StageState,
    /// 0 → 30 after news and patterns → 60 after strategies → 100.
    pub progress: u8,
    pub current_stage: Option<String>,
    pub last_run: Option<DateTime<Utc>>,
    pub is_running: bool,
}

impl PipelineStatus {
    pub fn stage(&self, stage: Stage) -> &StageState {
        match stage {
            Stage::News => &self.news,
            Stage::Patterns => &self.patterns,
            Stage::Strategies => &self.strategies,
            Stage::Evaluation => &self.evaluation,
        }
    }

    fn stage_mut(&mut self, stage: Stage) -> &mut StageState {
        match stage {
            Stage::News => &mut self.news,
            Stage::Patterns => &mut self.patterns,
            Stage::Strategies => &mut self.strategies,
            Stage::Evaluation => &mut self.evaluation,
        }
    }

    pub fn has_error(&self) -> bool {
        Stage::ALL
            .iter()
            .any(|s| matches!(self.stage(*s), StageState::Error(_)))
    }
}

/// Output of the patterns stage. Candles travel with the detections so a
/// cached patterns stage still feeds the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub candles: Vec<Candle>,
    pub source: CandleSource,
    pub dataset_hash: String,
    pub patterns: Vec<PatternDetection>,
}

/// Inputs that decide what the patterns stage loads.
#[derive(Serialize)]
struct PatternsSource<'a> {
    symbol: &'a str,
    interval: &'a str,
    lookback: usize,
    timeframe: &'a str,
    feed: Option<String>,
    offline: bool,
    synthetic: Option<(NaiveDate, u64)>,
}

/// Everything a completed run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub news: Vec<SentimentRecord>,
    pub market: MarketSnapshot,
    pub strategies: Vec<Strategy>,
    pub results: Vec<BacktestResult>,
    /// Stages served from the cache.
    pub cache_hits: Vec<Stage>,
    pub finished_at: DateTime<Utc>,
    pub duration_secs: f64,
}

/// Clears the in-flight flag when a run ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

type StatusCallback = Box<dyn Fn(&PipelineStatus) + Send + Sync>;

pub struct Pipeline {
    config: PipelineConfig,
    candle_feed: Option<Box<dyn CandleFeed>>,
    news_feed: Box<dyn NewsFeed>,
    scorer: Box<dyn SentimentScorer>,
    store: CandleStore,
    cache: Box<dyn StageCache>,
    offline: bool,
    synthetic: bool,
    synthetic_end: NaiveDate,
    on_status: Option<StatusCallback>,
    running: AtomicBool,
    status: Mutex<PipelineStatus>,
}

impl Pipeline {
    /// The candle store lives under `config.cache.candles_dir()`.
    pub fn new(
        config: PipelineConfig,
        candle_feed: Option<Box<dyn CandleFeed>>,
        news_feed: Box<dyn NewsFeed>,
        scorer: Box<dyn SentimentScorer>,
        cache: Box<dyn StageCache>,
    ) -> Self {
        let store = CandleStore::new(config.cache.candles_dir());
        Self {
            config,
            candle_feed,
            news_feed,
            scorer,
            store,
            cache,
            offline: false,
            synthetic: false,
            synthetic_end: Utc::now().date_naive(),
            on_status: None,
            running: AtomicBool::new(false),
            status: Mutex::new(PipelineStatus::default()),
        }
    }

    /// Never call the candle feed; use stored candles.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Fall back to synthetic candles ending at `end` when nothing else is available.
    pub fn synthetic(mut self, enabled: bool, end: NaiveDate) -> Self {
        self.synthetic = enabled;
        self.synthetic_end = end;
        self
    }

    /// Called with a status snapshot after every transition.
    pub fn on_status(mut self, callback: impl Fn(&PipelineStatus) + Send + Sync + 'static) -> Self {
        self.on_status = Some(Box::new(callback));
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &CandleStore {
        &self.store
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn status(&self) -> PipelineStatus {
        let mut status = self.lock_status().clone();
        status.is_running = self.is_running();
        status
    }

    /// Back to idle: all stages idle, no progress, no last run.
    pub fn reset(&self) -> Result<(), PipelineError> {
        if self.is_running() {
            return Err(PipelineError::AlreadyRunning);
        }
        *self.lock_status() = PipelineStatus::default();
        Ok(())
    }

    /// Drop every cached stage result.
    pub fn clear_cache(&self) -> Result<(), crate::cache::CacheError> {
        self.cache.clear()?;
        tracing::info!("stage cache cleared");
        Ok(())
    }

    /// Run all four stages.
    pub fn run(&self) -> Result<PipelineOutcome, PipelineError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("pipeline start ignored, a run is already in progress");
            return Err(PipelineError::AlreadyRunning);
        }
        let _guard = RunGuard(&self.running);
        let started = Instant::now();

        self.update(|s| {
            *s = PipelineStatus {
                progress: 0,
                current_stage: Some("Starting pipeline...".into()),
                last_run: Some(Utc::now()),
                ..PipelineStatus::default()
            };
        });

        let outcome = self.run_stages(started);
        if let Err(e) = &outcome {
            tracing::error!(error = %e, "pipeline failed");
            self.update(|s| s.current_stage = Some("Error occurred in pipeline.".into()));
        }
        outcome
    }

    fn run_stages(&self, started: Instant) -> Result<PipelineOutcome, PipelineError> {
        let mut cache_hits = Vec::new();
        match self.cache.prune(self.config.cache.ttl()) {
            Ok(0) => {}
            Ok(dropped) => tracing::debug!(dropped, "pruned expired stage results"),
            Err(e) => tracing::warn!(error = %e, "stage cache prune failed"),
        }

        self.begin(Stage::News);
        self.begin(Stage::Patterns);
        let (news, market) = rayon::join(|| self.news_stage(), || self.patterns_stage());
        let news = self.finish(Stage::News, news);
        let market = self.finish(Stage::Patterns, market);
        let ((news, news_hit), (market, market_hit)) = (news?, market?);
        cache_hits.extend(news_hit.then_some(Stage::News));
        cache_hits.extend(market_hit.then_some(Stage::Patterns));
        self.update(|s| {
            s.progress = 30;
            s.current_stage = Some("Generating strategies...".into());
        });

        self.begin(Stage::Strategies);
        let strategies = self.strategies_stage(&market.patterns, &news);
        let (strategies, hit) = self.finish(Stage::Strategies, strategies)?;
        cache_hits.extend(hit.then_some(Stage::Strategies));
        self.update(|s| {
            s.progress = 60;
            s.current_stage = Some("Backtest evaluation...".into());
        });

        self.begin(Stage::Evaluation);
        let results = self.evaluation_stage(&strategies, &market);
        let (results, hit) = self.finish(Stage::Evaluation, results)?;
        cache_hits.extend(hit.then_some(Stage::Evaluation));
        self.update(|s| {
            s.progress = 100;
            s.current_stage = Some("Pipeline complete.".into());
        });

        let duration_secs = started.elapsed().as_secs_f64();
        tracing::info!(
            news = news.len(),
            patterns = market.patterns.len(),
            strategies = strategies.len(),
            results = results.len(),
            cached = cache_hits.len(),
            duration_secs,
            "pipeline complete"
        );

        Ok(PipelineOutcome {
            news,
            market,
            strategies,
            results,
            cache_hits,
            finished_at: Utc::now(),
            duration_secs,
        })
    }

    // ── Stages ──────────────────────────────────────────────────────

    fn news_stage(&self) -> Result<(Vec<SentimentRecord>, bool), String> {
        let key = self.news_key()?;
        self.cached(&key, || {
            fetch_scored_news(self.news_feed.as_ref(), self.scorer.as_ref(), self.config.news.count)
                .map_err(|e| e.to_string())
        })
    }

    fn patterns_stage(&self) -> Result<(MarketSnapshot, bool), String> {
        let market = &self.config.market;
        let key = self.patterns_key()?;
        // Store and synthetic fallbacks are not cached; the next run retries the feed.
        let from_feed = |m: &MarketSnapshot| matches!(m.source, CandleSource::Feed(_));
        self.cached_if(&key, from_feed, || {
            let opts = LoadOptions {
                symbol: market.symbol.clone(),
                interval: market.interval.clone(),
                lookback: market.lookback,
                offline: self.offline,
                synthetic: self.synthetic,
                synthetic_end: self.synthetic_end,
                seed: self.config.backtest.seed,
            };
            let loaded = load_candles(self.candle_feed.as_deref(), &self.store, &opts)
                .map_err(|e| e.to_string())?;
            let patterns = detect_patterns(&loaded.candles, &market.timeframe);
            Ok(MarketSnapshot {
                candles: loaded.candles,
                source: loaded.source,
                dataset_hash: loaded.dataset_hash,
                patterns,
            })
        })
    }

    /// Query parameters plus the feed and scorer that answer them.
    fn news_key(&self) -> Result<String, String> {
        let params = (
            &self.config.news.query,
            self.config.news.count,
            self.news_feed.cache_identity(),
            self.scorer.name(),
        );
        stage_key(Stage::News, &params)
    }

    fn patterns_key(&self) -> Result<String, String> {
        let market = &self.config.market;
        let source = PatternsSource {
            symbol: &market.symbol,
            interval: &market.interval,
            lookback: market.lookback,
            timeframe: &market.timeframe,
            feed: self.candle_feed.as_ref().map(|f| f.cache_identity()),
            offline: self.offline,
            synthetic: self.synthetic.then_some((self.synthetic_end, self.config.backtest.seed)),
        };
        stage_key(Stage::Patterns, &source)
    }

    fn strategies_stage(
        &self,
        patterns: &[PatternDetection],
        news: &[SentimentRecord],
    ) -> Result<(Vec<Strategy>, bool), String> {
        let key = stage_key(Stage::Strategies, &(patterns, news))?;
        self.cached(&key, || Ok(generate_strategies(patterns, news)))
    }

    fn evaluation_stage(
        &self,
        strategies: &[Strategy],
        market: &MarketSnapshot,
    ) -> Result<(Vec<BacktestResult>, bool), String> {
        let evaluator = self.config.evaluator_config();
        let key = stage_key(Stage::Evaluation, &(strategies, &market.dataset_hash, &evaluator))?;
        self.cached(&key, || Ok(evaluate_with(&evaluator, strategies, &market.candles)))
    }

    // ── Cache and status plumbing ───────────────────────────────────

    /// Serve `key` from the cache, or compute and store it. Cache trouble is
    /// logged and treated as a miss.
    fn cached<T, F>(&self, key: &str, compute: F) -> Result<(T, bool), String>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, String>,
    {
        self.cached_if(key, |_| true, compute)
    }

    /// Like [`Self::cached`], but only fresh results passing `keep` are stored.
    fn cached_if<T, P, F>(&self, key: &str, keep: P, compute: F) -> Result<(T, bool), String>
    where
        T: Serialize + DeserializeOwned,
        P: FnOnce(&T) -> bool,
        F: FnOnce() -> Result<T, String>,
    {
        let ttl = self.config.cache.ttl();
        match self.cache.get(key, ttl) {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(hit) => {
                    tracing::debug!(key, "cache hit");
                    return Ok((hit, true));
                }
                Err(e) => tracing::warn!(key, error = %e, "cached value has the wrong shape"),
            },
            Ok(None) => tracing::debug!(key, "cache miss"),
            Err(e) => tracing::warn!(key, error = %e, "cache read failed"),
        }

        let fresh = compute()?;
        if !keep(&fresh) {
            tracing::debug!(key, "stage result not cached");
            return Ok((fresh, false));
        }
        match serde_json::to_value(&fresh) {
            Ok(value) => {
                if let Err(e) = self.cache.set(key, value) {
                    tracing::warn!(key, error = %e, "cache write failed");
                }
            }
            Err(e) => tracing::warn!(key, error = %e, "stage result not cacheable"),
        }
        Ok((fresh, false))
    }

    fn begin(&self, stage: Stage) {
        tracing::info!(%stage, "stage started");
        self.update(|s| *s.stage_mut(stage) = StageState::Running);
    }

    /// Record a stage's end state; failures become `StageFailed`.
    fn finish<T>(&self, stage: Stage, result: Result<T, String>) -> Result<T, PipelineError> {
        match result {
            Ok(value) => {
                tracing::info!(%stage, "stage completed");
                self.update(|s| *s.stage_mut(stage) = StageState::Completed);
                Ok(value)
            }
            Err(e) => {
                let message = format!("{}: {e}", stage.error_label());
                tracing::warn!(%stage, error = %message, "stage failed");
                let recorded = message.clone();
                self.update(|s| *s.stage_mut(stage) = StageState::Error(recorded));
                Err(PipelineError::StageFailed { stage, message })
            }
        }
    }

    fn update(&self, change: impl FnOnce(&mut PipelineStatus)) {
        let snapshot = {
            let mut status = self.lock_status();
            change(&mut status);
            status.is_running = self.is_running();
            status.clone()
        };
        if let Some(callback) = &self.on_status {
            callback(&snapshot);
        }
    }

    fn lock_status(&self) -> MutexGuard<'_, PipelineStatus> {
        self.status.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// `{prefix}_{first 16 hex of the input fingerprint}`.
fn stage_key<T: Serialize + ?Sized>(stage: Stage, inputs: &T) -> Result<String, String> {
    let digest = fingerprint(inputs).map_err(|e| format!("cannot fingerprint inputs: {e}"))?;
    Ok(format!("{}_{}", stage.cache_prefix(), short(&digest, 16)))
}
