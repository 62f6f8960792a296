//! GoldLab CLI: pipeline runs, one-off detection, and stage cache management.
//!
//! Commands:
//! - `run`: news ∥ patterns → strategies → backtest, then export artifacts
//! - `detect`: pattern detection over a CSV file of candles
//! - `cache status`: list cached stage results and the stored candle sequence
//! - `cache clear`: drop every cached stage result

use anyhow::{bail, Context, Result};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use goldlab_core::data::{CandleFeed, CircuitBreaker, CsvCandleFeed, TwelveDataFeed};
use goldlab_core::detect_patterns;
use goldlab_core::news::{JsonNewsFeed, KeywordScorer, NewsFeed, SentimentScorer, SerperNewsFeed, TwinwordScorer};
use goldlab_runner::export::save_artifacts;
use goldlab_runner::{
    summarize, FileStageCache, MemoryStageCache, Pipeline, PipelineConfig, PipelineOutcome,
    StageCache,
};

#[derive(Parser)]
#[command(name = "goldlab", about = "GoldLab CLI: XAU/USD pattern, strategy and backtest pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and export its artifacts.
    Run {
        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Read candles from this CSV file instead of Twelve Data.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Read news from this JSON file instead of Serper.
        #[arg(long)]
        news: Option<PathBuf>,

        /// Score sentiment with the offline keyword scorer instead of Twinword.
        #[arg(long, default_value_t = false)]
        keyword_sentiment: bool,

        /// Offline mode: no network access; candles come from the store.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Use synthetic candles when neither the feed nor the store has any.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Skip the on-disk stage cache for this run.
        #[arg(long, default_value_t = false)]
        no_cache: bool,

        /// Output directory for run artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Detect chart patterns in a CSV file of candles.
    Detect {
        /// CSV with `date,open,high,low,close[,volume]`.
        #[arg(long)]
        csv: PathBuf,

        /// Timeframe label attached to detections.
        #[arg(long, default_value = "1D")]
        timeframe: String,

        /// Print detections as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Stage cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// List cached stage results and the stored candle sequence.
    Status {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Remove every cached stage result. Stored candles are kept.
    Clear {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            csv,
            news,
            keyword_sentiment,
            offline,
            synthetic,
            no_cache,
            output_dir,
        } => {
            let config = load_config(config.as_deref())?;
            let sources = Sources {
                csv,
                news,
                keyword_sentiment,
                offline,
            };
            run_pipeline_cmd(config, sources, synthetic, no_cache, &output_dir)
        }
        Commands::Detect {
            csv,
            timeframe,
            json,
        } => run_detect(&csv, &timeframe, json),
        Commands::Cache { action } => match action {
            CacheAction::Status { config } => run_cache_status(&load_config(config.as_deref())?),
            CacheAction::Clear { config } => run_cache_clear(&load_config(config.as_deref())?),
        },
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

/// Collaborator choices from the command line.
struct Sources {
    csv: Option<PathBuf>,
    news: Option<PathBuf>,
    keyword_sentiment: bool,
    offline: bool,
}

impl Sources {
    /// `None` means "serve the stored sequence".
    fn candle_feed(&self, config: &PipelineConfig) -> Option<Box<dyn CandleFeed>> {
        if let Some(path) = &self.csv {
            return Some(Box::new(CsvCandleFeed::new(path)));
        }
        if self.offline {
            return None;
        }
        let breaker = Arc::new(CircuitBreaker::default_provider());
        match TwelveDataFeed::from_env(&config.market.symbol, &config.api.twelvedata_key_env, breaker) {
            Ok(feed) => Some(Box::new(feed)),
            Err(e) => {
                tracing::warn!(error = %e, "Twelve Data unavailable, using stored candles");
                None
            }
        }
    }

    fn news_feed(&self, config: &PipelineConfig) -> Result<Box<dyn NewsFeed>> {
        if let Some(path) = &self.news {
            return Ok(Box::new(JsonNewsFeed::new(path)));
        }
        if self.offline {
            bail!("offline runs need a news file (--news <path>)");
        }
        let breaker = Arc::new(CircuitBreaker::default_provider());
        let feed = SerperNewsFeed::from_env(&config.news.query, &config.api.serper_key_env, breaker)
            .context("failed to set up the Serper news feed")?;
        Ok(Box::new(feed))
    }

    fn scorer(&self, config: &PipelineConfig) -> Box<dyn SentimentScorer> {
        if self.keyword_sentiment || self.offline {
            return Box::new(KeywordScorer);
        }
        let breaker = Arc::new(CircuitBreaker::default_provider());
        match TwinwordScorer::from_env(&config.api.twinword_key_env, breaker) {
            Ok(scorer) => Box::new(scorer),
            Err(e) => {
                tracing::warn!(error = %e, "Twinword unavailable, using keyword sentiment");
                Box::new(KeywordScorer)
            }
        }
    }
}

fn run_pipeline_cmd(
    config: PipelineConfig,
    sources: Sources,
    synthetic: bool,
    no_cache: bool,
    output_dir: &Path,
) -> Result<()> {
    let cache: Box<dyn StageCache> = if no_cache {
        Box::new(MemoryStageCache::new())
    } else {
        Box::new(
            FileStageCache::new(config.cache.stages_dir())
                .context("failed to open the stage cache")?,
        )
    };

    let candle_feed = sources.candle_feed(&config);
    let news_feed = sources.news_feed(&config)?;
    let scorer = sources.scorer(&config);

    let pipeline = Pipeline::new(config, candle_feed, news_feed, scorer, cache)
        .offline(sources.offline)
        .synthetic(synthetic, Local::now().date_naive())
        .on_status(|status| {
            if let Some(stage) = &status.current_stage {
                tracing::info!(progress = status.progress, "{stage}");
            }
        });

    let outcome = pipeline.run()?;
    let symbol = pipeline.config().market.symbol.clone();
    print_outcome(&outcome, &symbol);

    let run_dir = save_artifacts(&outcome, &symbol, output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn print_outcome(outcome: &PipelineOutcome, symbol: &str) {
    println!();
    println!("=== GoldLab Pipeline ===");
    println!(
        "Candles: {} ({:?}, hash {})",
        outcome.market.candles.len(),
        outcome.market.source,
        goldlab_core::fingerprint::short(&outcome.market.dataset_hash, 12)
    );
    if !outcome.cache_hits.is_empty() {
        let hits: Vec<String> = outcome.cache_hits.iter().map(|s| s.to_string()).collect();
        println!("Cached stages: {}", hits.join(", "));
    }
    println!();

    for (title, text) in summarize(outcome, &symbol.replace('/', "")) {
        println!("{title}");
        println!("  {text}");
    }

    if !outcome.results.is_empty() {
        println!();
        println!(
            "{:<22} {:>7} {:>8} {:>9} {:>8} {:>8}",
            "Strategy", "Trades", "Win %", "Return %", "MaxDD %", "Sharpe"
        );
        for r in &outcome.results {
            println!(
                "{:<22} {:>7} {:>7.1}% {:>8.2}% {:>7.2}% {:>8.2}",
                r.strategy_id,
                r.total_trades,
                r.win_rate * 100.0,
                r.return_pct(),
                r.max_drawdown,
                r.sharpe_ratio
            );
        }
    }
    println!();
}

fn run_detect(csv: &Path, timeframe: &str, json: bool) -> Result<()> {
    let candles = CsvCandleFeed::new(csv)
        .read_all()
        .with_context(|| format!("failed to read candles from {}", csv.display()))?;
    let detections = detect_patterns(&candles, timeframe);

    if json {
        println!("{}", serde_json::to_string_pretty(&detections)?);
        return Ok(());
    }

    println!("{} candles, {} detections", candles.len(), detections.len());
    for d in &detections {
        println!(
            "{:<20} {:<8} {:>5.1}%  {}  {}",
            d.pattern.label(),
            format!("{:?}", d.direction),
            d.confidence * 100.0,
            d.detected_at,
            d.description
        );
    }
    Ok(())
}

fn run_cache_status(config: &PipelineConfig) -> Result<()> {
    let stages_dir = config.cache.stages_dir();
    if !stages_dir.exists() {
        println!("Stage cache does not exist: {}", stages_dir.display());
    } else {
        let cache = FileStageCache::new(&stages_dir)?;
        let entries = cache.entries()?;
        println!("Stage cache: {} ({} entries)", stages_dir.display(), entries.len());
        let ttl = config.cache.ttl_secs as i64;
        for (key, stored_at) in entries {
            let age = Utc::now().signed_duration_since(stored_at).num_seconds();
            let state = if age < ttl { "fresh" } else { "stale" };
            println!("  {key:<48} {age:>6}s  {state}");
        }
    }

    let store = goldlab_core::data::CandleStore::new(config.cache.candles_dir());
    match store.meta(&config.market.symbol, &config.market.interval) {
        Some(meta) => println!(
            "Stored candles: {} {} — {} candles {}..{} from {} (stored {})",
            meta.symbol,
            meta.interval,
            meta.candle_count,
            meta.first_date,
            meta.last_date,
            meta.source,
            meta.stored_at.format("%Y-%m-%d %H:%M")
        ),
        None => println!("Stored candles: none for {}", config.market.symbol),
    }
    Ok(())
}

fn run_cache_clear(config: &PipelineConfig) -> Result<()> {
    let stages_dir = config.cache.stages_dir();
    if !stages_dir.exists() {
        println!("Stage cache does not exist: {}", stages_dir.display());
        return Ok(());
    }
    let cache = FileStageCache::new(&stages_dir)?;
    let count = cache.len()?;
    cache.clear()?;
    println!("Removed {count} cached stage results from {}", stages_dir.display());
    Ok(())
}
