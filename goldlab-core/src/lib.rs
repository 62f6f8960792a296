//! GoldLab Core: candles, pattern detection, strategy generation, backtest evaluation.
//!
//! This crate contains the analytical pipeline for XAU/USD:
//! - Domain types (candles, pattern detections, sentiment records, strategies, trades, results)
//! - Pattern scanners (double bottom, head and shoulders, golden cross) over an SMA indicator
//! - Rule-cascade strategy generation from patterns and news sentiment
//! - Parallel, seeded backtest evaluation with fixed-payoff or price-path trade synthesis
//! - Collaborator interfaces (candle feeds, news feeds, sentiment scorers) and their adapters
//! - A Parquet store holding the last valid candle sequence
//!
//! Detection, generation and evaluation are pure: they never fail for valid
//! input and degrade to empty output.

pub mod backtest;
pub mod data;
pub mod domain;
pub mod fingerprint;
pub mod generator;
pub mod indicators;
pub mod news;
pub mod patterns;
pub mod rng;

pub use backtest::{evaluate_strategies, evaluate_with, EvaluationWindow, EvaluatorConfig, TradeSynthesis};
pub use generator::generate_strategies;
pub use patterns::detect_patterns;
