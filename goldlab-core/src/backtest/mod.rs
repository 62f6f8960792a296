//! Backtest evaluation: replays each strategy against a candle window and
//! aggregates the synthesized trades into a `BacktestResult`.
//!
//! Strategies are evaluated in parallel with rayon. Each strategy draws from
//! its own RNG stream (derived from the master seed and its id), so results
//! do not depend on thread count or scheduling.

pub mod metrics;
pub mod replay;

pub use replay::TradeSynthesis;

use crate::domain::{BacktestResult, Candle, Strategy};
use crate::rng::RngHierarchy;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Which candles a strategy is replayed against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationWindow {
    /// The first `n` candles (fewer if the series is shorter).
    FirstN(usize),
    /// The entire series.
    Full,
    /// Candles whose date falls in `start..=end`.
    Range { start: NaiveDate, end: NaiveDate },
}

impl Default for EvaluationWindow {
    fn default() -> Self {
        EvaluationWindow::FirstN(10)
    }
}

impl EvaluationWindow {
    /// The sub-slice of `candles` this window covers. Candles with an
    /// unparseable date never fall inside a `Range`.
    pub fn select<'a>(&self, candles: &'a [Candle]) -> &'a [Candle] {
        match self {
            EvaluationWindow::FirstN(n) => &candles[..(*n).min(candles.len())],
            EvaluationWindow::Full => candles,
            EvaluationWindow::Range { start, end } => {
                let inside = |c: &Candle| {
                    c.timestamp()
                        .map(|ts| ts.date() >= *start && ts.date() <= *end)
                        .unwrap_or(false)
                };
                let Some(first) = candles.iter().position(inside) else {
                    return &[];
                };
                let last = candles.iter().rposition(inside).unwrap_or(first);
                &candles[first..=last]
            }
        }
    }
}

/// Evaluator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    pub window: EvaluationWindow,
    pub initial_balance: f64,
    pub synthesis: TradeSynthesis,
    pub seed: u64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            window: EvaluationWindow::default(),
            initial_balance: 10_000.0,
            synthesis: TradeSynthesis::default(),
            seed: 42,
        }
    }
}

/// Evaluate with the default configuration: first 10 candles, fixed payoff,
/// 10 000 starting balance.
pub fn evaluate_strategies(strategies: &[Strategy], candles: &[Candle]) -> Vec<BacktestResult> {
    evaluate_with(&EvaluatorConfig::default(), strategies, candles)
}

/// One result per strategy, in input order. Result ids are the strategy's
/// position in the input.
pub fn evaluate_with(
    config: &EvaluatorConfig,
    strategies: &[Strategy],
    candles: &[Candle],
) -> Vec<BacktestResult> {
    let window = config.window.select(candles);
    let rngs = RngHierarchy::new(config.seed);
    let (start_date, end_date) = match (window.first(), window.last()) {
        (Some(first), Some(last)) => (first.date.clone(), last.date.clone()),
        _ => (String::new(), String::new()),
    };

    let results: Vec<BacktestResult> = strategies
        .par_iter()
        .enumerate()
        .map(|(i, strategy)| {
            let mut rng = rngs.rng_for(&strategy.id);
            let trades = replay::synthesize(strategy, window, config.synthesis, &mut rng);
            metrics::aggregate(
                i.to_string(),
                &strategy.id,
                start_date.clone(),
                end_date.clone(),
                config.initial_balance,
                trades,
            )
        })
        .collect();

    tracing::debug!(
        strategies = strategies.len(),
        window = window.len(),
        synthesis = ?config.synthesis,
        "evaluation complete"
    );
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_candles;

    fn strategy(id: &str) -> Strategy {
        Strategy {
            id: id.into(),
            name: id.into(),
            description: String::new(),
            entry_conditions: vec![],
            exit_conditions: vec![],
            stop_loss: 1.0,
            take_profit: 2.0,
            timeframe: "1D".into(),
            risk_reward: 2.0,
            expected_win_rate: 0.5,
            bias: None,
        }
    }

    fn closes(n: usize) -> Vec<f64> {
        (0..n).map(|i| 1900.0 + i as f64).collect()
    }

    #[test]
    fn first_n_window_caps_at_series_length() {
        let candles = make_candles(&closes(4));
        assert_eq!(EvaluationWindow::FirstN(10).select(&candles).len(), 4);
        assert_eq!(EvaluationWindow::FirstN(2).select(&candles).len(), 2);
        assert_eq!(EvaluationWindow::Full.select(&candles).len(), 4);
    }

    #[test]
    fn range_window_is_inclusive() {
        let candles = make_candles(&closes(10));
        let window = EvaluationWindow::Range {
            start: NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(),
        };
        let picked = window.select(&candles);
        assert_eq!(picked.len(), 3);
        assert_eq!(picked[0].date, "2024-01-04");
        assert_eq!(picked[2].date, "2024-01-06");
    }

    #[test]
    fn range_outside_series_is_empty() {
        let candles = make_candles(&closes(5));
        let window = EvaluationWindow::Range {
            start: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2030, 2, 1).unwrap(),
        };
        assert!(window.select(&candles).is_empty());
    }

    #[test]
    fn one_result_per_strategy_in_order() {
        let candles = make_candles(&closes(30));
        let strategies = vec![strategy("a"), strategy("b"), strategy("c")];
        let results = evaluate_strategies(&strategies, &candles);
        let ids: Vec<&str> = results.iter().map(|r| r.strategy_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(results[2].id, "2");
        assert!(results.iter().all(|r| r.total_trades == 10));
        assert_eq!(results[0].start_date, "2024-01-02");
        assert_eq!(results[0].end_date, "2024-01-11");
    }

    #[test]
    fn empty_inputs() {
        let candles = make_candles(&closes(12));
        assert!(evaluate_strategies(&[], &candles).is_empty());

        let results = evaluate_strategies(&[strategy("a")], &[]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].total_trades, 0);
        assert_eq!(results[0].final_balance, results[0].initial_balance);
        assert_eq!(results[0].start_date, "");
    }

    #[test]
    fn evaluation_is_reproducible() {
        let candles = make_candles(&closes(20));
        let strategies = vec![strategy("a"), strategy("b")];
        let config = EvaluatorConfig {
            synthesis: TradeSynthesis::PricePath,
            window: EvaluationWindow::Full,
            ..EvaluatorConfig::default()
        };
        let a = evaluate_with(&config, &strategies, &candles);
        let b = evaluate_with(&config, &strategies, &candles);
        assert_eq!(a, b);
    }
}
