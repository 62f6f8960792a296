//! Property tests for detector, generator and evaluator invariants.
//!
//! Uses proptest to verify:
//! 1. Insufficient data: sequences shorter than a family's minimum never yield that family
//! 2. Confidence bands: every detection stays inside its family's range
//! 3. Cascade: a bullish combo suppresses both fallbacks
//! 4. Aggregation: result statistics are consistent with the trade list

use chrono::{Duration, NaiveDate};
use goldlab_core::domain::{
    Candle, Impact, PatternDetection, PatternKind, Sentiment, SentimentRecord,
};
use goldlab_core::{
    detect_patterns, evaluate_strategies, evaluate_with, generate_strategies, EvaluationWindow,
    EvaluatorConfig, TradeSynthesis,
};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

/// Random-walk candle series around gold prices.
fn arb_candles(max_len: usize) -> impl Strategy<Value = Vec<Candle>> {
    prop::collection::vec((-0.02..0.02_f64, 0.0..0.01_f64, 0.0..0.01_f64), 0..max_len).prop_map(
        |steps| {
            let base = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
            let mut price = 1900.0;
            steps
                .into_iter()
                .enumerate()
                .map(|(i, (ret, up, down))| {
                    let open = price;
                    let close = price * (1.0 + ret);
                    price = close;
                    Candle::new(
                        (base + Duration::days(i as i64)).format("%Y-%m-%d").to_string(),
                        open,
                        open.max(close) * (1.0 + up),
                        open.min(close) * (1.0 - down),
                        close,
                    )
                })
                .collect()
        },
    )
}

fn arb_pattern() -> impl Strategy<Value = PatternDetection> {
    (0..3usize, 0.5..0.99_f64).prop_map(|(k, confidence)| {
        let kind = PatternKind::ALL[k];
        PatternDetection::new(kind, 10, "2024-01-12", "1D", confidence, kind.label().into())
    })
}

fn arb_sentiment() -> impl Strategy<Value = SentimentRecord> {
    (0..3usize, -1.0..1.0_f64).prop_map(|(s, score)| SentimentRecord {
        id: format!("news-{s}"),
        title: "Gold headline".into(),
        summary: "Gold summary".into(),
        source_url: String::new(),
        source: "Wire".into(),
        date: String::new(),
        sentiment: [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral][s],
        score,
        impact: Impact::from_score(score),
    })
}

// ── 1. Insufficient data ─────────────────────────────────────────────

proptest! {
    #[test]
    fn short_sequences_yield_no_family(candles in arb_candles(51)) {
        let found = detect_patterns(&candles, "1D");
        for kind in PatternKind::ALL {
            if candles.len() < kind.min_candles() {
                prop_assert!(found.iter().all(|p| p.pattern != kind));
            }
        }
    }
}

// ── 2. Confidence bands ──────────────────────────────────────────────

proptest! {
    #[test]
    fn confidence_within_family_band(candles in arb_candles(160)) {
        for det in detect_patterns(&candles, "1D") {
            let (lo, hi) = match det.pattern {
                PatternKind::DoubleBottom => (0.7, 0.95),
                PatternKind::HeadAndShoulders => (0.7, 0.93),
                PatternKind::GoldenCross => (0.85, 0.98),
            };
            prop_assert!(det.confidence >= lo && det.confidence <= hi,
                "{:?} confidence {} outside [{}, {}]", det.pattern, det.confidence, lo, hi);
            prop_assert_eq!(det.direction, det.pattern.direction());
        }
    }
}

// ── 3. Cascade ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn bullish_combo_suppresses_fallbacks(
        patterns in prop::collection::vec(arb_pattern(), 0..6),
        sentiments in prop::collection::vec(arb_sentiment(), 0..6),
    ) {
        let strategies = generate_strategies(&patterns, &sentiments);

        let bullish = patterns.iter().any(|p| p.pattern.direction() == goldlab_core::domain::Direction::Bullish && p.confidence > 0.75)
            && sentiments.iter().any(|n| n.sentiment == Sentiment::Positive && n.impact == Impact::High);
        if bullish {
            prop_assert!(strategies.iter().any(|s| s.name == "Pattern + News Bullish"));
        }
        let combos = strategies.iter().filter(|s| s.name.starts_with("Pattern + News")).count();
        if combos > 0 {
            prop_assert_eq!(combos, strategies.len());
        }
        prop_assert!(strategies.len() <= 2);
        if patterns.is_empty() && sentiments.is_empty() {
            prop_assert!(strategies.is_empty());
        }
    }
}

// ── 4. Aggregation ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn fixed_payoff_always_wins(
        candles in arb_candles(40),
        patterns in prop::collection::vec(arb_pattern(), 1..4),
    ) {
        let strategies = generate_strategies(&patterns, &[]);
        let results = evaluate_strategies(&strategies, &candles);
        prop_assert_eq!(results.len(), strategies.len());
        for r in &results {
            prop_assert_eq!(r.total_trades, candles.len().min(10));
            prop_assert_eq!(r.winning_trades, r.total_trades);
            prop_assert_eq!(r.losing_trades, 0);
            if r.total_trades > 0 {
                prop_assert!(r.final_balance > r.initial_balance);
            }
        }
    }

    #[test]
    fn price_path_balances(
        candles in arb_candles(80),
        patterns in prop::collection::vec(arb_pattern(), 1..3),
        seed in any::<u64>(),
    ) {
        let strategies = generate_strategies(&patterns, &[]);
        let config = EvaluatorConfig {
            window: EvaluationWindow::Full,
            synthesis: TradeSynthesis::PricePath,
            seed,
            ..EvaluatorConfig::default()
        };
        for r in evaluate_with(&config, &strategies, &candles) {
            let net: f64 = r.trades.iter().map(|t| t.profit).sum();
            prop_assert!((r.final_balance - r.initial_balance - net).abs() < 1e-6);
            prop_assert!(r.winning_trades + r.losing_trades <= r.total_trades);
            prop_assert!((0.0..=1.0).contains(&r.win_rate));
            prop_assert!(r.max_drawdown >= 0.0 && r.max_drawdown <= 100.0);
            prop_assert!(r.profit_factor >= 0.0);
        }
    }
}
