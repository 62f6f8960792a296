//! Criterion benchmarks for GoldLab hot paths.
//!
//! Benchmarks:
//! 1. Pattern detection over growing candle histories
//! 2. SMA precompute
//! 3. Backtest evaluation (fixed payoff vs price path)

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use goldlab_core::data::generate_gold_candles;
use goldlab_core::domain::{Candle, PatternDetection, PatternKind};
use goldlab_core::indicators::{Indicator, Sma};
use goldlab_core::{
    detect_patterns, evaluate_with, generate_strategies, EvaluationWindow, EvaluatorConfig,
    TradeSynthesis,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_candles(n: usize) -> Vec<Candle> {
    generate_gold_candles(n, NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(), 42)
}

fn make_patterns() -> Vec<PatternDetection> {
    PatternKind::ALL
        .iter()
        .enumerate()
        .map(|(i, &kind)| {
            PatternDetection::new(kind, i, "2024-06-28", "1D", 0.8, kind.label().into())
        })
        .collect()
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect_patterns");
    for n in [60, 250, 1000] {
        let candles = make_candles(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &candles, |b, candles| {
            b.iter(|| detect_patterns(black_box(candles), "1D"));
        });
    }
    group.finish();
}

fn bench_sma(c: &mut Criterion) {
    let candles = make_candles(1000);
    let sma = Sma::new(50);
    c.bench_function("sma_50_1000_candles", |b| {
        b.iter(|| sma.compute(black_box(&candles)));
    });
}

fn bench_evaluation(c: &mut Criterion) {
    let candles = make_candles(500);
    let strategies = generate_strategies(&make_patterns(), &[]);

    let mut group = c.benchmark_group("evaluate_strategies");
    for synthesis in [TradeSynthesis::FixedPayoff, TradeSynthesis::PricePath] {
        let config = EvaluatorConfig {
            window: EvaluationWindow::Full,
            synthesis,
            ..EvaluatorConfig::default()
        };
        group.bench_function(format!("{synthesis:?}_500_candles"), |b| {
            b.iter(|| evaluate_with(black_box(&config), black_box(&strategies), black_box(&candles)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_detection, bench_sma, bench_evaluation);
criterion_main!(benches);
