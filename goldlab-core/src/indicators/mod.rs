//! Indicators over candle series.
//!
//! Indicators are pure functions: candle history in, numeric series out. The
//! output has the same length as the input, with `f64::NAN` during warmup.

pub mod sma;

pub use sma::Sma;

use crate::domain::Candle;

/// Trait for indicators.
///
/// # Look-ahead contamination guard
/// No indicator value at index t may depend on price data from index t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20").
    fn name(&self) -> &str;

    /// Number of candles needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire series.
    ///
    /// Returns a `Vec<f64>` of the same length as `candles`.
    /// The first `lookback()` values are `f64::NAN`.
    fn compute(&self, candles: &[Candle]) -> Vec<f64>;
}

/// Create synthetic daily candles from close prices for testing.
///
/// open = prev close (or close for the first candle),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let date = base_date + chrono::Duration::days(i as i64);
            Candle::new(
                date.format("%Y-%m-%d").to_string(),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
            )
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
