//! Golden cross (bullish): the 20-candle SMA crossing above the 50-candle SMA.
//!
//! The "previous" averages are taken over windows ending two candles before
//! the current one, so a detection at `i` compares SMA values at `i - 2` and `i`.
//! The first index with a fully defined previous slow window is `slow + 1`.

use super::PatternScanner;
use crate::domain::{Candle, PatternDetection, PatternKind};
use crate::indicators::{Indicator, Sma};

/// Distance in candles between the "previous" and current windows.
const LAG: usize = 2;

pub const MIN_CONFIDENCE: f64 = 0.85;
pub const MAX_CONFIDENCE: f64 = 0.98;

/// Confidence gained per unit of relative MA spread.
pub const SPREAD_WEIGHT: f64 = 10.0;

#[derive(Debug, Clone)]
pub struct GoldenCross {
    fast: Sma,
    slow: Sma,
}

impl Default for GoldenCross {
    fn default() -> Self {
        Self {
            fast: Sma::new(20),
            slow: Sma::new(50),
        }
    }
}

impl GoldenCross {
    /// Deterministic confidence from the post-cross spread `(fast - slow) / slow`.
    pub fn confidence(fast: f64, slow: f64) -> f64 {
        if slow <= 0.0 {
            return MIN_CONFIDENCE;
        }
        let spread = (fast - slow) / slow;
        (MIN_CONFIDENCE + SPREAD_WEIGHT * spread).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
    }
}

impl PatternScanner for GoldenCross {
    fn kind(&self) -> PatternKind {
        PatternKind::GoldenCross
    }

    fn min_candles(&self) -> usize {
        self.slow.period() + 1
    }

    fn scan(&self, candles: &[Candle], timeframe: &str) -> Vec<PatternDetection> {
        if candles.len() < self.min_candles() {
            return Vec::new();
        }

        let fast = self.fast.compute(candles);
        let slow = self.slow.compute(candles);

        let mut detections = Vec::new();
        for i in (self.slow.period() + LAG - 1)..candles.len() {
            let (fast_prev, slow_prev) = (fast[i - LAG], slow[i - LAG]);
            let (fast_now, slow_now) = (fast[i], slow[i]);

            // NaN comparisons are false, so void windows never fire.
            if fast_prev < slow_prev && fast_now > slow_now {
                detections.push(PatternDetection::new(
                    PatternKind::GoldenCross,
                    i,
                    &candles[i].date,
                    timeframe,
                    Self::confidence(fast_now, slow_now),
                    format!(
                        "{} MA crossed above {} MA ({fast_now:.2} > {slow_now:.2})",
                        self.fast.period(),
                        self.slow.period()
                    ),
                ));
            }
        }
        detections
    }
}
