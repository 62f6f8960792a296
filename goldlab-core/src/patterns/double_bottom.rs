//! Double bottom (bullish).
//!
//! Fires at index `i` when:
//! - `low[i]` is a local minimum against its immediate neighbours,
//! - the trough two candles earlier is within 1.5% of it, and
//! - the high two candles later recovers above `high[i]`.

use super::{relative_gap, PatternScanner};
use crate::domain::{Candle, PatternDetection, PatternKind};

/// Maximum relative gap between the two troughs.
pub const TROUGH_TOLERANCE: f64 = 0.015;

/// Confidence cap for the family.
pub const MAX_CONFIDENCE: f64 = 0.95;

#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleBottom;

impl DoubleBottom {
    /// 0.7 plus up to 0.2 for how closely the troughs match.
    pub fn confidence(trough_gap: f64) -> f64 {
        (0.7 + 0.2 * (1.0 - trough_gap)).min(MAX_CONFIDENCE)
    }
}

impl PatternScanner for DoubleBottom {
    fn kind(&self) -> PatternKind {
        PatternKind::DoubleBottom
    }

    fn scan(&self, candles: &[Candle], timeframe: &str) -> Vec<PatternDetection> {
        if candles.len() < self.min_candles() {
            return Vec::new();
        }

        let mut detections = Vec::new();
        for i in 2..candles.len() - 2 {
            let prev = &candles[i - 2];
            let curr = &candles[i];
            let next = &candles[i + 2];

            if curr.low <= 0.0 {
                continue;
            }
            let is_local_min = curr.low < candles[i - 1].low && curr.low < candles[i + 1].low;
            if !is_local_min {
                continue;
            }
            let gap = relative_gap(curr.low, prev.low, curr.low);
            if gap >= TROUGH_TOLERANCE || next.high <= curr.high {
                continue;
            }

            detections.push(PatternDetection::new(
                PatternKind::DoubleBottom,
                i,
                &curr.date,
                timeframe,
                Self::confidence(gap),
                format!("Double bottom at {:.2} and {:.2}", curr.low, prev.low),
            ));
        }
        detections
    }
}
