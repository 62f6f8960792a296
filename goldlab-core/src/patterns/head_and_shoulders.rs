//! Head and shoulders (bearish).
//!
//! With `left = high[i-2]`, `head = high[i]`, `right = high[i+2]`, fires when
//! the head tops both shoulders, the shoulders sit within 3% of each other
//! (relative to the head), and the head clears the taller shoulder by more
//! than 0.5% of its height.

use super::{relative_gap, PatternScanner};
use crate::domain::{Candle, PatternDetection, PatternKind};

/// Maximum relative gap between the shoulders.
pub const SHOULDER_TOLERANCE: f64 = 0.03;

/// Minimum head prominence as a fraction of the head.
pub const MIN_HEAD_PROMINENCE: f64 = 0.005;

/// Confidence cap for the family.
pub const MAX_CONFIDENCE: f64 = 0.93;

#[derive(Debug, Clone, Copy, Default)]
pub struct HeadAndShoulders;

impl HeadAndShoulders {
    /// 0.7 plus 0.2 times the head's prominence over the taller shoulder.
    pub fn confidence(head: f64, taller_shoulder: f64) -> f64 {
        (0.7 + 0.2 * (head - taller_shoulder) / head).min(MAX_CONFIDENCE)
    }
}

impl PatternScanner for HeadAndShoulders {
    fn kind(&self) -> PatternKind {
        PatternKind::HeadAndShoulders
    }

    fn scan(&self, candles: &[Candle], timeframe: &str) -> Vec<PatternDetection> {
        if candles.len() < self.min_candles() {
            return Vec::new();
        }

        let mut detections = Vec::new();
        for i in 3..candles.len() - 3 {
            let left = candles[i - 2].high;
            let head = candles[i].high;
            let right = candles[i + 2].high;

            if head <= 0.0 || head <= left || head <= right {
                continue;
            }
            let taller = left.max(right);
            if relative_gap(left, right, head) >= SHOULDER_TOLERANCE
                || head - taller <= MIN_HEAD_PROMINENCE * head
            {
                continue;
            }

            detections.push(PatternDetection::new(
                PatternKind::HeadAndShoulders,
                i,
                &candles[i].date,
                timeframe,
                Self::confidence(head, taller),
                format!("Head at {head:.2}, shoulders at {left:.2}, {right:.2}"),
            ));
        }
        detections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Direction;

    fn candle(day: usize, high: f64) -> Candle {
        let low = high - 10.0;
        Candle::new(format!("2024-03-{:02}", day + 1), high - 5.0, high, low, high - 4.0)
    }

    fn fixture() -> Vec<Candle> {
        [1900.0, 1910.0, 1920.0, 1915.0, 1940.0, 1912.0, 1921.0, 1905.0, 1895.0]
            .iter()
            .enumerate()
            .map(|(i, &h)| candle(i, h))
            .collect()
    }

    #[test]
    fn detects_prominent_head() {
        let found = HeadAndShoulders.scan(&fixture(), "1D");
        assert_eq!(found.len(), 1);

        let det = &found[0];
        assert_eq!(det.direction, Direction::Bearish);
        assert_eq!(det.detected_at, "2024-03-05");
        assert_eq!(det.description, "Head at 1940.00, shoulders at 1920.00, 1921.00");
        assert_eq!(det.historical_accuracy, 0.78);
        let expected = 0.7 + 0.2 * 19.0 / 1940.0;
        assert!((det.confidence - expected).abs() < 1e-12);
    }

    #[test]
    fn head_must_clear_shoulders_by_half_percent() {
        // Index 3 tops its shoulders (1910, 1912) by only 3 points.
        let found = HeadAndShoulders.scan(&fixture(), "1D");
        assert!(found.iter().all(|d| d.detected_at != "2024-03-04"));
    }

    #[test]
    fn uneven_shoulders_are_rejected() {
        let mut candles = fixture();
        candles[6] = candle(6, 1860.0); // right shoulder 3.1% below the left
        assert!(HeadAndShoulders.scan(&candles, "1D").is_empty());
    }

    #[test]
    fn six_candles_is_insufficient() {
        assert!(HeadAndShoulders.scan(&fixture()[..6], "1D").is_empty());
    }

    #[test]
    fn seven_candles_scan_only_index_three() {
        let candles: Vec<Candle> = [1900.0, 1905.0, 1910.0, 1950.0, 1908.0, 1900.0, 1890.0]
            .iter()
            .enumerate()
            .map(|(i, &h)| candle(i, h))
            .collect();
        let found = HeadAndShoulders.scan(&candles, "1D");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].detected_at, "2024-03-04");
    }
}
