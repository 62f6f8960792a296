//! Pattern detection: scans candle sequences for recurring chart formations.
//!
//! Each family is a `PatternScanner`. Scanners are pure: candle history in,
//! detections out, no I/O, no randomness. A sequence shorter than a family's
//! minimum yields no detections for that family; it is never an error.
//!
//! Callers are responsible for supplying finite candles sorted ascending by
//! date (see `domain::validate_series`).

pub mod double_bottom;
pub mod golden_cross;
pub mod head_and_shoulders;

pub use double_bottom::DoubleBottom;
pub use golden_cross::GoldenCross;
pub use head_and_shoulders::HeadAndShoulders;

use crate::domain::{Candle, PatternDetection, PatternKind};

/// Trait for pattern scanners.
pub trait PatternScanner: Send + Sync {
    /// The family this scanner detects.
    fn kind(&self) -> PatternKind;

    /// Sequences shorter than this produce no detections.
    fn min_candles(&self) -> usize {
        self.kind().min_candles()
    }

    /// Scan the whole sequence. Detections come out in ascending index order.
    fn scan(&self, candles: &[Candle], timeframe: &str) -> Vec<PatternDetection>;
}

/// The three families, in output order.
pub fn default_scanners() -> Vec<Box<dyn PatternScanner>> {
    vec![
        Box::new(DoubleBottom),
        Box::new(HeadAndShoulders),
        Box::new(GoldenCross::default()),
    ]
}

/// Run every scanner and concatenate: double bottoms, then head-and-shoulders,
/// then golden crosses.
pub fn detect_patterns(candles: &[Candle], timeframe: &str) -> Vec<PatternDetection> {
    detect_with(&default_scanners(), candles, timeframe)
}

/// Run a custom scanner set in the given order.
pub fn detect_with(
    scanners: &[Box<dyn PatternScanner>],
    candles: &[Candle],
    timeframe: &str,
) -> Vec<PatternDetection> {
    let mut detections = Vec::new();
    for scanner in scanners {
        let found = scanner.scan(candles, timeframe);
        tracing::debug!(
            pattern = scanner.kind().label(),
            count = found.len(),
            candles = candles.len(),
            "pattern scan complete"
        );
        detections.extend(found);
    }
    detections
}

/// Relative difference `|a - b| / base`, the closeness measure shared by the
/// swing-based families.
pub(crate) fn relative_gap(a: f64, b: f64, base: f64) -> f64 {
    (a - b).abs() / base
}
