//! Pattern detections: structural claims about recent price action.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional bias of a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Bullish,
    Bearish,
}

/// The pattern families the detector knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    DoubleBottom,
    HeadAndShoulders,
    GoldenCross,
}

impl PatternKind {
    pub const ALL: [PatternKind; 3] = [
        PatternKind::DoubleBottom,
        PatternKind::HeadAndShoulders,
        PatternKind::GoldenCross,
    ];

    /// Display name, also used to name per-pattern strategies.
    pub fn label(self) -> &'static str {
        match self {
            PatternKind::DoubleBottom => "Double Bottom",
            PatternKind::HeadAndShoulders => "Head and Shoulders",
            PatternKind::GoldenCross => "Golden Cross",
        }
    }

    /// Prefix for detection ids.
    pub fn slug(self) -> &'static str {
        match self {
            PatternKind::DoubleBottom => "double-bottom",
            PatternKind::HeadAndShoulders => "head-shoulders",
            PatternKind::GoldenCross => "golden-cross",
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            PatternKind::DoubleBottom | PatternKind::GoldenCross => Direction::Bullish,
            PatternKind::HeadAndShoulders => Direction::Bearish,
        }
    }

    /// Fixed historical hit rate of the family.
    pub fn historical_accuracy(self) -> f64 {
        match self {
            PatternKind::DoubleBottom => 0.82,
            PatternKind::HeadAndShoulders => 0.78,
            PatternKind::GoldenCross => 0.87,
        }
    }

    /// Minimum sequence length below which the scan yields nothing.
    pub fn min_candles(self) -> usize {
        match self {
            PatternKind::DoubleBottom => 10,
            PatternKind::HeadAndShoulders => 7,
            PatternKind::GoldenCross => 51,
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One confidence-scored, directional detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternDetection {
    pub id: String,
    pub pattern: PatternKind,
    pub timeframe: String,
    /// Always within [0, 1].
    pub confidence: f64,
    pub direction: Direction,
    /// Date of the candle at which the pattern resolves.
    pub detected_at: String,
    pub description: String,
    pub historical_accuracy: f64,
}

impl PatternDetection {
    /// Build a detection for `kind` resolving at candle `index`.
    pub fn new(
        kind: PatternKind,
        index: usize,
        date: &str,
        timeframe: &str,
        confidence: f64,
        description: String,
    ) -> Self {
        Self {
            id: format!("{}-{date}-{index}", kind.slug()),
            pattern: kind,
            timeframe: timeframe.to_string(),
            confidence,
            direction: kind.direction(),
            detected_at: date.to_string(),
            description,
            historical_accuracy: kind.historical_accuracy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_constants() {
        assert_eq!(PatternKind::DoubleBottom.historical_accuracy(), 0.82);
        assert_eq!(PatternKind::HeadAndShoulders.historical_accuracy(), 0.78);
        assert_eq!(PatternKind::GoldenCross.historical_accuracy(), 0.87);
        assert_eq!(PatternKind::HeadAndShoulders.direction(), Direction::Bearish);
    }

    #[test]
    fn detection_id_includes_index() {
        let a = PatternDetection::new(PatternKind::GoldenCross, 51, "2024-03-01", "1D", 0.9, String::new());
        let b = PatternDetection::new(PatternKind::GoldenCross, 52, "2024-03-01", "1D", 0.9, String::new());
        assert_eq!(a.id, "golden-cross-2024-03-01-51");
        assert_ne!(a.id, b.id);
    }
}
