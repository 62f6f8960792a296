//! Strategy: a named, parameterized trading rule template.

use super::pattern::Direction;
use serde::{Deserialize, Serialize};

/// Candidate trading strategy produced by the generator.
///
/// Entry and exit conditions are narrative strings. Nothing re-evaluates them
/// during backtesting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: String,
    pub name: String,
    pub description: String,
    pub entry_conditions: Vec<String>,
    pub exit_conditions: Vec<String>,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub timeframe: String,
    /// Used by the evaluator as an absolute price offset, not as a ratio.
    pub risk_reward: f64,
    pub expected_win_rate: f64,
    /// Directional lean of the evidence behind the strategy, if any.
    #[serde(default)]
    pub bias: Option<Direction>,
}
