//! SimulatedTrade: one trade synthesized during a backtest replay.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeDirection {
    Long,
    Short,
}

impl TradeDirection {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            TradeDirection::Long => 1.0,
            TradeDirection::Short => -1.0,
        }
    }
}

/// A completed simulated trade. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedTrade {
    pub id: String,

    // ── Entry ──
    pub entry_date: String,
    pub entry_price: f64,
    pub direction: TradeDirection,

    // ── Exit ──
    pub exit_date: String,
    pub exit_price: f64,

    // ── Risk levels ──
    pub stop_loss: f64,
    pub take_profit: f64,

    // ── PnL ──
    pub profit: f64,
    pub profit_percentage: f64,
}

impl SimulatedTrade {
    /// Signed profit of a move from `entry` to `exit` in `direction`.
    pub fn signed_profit(direction: TradeDirection, entry: f64, exit: f64) -> f64 {
        match direction {
            TradeDirection::Long => exit - entry,
            TradeDirection::Short => entry - exit,
        }
    }

    /// Profit as a percentage of the entry price.
    pub fn percentage_of(profit: f64, entry: f64) -> f64 {
        if entry == 0.0 {
            return 0.0;
        }
        profit / entry * 100.0
    }

    pub fn is_winner(&self) -> bool {
        self.profit > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.profit < 0.0
    }
}
