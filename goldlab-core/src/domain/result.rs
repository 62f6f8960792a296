//! BacktestResult: aggregated statistics for one strategy replay.

use super::trade::SimulatedTrade;
use serde::{Deserialize, Serialize};

/// Aggregated performance of one strategy over one evaluation window.
///
/// Every statistic is derived from `trades`:
/// - `winning_trades + losing_trades <= total_trades` (zero-profit trades count as neither)
/// - `final_balance == initial_balance + sum(trades.profit)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub id: String,
    pub strategy_id: String,
    pub start_date: String,
    pub end_date: String,
    pub initial_balance: f64,
    pub final_balance: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    /// Largest peak-to-trough decline of the balance curve, in percent.
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub average_trade: f64,
    pub trades: Vec<SimulatedTrade>,
}

impl BacktestResult {
    pub fn net_profit(&self) -> f64 {
        self.final_balance - self.initial_balance
    }

    /// Net profit as a percentage of the initial balance.
    pub fn return_pct(&self) -> f64 {
        if self.initial_balance == 0.0 {
            return 0.0;
        }
        self.net_profit() / self.initial_balance * 100.0
    }
}
