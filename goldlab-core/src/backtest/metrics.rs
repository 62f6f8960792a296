//! Result metrics: pure functions over a trade list.
//!
//! Every metric is a pure function: trade list and/or balance curve in, scalar
//! out. No dependencies on the replay, data feeds, or orchestrator.

use crate::domain::{BacktestResult, SimulatedTrade};

/// Profit factor reported when there are winners and no losers.
pub const PROFIT_FACTOR_SENTINEL: f64 = 999.0;

/// Aggregate a trade list into a `BacktestResult`.
pub fn aggregate(
    id: String,
    strategy_id: &str,
    start_date: String,
    end_date: String,
    initial_balance: f64,
    trades: Vec<SimulatedTrade>,
) -> BacktestResult {
    let net: f64 = trades.iter().map(|t| t.profit).sum();
    let curve = balance_curve(initial_balance, &trades);
    BacktestResult {
        id,
        strategy_id: strategy_id.to_string(),
        start_date,
        end_date,
        initial_balance,
        final_balance: initial_balance + net,
        total_trades: trades.len(),
        winning_trades: trades.iter().filter(|t| t.is_winner()).count(),
        losing_trades: trades.iter().filter(|t| t.is_loser()).count(),
        win_rate: win_rate(&trades),
        profit_factor: profit_factor(&trades),
        max_drawdown: max_drawdown_pct(&curve),
        sharpe_ratio: sharpe_ratio(&trades),
        average_trade: average_trade(&trades),
        trades,
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Win rate: fraction of trades with positive profit.
pub fn win_rate(trades: &[SimulatedTrade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Profit factor: gross profits / gross losses.
///
/// `PROFIT_FACTOR_SENTINEL` when there are profits but no losses, 0.0 when
/// there are no profits at all.
pub fn profit_factor(trades: &[SimulatedTrade]) -> f64 {
    let gross_profit: f64 = trades
        .iter()
        .filter(|t| t.profit > 0.0)
        .map(|t| t.profit)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.profit < 0.0)
        .map(|t| t.profit.abs())
        .sum();

    if gross_profit <= 0.0 {
        return 0.0;
    }
    if gross_loss <= 0.0 {
        return PROFIT_FACTOR_SENTINEL;
    }
    gross_profit / gross_loss
}

/// Arithmetic mean profit per trade.
pub fn average_trade(trades: &[SimulatedTrade]) -> f64 {
    let profits: Vec<f64> = trades.iter().map(|t| t.profit).collect();
    mean_f64(&profits)
}

/// Running balance: the initial balance followed by the balance after each trade.
pub fn balance_curve(initial_balance: f64, trades: &[SimulatedTrade]) -> Vec<f64> {
    let mut curve = Vec::with_capacity(trades.len() + 1);
    let mut balance = initial_balance;
    curve.push(balance);
    for trade in trades {
        balance += trade.profit;
        curve.push(balance);
    }
    curve
}

/// Maximum peak-to-trough decline as a positive percentage (15.0 = 15%).
///
/// Returns 0.0 if the curve never falls below a previous peak.
pub fn max_drawdown_pct(curve: &[f64]) -> f64 {
    let Some(&first) = curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &balance in curve {
        if balance > peak {
            peak = balance;
        }
        if peak > 0.0 {
            let dd = (peak - balance) / peak * 100.0;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Per-trade Sharpe: mean / sample stdev of `profit_percentage`.
///
/// Not annualized. Returns 0.0 for fewer than two trades or zero variance.
pub fn sharpe_ratio(trades: &[SimulatedTrade]) -> f64 {
    let returns: Vec<f64> = trades.iter().map(|t| t.profit_percentage).collect();
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(&returns) / std
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
