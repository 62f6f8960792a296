//! Artifact export: backtest results as JSON, the trade tape as CSV and the
//! stage summaries as plain text.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use goldlab_core::domain::BacktestResult;

use crate::pipeline::PipelineOutcome;
use crate::summary::summarize;

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_results_json(results: &[BacktestResult]) -> Result<String> {
    serde_json::to_string_pretty(results).context("failed to serialize backtest results to JSON")
}

pub fn import_results_json(json: &str) -> Result<Vec<BacktestResult>> {
    serde_json::from_str(json).context("failed to deserialize backtest results from JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Every trade of every result, one row each.
///
/// Columns: strategy_id, trade_id, direction, entry_date, entry_price,
/// exit_date, exit_price, stop_loss, take_profit, profit, profit_percentage
pub fn export_trades_csv(results: &[BacktestResult]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "strategy_id",
        "trade_id",
        "direction",
        "entry_date",
        "entry_price",
        "exit_date",
        "exit_price",
        "stop_loss",
        "take_profit",
        "profit",
        "profit_percentage",
    ])?;

    for result in results {
        for t in &result.trades {
            wtr.write_record([
                &result.strategy_id,
                &t.id,
                &format!("{:?}", t.direction),
                &t.entry_date,
                &format!("{:.4}", t.entry_price),
                &t.exit_date,
                &format!("{:.4}", t.exit_price),
                &format!("{:.4}", t.stop_loss),
                &format!("{:.4}", t.take_profit),
                &format!("{:.4}", t.profit),
                &format!("{:.4}", t.profit_percentage),
            ])?;
        }
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for one pipeline run.
///
/// Creates `{symbol}_{timestamp}/` under `output_dir` containing
/// `results.json`, `trades.csv` and `summary.txt`. Returns the directory.
pub fn save_artifacts(outcome: &PipelineOutcome, symbol: &str, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        symbol.replace(['/', '\\', ':'], ""),
        outcome.finished_at.format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("results.json"), export_results_json(&outcome.results)?)?;
    std::fs::write(run_dir.join("trades.csv"), export_trades_csv(&outcome.results)?)?;

    let market = symbol.replace('/', "");
    let summary: String = summarize(outcome, &market)
        .into_iter()
        .map(|(title, text)| format!("{title}\n{text}\n\n"))
        .collect();
    std::fs::write(run_dir.join("summary.txt"), summary)?;

    Ok(run_dir)
}

pub fn load_results(dir: &Path) -> Result<Vec<BacktestResult>> {
    let path = dir.join("results.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_results_json(&json)
}
