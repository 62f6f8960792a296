//! One-paragraph text summaries of each stage's output.
//!
//! Every summary is `None` when its stage produced nothing.

use goldlab_core::domain::{BacktestResult, Impact, PatternDetection, Sentiment, SentimentRecord, Strategy};

use crate::pipeline::PipelineOutcome;

/// Headlines quoted in the news summary.
const TOP_HEADLINES: usize = 2;

/// "10 articles analyzed. Mostly positive sentiment for XAUUSD. High-impact headlines: ..."
pub fn news_summary(news: &[SentimentRecord], market: &str) -> Option<String> {
    if news.is_empty() {
        return None;
    }
    let positive = news.iter().filter(|n| n.sentiment == Sentiment::Positive).count();
    let negative = news.iter().filter(|n| n.sentiment == Sentiment::Negative).count();
    let mood = match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => "Mostly positive",
        std::cmp::Ordering::Less => "Mostly negative",
        std::cmp::Ordering::Equal => "Mixed",
    };
    let headlines: Vec<&str> = news
        .iter()
        .filter(|n| n.impact == Impact::High)
        .take(TOP_HEADLINES)
        .map(|n| n.title.as_str())
        .collect();
    let headlines = if headlines.is_empty() {
        "None".to_string()
    } else {
        headlines.join(", ")
    };
    Some(format!(
        "{} articles analyzed. {mood} sentiment for {market}. High-impact headlines: {headlines}.",
        news.len()
    ))
}

pub fn pattern_summary(patterns: &[PatternDetection]) -> Option<String> {
    if patterns.is_empty() {
        return None;
    }
    let names: Vec<&str> = patterns.iter().map(|p| p.pattern.label()).collect();
    Some(format!(
        "{} technical patterns detected. {}.",
        patterns.len(),
        names.join(", ")
    ))
}

pub fn strategy_summary(strategies: &[Strategy]) -> Option<String> {
    if strategies.is_empty() {
        return None;
    }
    let names: Vec<&str> = strategies
        .iter()
        .map(|s| if s.name.is_empty() { s.id.as_str() } else { s.name.as_str() })
        .collect();
    Some(format!(
        "{} trading strategies generated. {}.",
        strategies.len(),
        names.join(", ")
    ))
}

/// Highest win rate wins; on a tie the later result is preferred.
pub fn best_result(results: &[BacktestResult]) -> Option<&BacktestResult> {
    results
        .iter()
        .reduce(|best, next| if best.win_rate > next.win_rate { best } else { next })
}

pub fn backtest_summary(results: &[BacktestResult]) -> Option<String> {
    let best = best_result(results)?;
    let net = best.net_profit();
    Some(format!(
        "Best strategy ({}) produced a {:.2}% {} over the last period, win rate {:.0}%.",
        best.strategy_id,
        best.return_pct(),
        if net >= 0.0 { "gain" } else { "loss" },
        best.win_rate * 100.0
    ))
}

/// Titled summaries for every stage that produced output, in stage order.
pub fn summarize(outcome: &PipelineOutcome, market: &str) -> Vec<(&'static str, String)> {
    [
        ("News Sentiment Summary", news_summary(&outcome.news, market)),
        ("Pattern Detection Summary", pattern_summary(&outcome.market.patterns)),
        ("Strategy Generation Summary", strategy_summary(&outcome.strategies)),
        ("Backtest Evaluation Summary", backtest_summary(&outcome.results)),
    ]
    .into_iter()
    .filter_map(|(title, text)| text.map(|t| (title, t)))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use goldlab_core::domain::PatternKind;

    fn record(sentiment: Sentiment, score: f64, title: &str) -> SentimentRecord {
        SentimentRecord {
            id: title.into(),
            title: title.into(),
            summary: String::new(),
            source_url: String::new(),
            source: String::new(),
            date: String::new(),
            sentiment,
            score,
            impact: Impact::from_score(score),
        }
    }

    fn result(strategy_id: &str, win_rate: f64, final_balance: f64) -> BacktestResult {
        BacktestResult {
            id: "0".into(),
            strategy_id: strategy_id.into(),
            start_date: String::new(),
            end_date: String::new(),
            initial_balance: 10_000.0,
            final_balance,
            total_trades: 10,
            winning_trades: 0,
            losing_trades: 0,
            win_rate,
            profit_factor: 0.0,
            max_drawdown: 0.0,
            sharpe_ratio: 0.0,
            average_trade: 0.0,
            trades: vec![],
        }
    }

    #[test]
    fn news_summary_mood_and_headlines() {
        let news = vec![
            record(Sentiment::Positive, 0.9, "Gold soars"),
            record(Sentiment::Positive, 0.8, "Bullion rallies"),
            record(Sentiment::Positive, 0.7, "Record demand"),
            record(Sentiment::Negative, -0.2, "Dollar firms"),
        ];
        assert_eq!(
            news_summary(&news, "XAUUSD").unwrap(),
            "4 articles analyzed. Mostly positive sentiment for XAUUSD. \
             High-impact headlines: Gold soars, Bullion rallies."
        );
    }

    #[test]
    fn news_summary_mixed_without_high_impact() {
        let news = vec![
            record(Sentiment::Positive, 0.1, "Up a bit"),
            record(Sentiment::Negative, -0.1, "Down a bit"),
        ];
        let text = news_summary(&news, "XAUUSD").unwrap();
        assert!(text.contains("Mixed sentiment"));
        assert!(text.ends_with("High-impact headlines: None."));
        assert!(news_summary(&[], "XAUUSD").is_none());
    }

    #[test]
    fn pattern_and_strategy_summaries() {
        let patterns = vec![PatternDetection::new(
            PatternKind::GoldenCross,
            60,
            "2024-03-29",
            "1D",
            0.9,
            "cross".into(),
        )];
        assert_eq!(
            pattern_summary(&patterns).unwrap(),
            "1 technical patterns detected. Golden Cross."
        );
        assert!(strategy_summary(&[]).is_none());
    }

    #[test]
    fn backtest_summary_picks_highest_win_rate() {
        let results = vec![
            result("a", 0.4, 10_500.0),
            result("b", 0.7, 9_900.0),
            result("c", 0.7, 10_250.0),
        ];
        assert_eq!(best_result(&results).unwrap().strategy_id, "c");
        assert_eq!(
            backtest_summary(&results).unwrap(),
            "Best strategy (c) produced a 2.50% gain over the last period, win rate 70%."
        );

        let losing = vec![result("only", 0.3, 9_900.0)];
        assert!(backtest_summary(&losing).unwrap().contains("-1.00% loss"));
    }
}
