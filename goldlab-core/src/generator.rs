//! Strategy generation: combines pattern detections and news sentiment into
//! candidate strategies.
//!
//! Rules run as a cascade:
//! 1. strong bullish pattern + high-impact positive news → "Pattern + News Bullish"
//! 2. strong bearish pattern + high-impact negative news → "Pattern + News Bearish"
//!    (independent of rule 1; both may fire)
//! 3. nothing yet → one strategy per pattern, first two patterns
//! 4. still nothing → one strategy per news item, first two items
//!
//! Output is fully determined by the inputs.

use crate::domain::{
    Direction, Impact, PatternDetection, Sentiment, SentimentRecord, Strategy,
};

/// A pattern must be strictly more confident than this to join a combo rule.
pub const STRONG_CONFIDENCE: f64 = 0.75;

/// How many inputs the fallback rules turn into strategies.
pub const FALLBACK_LIMIT: usize = 2;

pub fn generate_strategies(
    patterns: &[PatternDetection],
    sentiments: &[SentimentRecord],
) -> Vec<Strategy> {
    let mut strategies = Vec::new();

    if let Some(s) = combo_strategy(patterns, sentiments, Direction::Bullish) {
        strategies.push(s);
    }
    if let Some(s) = combo_strategy(patterns, sentiments, Direction::Bearish) {
        strategies.push(s);
    }

    if strategies.is_empty() {
        strategies.extend(
            patterns
                .iter()
                .take(FALLBACK_LIMIT)
                .enumerate()
                .map(|(i, p)| pattern_strategy(i, p)),
        );
    }

    if strategies.is_empty() {
        strategies.extend(
            sentiments
                .iter()
                .take(FALLBACK_LIMIT)
                .enumerate()
                .map(|(i, n)| news_strategy(i, n)),
        );
    }

    tracing::debug!(
        patterns = patterns.len(),
        sentiments = sentiments.len(),
        strategies = strategies.len(),
        "strategy generation complete"
    );
    strategies
}

fn combo_strategy(
    patterns: &[PatternDetection],
    sentiments: &[SentimentRecord],
    direction: Direction,
) -> Option<Strategy> {
    let polarity = match direction {
        Direction::Bullish => Sentiment::Positive,
        Direction::Bearish => Sentiment::Negative,
    };

    let strong: Vec<&PatternDetection> = patterns
        .iter()
        .filter(|p| p.direction == direction && p.confidence > STRONG_CONFIDENCE)
        .collect();
    let headline = sentiments
        .iter()
        .find(|n| n.sentiment == polarity && n.impact == Impact::High)?;
    if strong.is_empty() {
        return None;
    }

    let names = strong
        .iter()
        .map(|p| p.pattern.label())
        .collect::<Vec<_>>()
        .join(", ");

    let strategy = match direction {
        Direction::Bullish => Strategy {
            id: "bullish-combo".into(),
            name: "Pattern + News Bullish".into(),
            description: format!(
                "Strong bullish pattern(s) ({names}) and positive news detected: {}",
                headline.title
            ),
            entry_conditions: vec![
                "Bullish technical pattern detected".into(),
                "High-impact positive news sentiment".into(),
            ],
            exit_conditions: vec![
                "Pattern invalidated".into(),
                "Negative news emerges".into(),
            ],
            stop_loss: 1.2,
            take_profit: 2.5,
            timeframe: "1D".into(),
            risk_reward: 2.1,
            expected_win_rate: 0.6,
            bias: Some(Direction::Bullish),
        },
        Direction::Bearish => Strategy {
            id: "bearish-combo".into(),
            name: "Pattern + News Bearish".into(),
            description: format!(
                "Strong bearish pattern(s) ({names}) and negative news detected: {}",
                headline.title
            ),
            entry_conditions: vec![
                "Bearish technical pattern detected".into(),
                "High-impact negative news sentiment".into(),
            ],
            exit_conditions: vec![
                "Pattern invalidated".into(),
                "Positive news emerges".into(),
            ],
            stop_loss: 1.5,
            take_profit: 3.0,
            timeframe: "1D".into(),
            risk_reward: 2.0,
            expected_win_rate: 0.55,
            bias: Some(Direction::Bearish),
        },
    };
    Some(strategy)
}

fn pattern_strategy(index: usize, pattern: &PatternDetection) -> Strategy {
    let label = pattern.pattern.label();
    Strategy {
        id: format!("pattern-strategy-{index}"),
        name: format!("{label} Strategy"),
        description: format!("Trade based on detected pattern: {label}"),
        entry_conditions: vec![pattern.description.clone()],
        exit_conditions: vec!["Pattern invalidated".into()],
        stop_loss: 1.0,
        take_profit: 2.0,
        timeframe: pattern.timeframe.clone(),
        risk_reward: 2.0,
        expected_win_rate: 0.5 + 0.2 * pattern.confidence,
        bias: Some(pattern.direction),
    }
}

fn news_strategy(index: usize, news: &SentimentRecord) -> Strategy {
    let (tone, bias) = match news.sentiment {
        Sentiment::Positive => ("Bullish", Some(Direction::Bullish)),
        Sentiment::Negative => ("Bearish", Some(Direction::Bearish)),
        Sentiment::Neutral => ("Neutral", None),
    };
    Strategy {
        id: format!("news-strategy-{index}"),
        name: format!("News Sentiment {tone}"),
        description: format!("Trade based on high-impact news: {}", news.title),
        entry_conditions: vec![news.summary.clone()],
        exit_conditions: vec!["Sentiment reverses".into()],
        stop_loss: 1.0,
        take_profit: 2.0,
        timeframe: "1D".into(),
        risk_reward: 2.0,
        expected_win_rate: 0.5,
        bias,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PatternKind;

    fn pattern(kind: PatternKind, confidence: f64) -> PatternDetection {
        PatternDetection::new(kind, 4, "2024-02-05", "1D", confidence, format!("{kind} seen"))
    }

    fn news(sentiment: Sentiment, score: f64, title: &str) -> SentimentRecord {
        SentimentRecord {
            id: title.to_lowercase(),
            title: title.into(),
            summary: format!("{title} summary"),
            source_url: String::new(),
            source: "Wire".into(),
            date: "2024-02-05".into(),
            sentiment,
            score,
            impact: Impact::from_score(score),
        }
    }

    #[test]
    fn empty_inputs_yield_nothing() {
        assert!(generate_strategies(&[], &[]).is_empty());
    }

    #[test]
    fn bullish_combo_names_all_strong_patterns_and_first_headline() {
        let patterns = [
            pattern(PatternKind::DoubleBottom, 0.9),
            pattern(PatternKind::GoldenCross, 0.86),
            pattern(PatternKind::DoubleBottom, 0.75), // not strictly above threshold
        ];
        let sentiments = [
            news(Sentiment::Positive, 0.3, "Medium impact"),
            news(Sentiment::Positive, 0.8, "Gold surges"),
            news(Sentiment::Positive, 0.9, "Gold soars"),
        ];
        let out = generate_strategies(&patterns, &sentiments);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "Pattern + News Bullish");
        assert_eq!(
            out[0].description,
            "Strong bullish pattern(s) (Double Bottom, Golden Cross) and positive news detected: Gold surges"
        );
        assert_eq!(out[0].stop_loss, 1.2);
        assert_eq!(out[0].take_profit, 2.5);
        assert_eq!(out[0].risk_reward, 2.1);
        assert_eq!(out[0].expected_win_rate, 0.6);
    }

    #[test]
    fn both_combos_can_fire() {
        let patterns = [
            pattern(PatternKind::DoubleBottom, 0.9),
            pattern(PatternKind::HeadAndShoulders, 0.8),
        ];
        let sentiments = [
            news(Sentiment::Negative, -0.7, "Gold slumps"),
            news(Sentiment::Positive, 0.6, "Gold climbs"),
        ];
        let names: Vec<String> = generate_strategies(&patterns, &sentiments)
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["Pattern + News Bullish", "Pattern + News Bearish"]);
    }

    #[test]
    fn pattern_fallback_takes_first_two() {
        let patterns = [
            pattern(PatternKind::HeadAndShoulders, 0.7),
            pattern(PatternKind::DoubleBottom, 0.5),
            pattern(PatternKind::GoldenCross, 0.9),
        ];
        let out = generate_strategies(&patterns, &[news(Sentiment::Neutral, 0.0, "Flat")]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name, "Head and Shoulders Strategy");
        assert_eq!(out[0].id, "pattern-strategy-0");
        assert_eq!(out[0].entry_conditions, vec!["Head and Shoulders seen".to_string()]);
        assert!((out[0].expected_win_rate - 0.64).abs() < 1e-12);
        assert_eq!(out[1].name, "Double Bottom Strategy");
        assert_eq!(out[1].bias, Some(Direction::Bullish));
    }

    #[test]
    fn news_fallback_names_by_polarity() {
        let sentiments = [
            news(Sentiment::Negative, -0.1, "Dip"),
            news(Sentiment::Neutral, 0.0, "Flat"),
            news(Sentiment::Positive, 0.9, "Ignored third"),
        ];
        let out = generate_strategies(&[], &sentiments);
        let names: Vec<&str> = out.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["News Sentiment Bearish", "News Sentiment Neutral"]);
        assert_eq!(out[0].description, "Trade based on high-impact news: Dip");
        assert_eq!(out[1].bias, None);
        assert!(out.iter().all(|s| s.expected_win_rate == 0.5));
    }

    #[test]
    fn combo_suppresses_fallbacks() {
        let patterns = [
            pattern(PatternKind::GoldenCross, 0.95),
            pattern(PatternKind::HeadAndShoulders, 0.6),
        ];
        let sentiments = [news(Sentiment::Positive, 0.55, "Rally")];
        let out = generate_strategies(&patterns, &sentiments);
        assert_eq!(out.len(), 1);
        assert!(out.iter().all(|s| !s.id.starts_with("pattern-") && !s.id.starts_with("news-")));
    }
}
