//! Offline lexicon scorer for gold-market headlines.
//!
//! Counts bullish and bearish terms; `score = (pos - neg) / (pos + neg)`,
//! 0 when neither appears. Never fails.

use super::SentimentScorer;
use crate::data::DataError;
use crate::domain::{Sentiment, SentimentScore};

const POSITIVE: &[&str] = &[
    "surge", "surges", "soar", "soars", "rally", "rallies", "gain", "gains", "climb", "climbs",
    "rise", "rises", "jump", "jumps", "record", "high", "strong demand", "safe haven",
    "bullish", "rebound", "rebounds", "boost", "boosts",
];

const NEGATIVE: &[&str] = &[
    "plunge", "plunges", "plummet", "plummets", "fall", "falls", "drop", "drops", "slump",
    "slumps", "slide", "slides", "decline", "declines", "low", "selling pressure", "sell-off",
    "bearish", "tumble", "tumbles", "weak", "weakens",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordScorer;

impl KeywordScorer {
    fn count(words: &[String], text: &str, lexicon: &[&str]) -> usize {
        lexicon
            .iter()
            .map(|term| {
                if term.contains(' ') {
                    text.matches(term).count()
                } else {
                    words.iter().filter(|w| w.as_str() == *term).count()
                }
            })
            .sum()
    }

    pub fn analyze(text: &str) -> SentimentScore {
        let lower = text.to_lowercase();
        let words: Vec<String> = lower
            .split(|c: char| !(c.is_alphanumeric() || c == '-'))
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();

        let pos = Self::count(&words, &lower, POSITIVE) as f64;
        let neg = Self::count(&words, &lower, NEGATIVE) as f64;
        if pos + neg == 0.0 {
            return SentimentScore {
                polarity: Sentiment::Neutral,
                score: 0.0,
            };
        }

        let score = (pos - neg) / (pos + neg);
        let polarity = if score > 0.0 {
            Sentiment::Positive
        } else if score < 0.0 {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        };
        SentimentScore { polarity, score }
    }
}

impl SentimentScorer for KeywordScorer {
    fn name(&self) -> &str {
        "keyword"
    }

    fn score(&self, text: &str) -> Result<SentimentScore, DataError> {
        Ok(Self::analyze(text))
    }
}
