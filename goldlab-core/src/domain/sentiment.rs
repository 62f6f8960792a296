//! News items and their scored sentiment.

use serde::{Deserialize, Serialize};

/// Sentiment polarity as reported by the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Impact tier derived from the absolute sentiment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    High,
    Medium,
    Low,
}

impl Impact {
    /// `|score| > 0.5` is high, `> 0.2` medium, anything else low.
    pub fn from_score(score: f64) -> Self {
        let magnitude = score.abs();
        if magnitude > 0.5 {
            Impact::High
        } else if magnitude > 0.2 {
            Impact::Medium
        } else {
            Impact::Low
        }
    }
}

/// A raw news item as returned by the news feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNewsItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub date: String,
}

impl RawNewsItem {
    /// Text handed to the sentiment scorer.
    pub fn scoring_text(&self) -> String {
        format!("{}. {}", self.title, self.snippet)
    }
}

/// Scorer output for one piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub polarity: Sentiment,
    pub score: f64,
}

/// A news item annotated with polarity, numeric score and impact tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentRecord {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub source_url: String,
    pub source: String,
    pub date: String,
    pub sentiment: Sentiment,
    /// Typically within [-1, 1].
    pub score: f64,
    pub impact: Impact,
}

impl SentimentRecord {
    pub fn scored(item: RawNewsItem, score: SentimentScore) -> Self {
        Self {
            id: item.id,
            title: item.title,
            summary: item.snippet,
            source_url: item.link,
            source: item.source,
            date: item.date,
            sentiment: score.polarity,
            score: score.score,
            impact: Impact::from_score(score.score),
        }
    }

    /// Record used when scoring an item failed.
    pub fn neutral(item: RawNewsItem) -> Self {
        Self::scored(
            item,
            SentimentScore {
                polarity: Sentiment::Neutral,
                score: 0.0,
            },
        )
    }
}
