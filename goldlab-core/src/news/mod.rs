//! News feeds and sentiment scoring.
//!
//! `NewsFeed` and `SentimentScorer` are the narrow collaborator interfaces;
//! `score_news` joins them. Scoring failures never propagate: each failed item
//! becomes a neutral record with score 0 and low impact.

pub mod json_feed;
pub mod keyword;
pub mod serper;
pub mod twinword;

pub use json_feed::JsonNewsFeed;
pub use keyword::KeywordScorer;
pub use serper::SerperNewsFeed;
pub use twinword::TwinwordScorer;

use crate::data::DataError;
use crate::domain::{RawNewsItem, SentimentRecord, SentimentScore};

/// Trait for news sources.
pub trait NewsFeed: Send + Sync {
    fn name(&self) -> &str;

    /// Identifies where this feed's items come from.
    fn cache_identity(&self) -> String {
        self.name().to_string()
    }

    /// Fetch up to `count` recent items, most relevant first.
    fn fetch(&self, count: usize) -> Result<Vec<RawNewsItem>, DataError>;
}

/// Trait for sentiment scorers.
pub trait SentimentScorer: Send + Sync {
    fn name(&self) -> &str;

    /// Polarity and score (typically within [-1, 1]) for a piece of text.
    fn score(&self, text: &str) -> Result<SentimentScore, DataError>;
}

/// Score every item in order. Items the scorer fails on degrade to neutral.
pub fn score_news(items: Vec<RawNewsItem>, scorer: &dyn SentimentScorer) -> Vec<SentimentRecord> {
    items
        .into_iter()
        .map(|item| match scorer.score(&item.scoring_text()) {
            Ok(score) => SentimentRecord::scored(item, score),
            Err(e) => {
                tracing::warn!(
                    id = %item.id,
                    scorer = scorer.name(),
                    error = %e,
                    "sentiment scoring failed, using neutral"
                );
                SentimentRecord::neutral(item)
            }
        })
        .collect()
}

/// Fetch `count` items and score them. Only a feed failure is an error.
pub fn fetch_scored_news(
    feed: &dyn NewsFeed,
    scorer: &dyn SentimentScorer,
    count: usize,
) -> Result<Vec<SentimentRecord>, DataError> {
    let items = feed.fetch(count)?;
    tracing::debug!(feed = feed.name(), count = items.len(), "fetched news");
    Ok(score_news(items, scorer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Impact, Sentiment};

    struct FailsOn(&'static str);

    impl SentimentScorer for FailsOn {
        fn name(&self) -> &str {
            "fails_on"
        }

        fn score(&self, text: &str) -> Result<SentimentScore, DataError> {
            if text.contains(self.0) {
                return Err(DataError::NetworkUnreachable("down".into()));
            }
            Ok(SentimentScore {
                polarity: Sentiment::Positive,
                score: 0.8,
            })
        }
    }

    struct FixedFeed(Vec<RawNewsItem>);

    impl NewsFeed for FixedFeed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn fetch(&self, count: usize) -> Result<Vec<RawNewsItem>, DataError> {
            Ok(self.0.iter().take(count).cloned().collect())
        }
    }

    fn item(id: &str, title: &str) -> RawNewsItem {
        RawNewsItem {
            id: id.into(),
            title: title.into(),
            snippet: "snippet".into(),
            link: format!("https://news.example/{id}"),
            source: "Example".into(),
            date: "1 hour ago".into(),
        }
    }

    #[test]
    fn failed_items_degrade_individually() {
        let items = vec![item("a", "Gold rallies"), item("b", "BROKEN"), item("c", "Gold gains")];
        let records = score_news(items, &FailsOn("BROKEN"));

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].sentiment, Sentiment::Positive);
        assert_eq!(records[0].impact, Impact::High);
        assert_eq!(records[1].sentiment, Sentiment::Neutral);
        assert_eq!(records[1].score, 0.0);
        assert_eq!(records[1].impact, Impact::Low);
        assert_eq!(records[1].title, "BROKEN");
        assert_eq!(records[2].id, "c");
    }

    #[test]
    fn fetch_scored_news_respects_count() {
        let feed = FixedFeed(vec![item("a", "One"), item("b", "Two"), item("c", "Three")]);
        let records = fetch_scored_news(&feed, &FailsOn("never"), 2).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].source_url, "https://news.example/b");
    }
}
