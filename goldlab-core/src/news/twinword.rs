//! Twinword sentiment analysis (`POST /api/v7/text/sentiment/`).
//!
//! The response `score` is sometimes a JSON number and sometimes a numeric
//! string; both are accepted.

use super::SentimentScorer;
use crate::data::circuit_breaker::CircuitBreaker;
use crate::data::http::{build_client, key_from_env, send_with_retry, RetryPolicy};
use crate::data::DataError;
use crate::domain::{Sentiment, SentimentScore};
use serde::Deserialize;
use std::sync::Arc;

const SENTIMENT_URL: &str = "https://api.twinword.com/api/v7/text/sentiment/";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
pub(crate) struct SentimentResponse {
    #[serde(rename = "type")]
    kind: Option<String>,
    score: Option<NumberOrString>,
    #[serde(default)]
    result_msg: Option<String>,
}

pub struct TwinwordScorer {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
    api_key: String,
}

impl TwinwordScorer {
    pub fn new(api_key: impl Into<String>, circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        Ok(Self {
            client: build_client()?,
            circuit_breaker,
            // Failures degrade to neutral per item, so retry less.
            retry: RetryPolicy {
                max_retries: 1,
                ..RetryPolicy::default()
            },
            api_key: api_key.into(),
        })
    }

    pub fn from_env(env_var: &str, circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        Self::new(key_from_env(env_var)?, circuit_breaker)
    }

    pub(crate) fn parse_response(resp: SentimentResponse) -> Result<SentimentScore, DataError> {
        let polarity = match resp.kind.as_deref() {
            Some("positive") => Sentiment::Positive,
            Some("negative") => Sentiment::Negative,
            Some("neutral") => Sentiment::Neutral,
            other => {
                return Err(DataError::ResponseFormatChanged(format!(
                    "Sentiment API error: unexpected type {other:?} ({})",
                    resp.result_msg.as_deref().unwrap_or("no message")
                )))
            }
        };
        let score = match resp.score {
            Some(NumberOrString::Number(n)) => n,
            Some(NumberOrString::Text(s)) => s.trim().parse::<f64>().map_err(|_| {
                DataError::ResponseFormatChanged(format!("Sentiment API error: score '{s}'"))
            })?,
            None => {
                return Err(DataError::ResponseFormatChanged(
                    "Sentiment API error: missing score".into(),
                ))
            }
        };
        if !score.is_finite() {
            return Err(DataError::ResponseFormatChanged(format!(
                "Sentiment API error: score {score}"
            )));
        }
        Ok(SentimentScore { polarity, score })
    }
}

impl SentimentScorer for TwinwordScorer {
    fn name(&self) -> &str {
        "twinword"
    }

    fn score(&self, text: &str) -> Result<SentimentScore, DataError> {
        let resp = send_with_retry("Twinword", &self.circuit_breaker, self.retry, || {
            self.client
                .post(SENTIMENT_URL)
                .header("X-Twaip-Key", &self.api_key)
                .form(&[("text", text)])
        })?;
        let parsed: SentimentResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("Sentiment API error: {e}"))
        })?;
        Self::parse_response(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<SentimentScore, DataError> {
        TwinwordScorer::parse_response(serde_json::from_str(body).unwrap())
    }

    #[test]
    fn numeric_score() {
        let s = parse(r#"{"type": "positive", "score": 0.62, "ratio": 1}"#).unwrap();
        assert_eq!(s.polarity, Sentiment::Positive);
        assert_eq!(s.score, 0.62);
    }

    #[test]
    fn string_score() {
        let s = parse(r#"{"type": "negative", "score": "-0.31"}"#).unwrap();
        assert_eq!(s.polarity, Sentiment::Negative);
        assert_eq!(s.score, -0.31);
    }

    #[test]
    fn unknown_type_is_an_error() {
        assert!(parse(r#"{"result_msg": "Invalid key", "score": 0}"#).is_err());
    }

    #[test]
    fn garbage_score_is_an_error() {
        assert!(parse(r#"{"type": "neutral", "score": "n/a"}"#).is_err());
    }
}
