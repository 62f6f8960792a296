//! Serper news search (`POST /news`).

use super::NewsFeed;
use crate::data::circuit_breaker::CircuitBreaker;
use crate::data::http::{build_client, key_from_env, send_with_retry, RetryPolicy};
use crate::data::DataError;
use crate::domain::RawNewsItem;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const NEWS_URL: &str = "https://google.serper.dev/news";

#[derive(Debug, Serialize)]
struct NewsRequest<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NewsResponse {
    news: Option<Vec<NewsEntry>>,
}

#[derive(Debug, Deserialize)]
struct NewsEntry {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    date: String,
}

pub struct SerperNewsFeed {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
    api_key: String,
    query: String,
}

impl SerperNewsFeed {
    pub fn new(
        query: impl Into<String>,
        api_key: impl Into<String>,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, DataError> {
        Ok(Self {
            client: build_client()?,
            circuit_breaker,
            retry: RetryPolicy::default(),
            api_key: api_key.into(),
            query: query.into(),
        })
    }

    pub fn from_env(
        query: impl Into<String>,
        env_var: &str,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, DataError> {
        Self::new(query, key_from_env(env_var)?, circuit_breaker)
    }

    /// Items keep the response order. The id is the link, or the position
    /// when the link is missing.
    pub(crate) fn parse_response(resp: NewsResponse) -> Result<Vec<RawNewsItem>, DataError> {
        let news = resp
            .news
            .ok_or_else(|| DataError::ResponseFormatChanged("News API error: no news array".into()))?;
        Ok(news
            .into_iter()
            .enumerate()
            .map(|(i, n)| RawNewsItem {
                id: if n.link.is_empty() { i.to_string() } else { n.link.clone() },
                title: n.title,
                snippet: n.snippet,
                link: n.link,
                source: n.source,
                date: n.date,
            })
            .collect())
    }
}

impl NewsFeed for SerperNewsFeed {
    fn name(&self) -> &str {
        "serper"
    }

    fn cache_identity(&self) -> String {
        format!("{NEWS_URL}?q={}", self.query)
    }

    fn fetch(&self, count: usize) -> Result<Vec<RawNewsItem>, DataError> {
        let body = NewsRequest {
            q: &self.query,
            num: count,
        };
        let resp = send_with_retry("Serper", &self.circuit_breaker, self.retry, || {
            self.client
                .post(NEWS_URL)
                .header("X-API-KEY", &self.api_key)
                .json(&body)
        })?;
        let parsed: NewsResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("News API error: {e}"))
        })?;
        Self::parse_response(parsed)
    }
}
