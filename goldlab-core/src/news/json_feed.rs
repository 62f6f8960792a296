//! News items from a local JSON file (an array of raw news items).

use super::NewsFeed;
use crate::data::DataError;
use crate::domain::RawNewsItem;
use std::fs;
use std::path::PathBuf;

pub struct JsonNewsFeed {
    path: PathBuf,
}

impl JsonNewsFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl NewsFeed for JsonNewsFeed {
    fn name(&self) -> &str {
        "json"
    }

    fn cache_identity(&self) -> String {
        format!("json:{}@{}", self.path.display(), crate::data::file_stamp(&self.path))
    }

    fn fetch(&self, count: usize) -> Result<Vec<RawNewsItem>, DataError> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| DataError::Other(format!("{}: {e}", self.path.display())))?;
        let mut items: Vec<RawNewsItem> = serde_json::from_str(&content).map_err(|e| {
            DataError::ResponseFormatChanged(format!("{}: {e}", self.path.display()))
        })?;
        items.truncate(count);
        Ok(items)
    }
}
