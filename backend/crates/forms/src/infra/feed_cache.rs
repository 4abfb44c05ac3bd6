//! File-backed feed cache
//!
//! The normalized posts are stored as one JSON file; its modification time
//! is the cache age.

use std::io;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use crate::domain::ports::{CachedFeed, FeedCache, FeedPost, UpstreamError};

const SERVICE: &str = "feed cache";

#[derive(Debug, Clone)]
pub struct FileFeedCache {
    path: PathBuf,
}

impl FileFeedCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn storage(source: io::Error) -> UpstreamError {
    UpstreamError::Storage {
        service: SERVICE,
        source,
    }
}

impl FeedCache for FileFeedCache {
    async fn load(&self, max_age: Duration) -> Result<Option<CachedFeed>, UpstreamError> {
        let metadata = match tokio::fs::metadata(&self.path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage(e)),
        };

        let modified = metadata.modified().map_err(storage)?;
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or_default();
        if age > max_age {
            return Ok(None);
        }

        let contents = tokio::fs::read_to_string(&self.path).await.map_err(storage)?;
        let posts: Vec<FeedPost> = serde_json::from_str(&contents)
            .map_err(|e| storage(io::Error::new(io::ErrorKind::InvalidData, e)))?;

        Ok(Some(CachedFeed {
            posts,
            age_secs: age.as_secs(),
        }))
    }

    async fn store(&self, posts: &[FeedPost]) -> Result<(), UpstreamError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(storage)?;
        }

        let json = serde_json::to_string_pretty(posts)
            .map_err(|e| storage(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        tokio::fs::write(&self.path, json).await.map_err(storage)
    }
}
