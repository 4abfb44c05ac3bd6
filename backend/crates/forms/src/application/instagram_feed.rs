//! Instagram Feed Use Case
//!
//! Serves the cached feed while it is fresh and refreshes it from the feed
//! provider otherwise. Cache failures degrade to a refresh.

use std::sync::Arc;

use platform::rate_limit::RateLimitStore;

use crate::application::config::FormsConfig;
use crate::application::guard::RequestGuard;
use crate::domain::ports::{FeedCache, FeedPost, FeedSource};
use crate::error::{FormError, FormResult};

/// Output DTO for the feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedOutput {
    pub posts: Vec<FeedPost>,
    /// Age of the cached copy, `None` when freshly fetched
    pub cache_age: Option<u64>,
}

/// Instagram Feed Use Case
pub struct InstagramFeedUseCase<S, F, C> {
    guard: Arc<RequestGuard<S>>,
    source: Arc<F>,
    cache: Arc<C>,
    config: Arc<FormsConfig>,
}

impl<S, F, C> InstagramFeedUseCase<S, F, C>
where
    S: RateLimitStore + Send + Sync,
    F: FeedSource + Send + Sync,
    C: FeedCache + Send + Sync,
{
    pub fn new(
        guard: Arc<RequestGuard<S>>,
        source: Arc<F>,
        cache: Arc<C>,
        config: Arc<FormsConfig>,
    ) -> Self {
        Self {
            guard,
            source,
            cache,
            config,
        }
    }

    pub async fn execute(&self, client_key: &str) -> FormResult<FeedOutput> {
        if !self.config.feed_missing.is_empty() {
            return Err(FormError::Configuration(self.config.feed_missing.clone()));
        }

        self.guard
            .admit(client_key, &self.config.limits.instagram_feed)
            .await?;

        match self.cache.load(self.config.feed_cache_duration).await {
            Ok(Some(cached)) => {
                return Ok(FeedOutput {
                    posts: cached.posts,
                    cache_age: Some(cached.age_secs),
                });
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Feed cache unreadable, refreshing");
            }
        }

        let posts = self
            .source
            .fetch_posts(&self.config.instagram_username, self.config.feed_post_count)
            .await
            .map_err(FormError::Feed)?;

        if let Err(e) = self.cache.store(&posts).await {
            tracing::warn!(error = %e, "Failed to write feed cache");
        }

        tracing::info!(posts = posts.len(), "Feed refreshed");

        Ok(FeedOutput {
            posts,
            cache_age: None,
        })
    }
}
