//! Issue CSRF Token Use Case

use std::sync::Arc;

use platform::rate_limit::RateLimitStore;

use crate::application::config::FormsConfig;
use crate::application::guard::RequestGuard;
use crate::error::FormResult;

/// Issue CSRF Token Use Case
pub struct IssueTokenUseCase<S> {
    guard: Arc<RequestGuard<S>>,
    config: Arc<FormsConfig>,
}

impl<S> IssueTokenUseCase<S>
where
    S: RateLimitStore + Send + Sync,
{
    pub fn new(guard: Arc<RequestGuard<S>>, config: Arc<FormsConfig>) -> Self {
        Self { guard, config }
    }

    pub async fn execute(&self, client_key: &str) -> FormResult<String> {
        self.guard
            .admit(client_key, &self.config.limits.csrf_token)
            .await?;

        let token = self.guard.csrf().issue();

        tracing::debug!("Issued CSRF token");

        Ok(token)
    }
}
