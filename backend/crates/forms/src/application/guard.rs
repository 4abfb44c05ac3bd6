//! Request Guard
//!
//! Rate limiting and CSRF checks shared by every use case.

use std::sync::Arc;

use platform::csrf::CsrfTokenService;
use platform::rate_limit::{RateLimitConfig, RateLimitStore, RateLimiter};

use crate::error::{FormError, FormResult};

/// Security checks run before any endpoint logic
pub struct RequestGuard<S> {
    limiter: RateLimiter<S>,
    csrf: Arc<CsrfTokenService>,
}

impl<S> RequestGuard<S>
where
    S: RateLimitStore + Send + Sync,
{
    pub fn new(limiter: RateLimiter<S>, csrf: Arc<CsrfTokenService>) -> Self {
        Self { limiter, csrf }
    }

    pub fn csrf(&self) -> &CsrfTokenService {
        &self.csrf
    }

    /// Count this request against `limit`, rejecting it when over the limit
    pub async fn admit(&self, client_key: &str, limit: &RateLimitConfig) -> FormResult<()> {
        self.limiter.maybe_sweep().await;

        let decision = self.limiter.check_and_record(client_key, limit).await?;
        if !decision.allowed {
            return Err(FormError::RateLimited {
                retry_after_secs: decision.retry_after_secs,
            });
        }

        tracing::debug!(client_key = %client_key, remaining = decision.remaining, "Request admitted");
        Ok(())
    }

    /// Verify a submitted CSRF token
    pub fn verify_csrf(&self, token: Option<&str>) -> FormResult<()> {
        match token {
            Some(token) if self.csrf.verify(token) => Ok(()),
            _ => Err(FormError::InvalidCsrfToken),
        }
    }
}
