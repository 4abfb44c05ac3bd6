//! Infrastructure Layer
//!
//! HTTP clients for the external services and the on-disk feed cache.

pub mod ensemble;
pub mod feed_cache;
pub mod mail_relay;
pub mod zoom;

use std::time::Duration;

use crate::domain::ports::UpstreamError;

/// Timeout applied to every upstream call
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared HTTP client for the upstream adapters
pub fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(UPSTREAM_TIMEOUT)
        .user_agent(concat!("forms/", env!("CARGO_PKG_VERSION")))
        .build()
}

fn connection_error(service: &'static str, err: reqwest::Error) -> UpstreamError {
    UpstreamError::Connection {
        service,
        detail: err.to_string(),
    }
}
