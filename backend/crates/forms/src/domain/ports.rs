//! Ports
//!
//! Interfaces to the third-party services the endpoints delegate to.
//! Implementations live in the infrastructure layer.

use std::time::Duration;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::messages::MailMessage;

/// Failure talking to an external service
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The request never produced a response (DNS, TLS, timeout, ...)
    #[error("{service} connection error: {detail}")]
    Connection { service: &'static str, detail: String },

    /// The service answered with an unexpected status code
    #[error("{service} returned HTTP {status}")]
    Status { service: &'static str, status: u16 },

    /// The response body is not what the service documents
    #[error("{service} returned an invalid response: {detail}")]
    InvalidResponse { service: &'static str, detail: String },

    /// Local storage backing an external resource failed
    #[error("{service} storage error: {source}")]
    Storage {
        service: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl UpstreamError {
    pub fn service(&self) -> &'static str {
        match self {
            Self::Connection { service, .. }
            | Self::Status { service, .. }
            | Self::InvalidResponse { service, .. }
            | Self::Storage { service, .. } => service,
        }
    }
}

// ============================================================================
// Mail
// ============================================================================

/// Transactional mail relay
#[trait_variant::make(Mailer: Send)]
pub trait LocalMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), UpstreamError>;
}

// ============================================================================
// Meetings
// ============================================================================

/// Scheduled video meeting to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingRequest {
    pub topic: String,
    /// Local wall-clock start in `timezone`
    pub start_time: NaiveDateTime,
    pub duration_minutes: u16,
    pub timezone: String,
    pub agenda: String,
}

/// Created meeting as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meeting {
    pub id: String,
    pub password: String,
    /// Participant link
    pub join_url: String,
    /// Host link
    pub start_url: String,
}

/// Video meeting provider
#[trait_variant::make(MeetingProvider: Send)]
pub trait LocalMeetingProvider {
    async fn create_meeting(&self, request: &MeetingRequest) -> Result<Meeting, UpstreamError>;
}

// ============================================================================
// Social feed
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

/// Normalized feed post, as served to the frontend and stored in the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPost {
    pub id: String,
    pub caption: String,
    pub media_url: String,
    pub permalink: String,
    /// Unix seconds
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub likes: u64,
    pub comments: u64,
}

/// Source of recent posts for an account
#[trait_variant::make(FeedSource: Send)]
pub trait LocalFeedSource {
    async fn fetch_posts(&self, username: &str, count: usize) -> Result<Vec<FeedPost>, UpstreamError>;
}

/// Cached feed together with its age
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedFeed {
    pub posts: Vec<FeedPost>,
    pub age_secs: u64,
}

/// Cache for the normalized feed
#[trait_variant::make(FeedCache: Send)]
pub trait LocalFeedCache {
    /// Cached posts no older than `max_age`, if any
    async fn load(&self, max_age: Duration) -> Result<Option<CachedFeed>, UpstreamError>;

    /// Replace the cached posts
    async fn store(&self, posts: &[FeedPost]) -> Result<(), UpstreamError>;
}
