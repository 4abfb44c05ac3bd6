//! Application Configuration
//!
//! Configuration for the form endpoints, built once from [`Settings`].

use std::time::Duration;

use platform::config::{ConfigError, Settings};
use platform::rate_limit::RateLimitConfig;

/// Keys the contact endpoint needs
pub const CONTACT_KEYS: &[&str] = &["ADMIN_EMAIL", "FROM_EMAIL", "MAIL_RELAY_URL"];

/// Keys the booking endpoint needs
pub const BOOKING_KEYS: &[&str] = &[
    "ADMIN_EMAIL",
    "FROM_EMAIL",
    "MAIL_RELAY_URL",
    "ZOOM_ACCOUNT_ID",
    "ZOOM_CLIENT_ID",
    "ZOOM_CLIENT_SECRET",
];

/// Keys the feed endpoint needs
pub const FEED_KEYS: &[&str] = &["ENSEMBLEDATA_API_TOKEN", "INSTAGRAM_USERNAME"];

/// Per-endpoint request limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointLimits {
    pub csrf_token: RateLimitConfig,
    pub contact: RateLimitConfig,
    pub booking: RateLimitConfig,
    pub instagram_feed: RateLimitConfig,
}

impl Default for EndpointLimits {
    fn default() -> Self {
        Self {
            csrf_token: RateLimitConfig::new(20, 3600),
            contact: RateLimitConfig::new(5, 3600),
            booking: RateLimitConfig::new(5, 3600),
            instagram_feed: RateLimitConfig::new(10, 3600),
        }
    }
}

/// Form endpoints configuration
#[derive(Debug, Clone)]
pub struct FormsConfig {
    /// Expose upstream error detail to clients
    pub debug: bool,
    pub limits: EndpointLimits,
    /// Recipient of contact and booking notifications
    pub admin_email: String,
    pub instagram_username: String,
    /// Number of posts fetched per refresh
    pub feed_post_count: usize,
    pub feed_cache_duration: Duration,
    /// Missing settings, per endpoint
    pub contact_missing: Vec<String>,
    pub booking_missing: Vec<String>,
    pub feed_missing: Vec<String>,
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            debug: false,
            limits: EndpointLimits::default(),
            admin_email: String::new(),
            instagram_username: String::new(),
            feed_post_count: 12,
            feed_cache_duration: Duration::from_secs(3600),
            contact_missing: Vec::new(),
            booking_missing: Vec::new(),
            feed_missing: Vec::new(),
        }
    }
}

impl FormsConfig {
    /// Build from settings
    ///
    /// Missing endpoint settings are recorded, not rejected; the affected
    /// endpoint reports them per request. Unparsable numbers and a zero
    /// rate limit window are rejected.
    /// `RATE_LIMIT_MAX_REQUESTS` and `RATE_LIMIT_TIME_WINDOW` override the
    /// contact and booking limits.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let cache_secs = settings.parse_or("INSTAGRAM_CACHE_DURATION", 3600u64)?;

        let defaults = EndpointLimits::default();
        let window_secs =
            settings.parse_or("RATE_LIMIT_TIME_WINDOW", defaults.contact.window.as_secs())?;
        if window_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "RATE_LIMIT_TIME_WINDOW".to_string(),
                value: "0".to_string(),
            });
        }
        let form_limit = RateLimitConfig::new(
            settings.parse_or("RATE_LIMIT_MAX_REQUESTS", defaults.contact.max_requests)?,
            window_secs,
        );

        Ok(Self {
            debug: settings.flag("DEBUG_MODE"),
            limits: EndpointLimits {
                contact: form_limit,
                booking: form_limit,
                ..defaults
            },
            admin_email: settings.get_or("ADMIN_EMAIL", ""),
            instagram_username: settings.get_or("INSTAGRAM_USERNAME", ""),
            feed_post_count: 12,
            feed_cache_duration: Duration::from_secs(cache_secs),
            contact_missing: settings.missing(CONTACT_KEYS),
            booking_missing: settings.missing(BOOKING_KEYS),
            feed_missing: settings.missing(FEED_KEYS),
        })
    }

    /// Create config for development (error detail exposed)
    pub fn development() -> Self {
        Self {
            debug: true,
            ..Self::default()
        }
    }
}
