//! Stateless CSRF Tokens
//!
//! Tokens carry their own issue time and a random nonce, signed with a server
//! secret. Nothing is stored server-side: a token is valid iff its signature
//! matches and it is no older than the configured max age.
//!
//! Wire format: `base64("{issued_at}|{nonce_hex}|{hmac_hex}")` where
//! `hmac_hex = HMAC-SHA256(secret, "{issued_at}|{nonce_hex}")`.

use std::time::Duration;

use crate::crypto::{constant_time_eq, from_base64, hmac_sha256_hex, random_bytes, to_base64};

/// Nonce length in bytes (256 bits)
pub const NONCE_LEN: usize = 32;

/// Default token lifetime (30 minutes)
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(30 * 60);

/// CSRF configuration
#[derive(Clone)]
pub struct CsrfConfig {
    /// Signing secret
    pub secret: Vec<u8>,
    /// Maximum token age
    pub max_age: Duration,
}

impl CsrfConfig {
    pub fn new(secret: impl Into<Vec<u8>>, max_age: Duration) -> Self {
        Self {
            secret: secret.into(),
            max_age,
        }
    }
}

impl std::fmt::Debug for CsrfConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfConfig")
            .field("secret", &"<redacted>")
            .field("max_age", &self.max_age)
            .finish()
    }
}

/// Issues and verifies CSRF tokens
#[derive(Debug, Clone)]
pub struct CsrfTokenService {
    config: CsrfConfig,
}

impl CsrfTokenService {
    pub fn new(config: CsrfConfig) -> Self {
        Self { config }
    }

    /// Issue a token stamped with the current time
    pub fn issue(&self) -> String {
        self.issue_at(now_secs())
    }

    /// Issue a token stamped with `issued_at` (unix seconds)
    pub fn issue_at(&self, issued_at: i64) -> String {
        let nonce = hex::encode(random_bytes(NONCE_LEN));
        let signature = self.sign(&issued_at.to_string(), &nonce);
        to_base64(format!("{issued_at}|{nonce}|{signature}").as_bytes())
    }

    /// Verify against the configured max age
    pub fn verify(&self, token: &str) -> bool {
        self.verify_with(token, self.config.max_age)
    }

    /// Verify against an explicit max age
    pub fn verify_with(&self, token: &str, max_age: Duration) -> bool {
        self.verify_at(token, max_age, now_secs())
    }

    /// Verify as of `now` (unix seconds)
    ///
    /// Fails closed on every malformed input. A token whose age equals
    /// `max_age` exactly is still valid.
    pub fn verify_at(&self, token: &str, max_age: Duration, now: i64) -> bool {
        let token = token.trim();
        if token.is_empty() {
            return false;
        }

        let Ok(decoded) = from_base64(token) else {
            return false;
        };
        let Ok(decoded) = String::from_utf8(decoded) else {
            return false;
        };

        let parts: Vec<&str> = decoded.split('|').collect();
        let [issued_raw, nonce, signature] = parts.as_slice() else {
            return false;
        };

        let Ok(issued_at) = issued_raw.parse::<i64>() else {
            return false;
        };

        let max_age = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
        if now.saturating_sub(issued_at) > max_age {
            return false;
        }

        let expected = self.sign(issued_raw, nonce);
        constant_time_eq(expected.as_bytes(), signature.as_bytes())
    }

    fn sign(&self, issued_at: &str, nonce: &str) -> String {
        hmac_sha256_hex(&self.config.secret, format!("{issued_at}|{nonce}").as_bytes())
    }
}

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}
