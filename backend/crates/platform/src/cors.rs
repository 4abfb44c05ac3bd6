//! Origin Allow-List
//!
//! Exact-match origin checking for the form endpoints. Requests without an
//! `Origin` header are same-origin and always pass; any other origin must
//! appear verbatim in the allow-list.

use axum::http::{HeaderMap, HeaderValue, header};

pub const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
pub const ALLOWED_HEADERS: &str = "Content-Type, X-CSRF-Token";

/// Result of an origin check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsDecision {
    /// No `Origin` header was sent
    SameOrigin,
    /// Origin is on the allow-list
    Allowed(String),
    /// Origin is not on the allow-list
    Denied(String),
}

impl CorsDecision {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Self::Denied(_))
    }
}

/// Allowed origins, fixed at startup
#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    origins: Vec<String>,
}

impl CorsPolicy {
    /// Build from a comma-separated list (`"https://a.de, https://b.de"`)
    ///
    /// Entries are trimmed; empty entries are dropped.
    pub fn from_list(list: &str) -> Self {
        Self {
            origins: list
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn origins(&self) -> &[String] {
        &self.origins
    }

    /// Check an origin value
    pub fn check(&self, origin: Option<&str>) -> CorsDecision {
        match origin.map(str::trim) {
            None | Some("") => CorsDecision::SameOrigin,
            Some(origin) if self.origins.iter().any(|allowed| allowed == origin) => {
                CorsDecision::Allowed(origin.to_string())
            }
            Some(origin) => CorsDecision::Denied(origin.to_string()),
        }
    }

    /// Check the `Origin` header of a request
    pub fn check_headers(&self, headers: &HeaderMap) -> CorsDecision {
        let origin = headers.get(header::ORIGIN).map(|v| v.to_str().unwrap_or("\u{fffd}"));
        self.check(origin)
    }
}

/// Set the CORS response headers for an allowed origin
///
/// Same-origin requests get no CORS headers.
pub fn apply_headers(headers: &mut HeaderMap, decision: &CorsDecision) {
    let CorsDecision::Allowed(origin) = decision else {
        return;
    };
    let Ok(origin) = HeaderValue::from_str(origin) else {
        return;
    };

    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
}
