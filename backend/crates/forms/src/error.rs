//! Form Endpoint Error Types
//!
//! This module provides endpoint-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use std::borrow::Cow;

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, conversions::GENERIC_SERVER_MESSAGE, kind::ErrorKind};
use platform::rate_limit::RateLimitStoreError;
use thiserror::Error;

use crate::domain::ports::UpstreamError;
use crate::domain::submissions::InvalidSubmission;

/// Form endpoint result type alias
pub type FormResult<T> = Result<T, FormError>;

pub const ORIGIN_DENIED_MESSAGE: &str = "Zugriff von dieser Domain nicht erlaubt.";
pub const CSRF_FAILED_MESSAGE: &str =
    "Sicherheitsvalidierung fehlgeschlagen. Bitte lade die Seite neu und versuche es erneut.";
pub const CONFIGURATION_MESSAGE: &str =
    "Server-Konfigurationsfehler. Bitte kontaktiere den Administrator.";
pub const MAIL_FAILED_MESSAGE: &str =
    "Fehler beim Senden. Bitte versuche es später erneut oder kontaktiere mich direkt per E-Mail.";
pub const FEED_FAILED_MESSAGE: &str = "Fehler beim Abrufen des Instagram-Feeds.";
pub const MALFORMED_BODY_MESSAGE: &str = "Ungültige Eingabedaten. Bitte überprüfe deine Angaben.";

/// Form endpoint error variants
#[derive(Debug, Error)]
pub enum FormError {
    /// Cross-origin request from an origin outside the allow-list
    #[error("origin not allowed: {0}")]
    OriginDenied(String),

    /// Wrong HTTP method for the endpoint
    #[error("method not allowed, endpoint accepts {0}")]
    MethodNotAllowed(&'static str),

    /// Too many requests from this client
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Missing, expired or forged CSRF token
    #[error("invalid CSRF token")]
    InvalidCsrfToken,

    /// Field validation failed
    #[error(transparent)]
    InvalidSubmission(#[from] InvalidSubmission),

    /// Request body could not be decoded as a form
    #[error("malformed form body: {0}")]
    MalformedBody(String),

    /// Settings required by the endpoint are missing
    #[error("missing configuration: {}", .0.join(", "))]
    Configuration(Vec<String>),

    /// The mail relay rejected or never received the message
    #[error("mail delivery failed: {0}")]
    MailDelivery(#[source] UpstreamError),

    /// Meeting creation failed
    #[error("meeting creation failed: {0}")]
    Meeting(#[source] UpstreamError),

    /// Feed could not be fetched
    #[error("feed unavailable: {0}")]
    Feed(#[source] UpstreamError),

    /// Rate limit storage failed
    #[error("rate limit store error: {0}")]
    Store(#[from] RateLimitStoreError),
}

impl FormError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            FormError::OriginDenied(_) | FormError::InvalidCsrfToken => ErrorKind::Forbidden,
            FormError::MethodNotAllowed(_) => ErrorKind::MethodNotAllowed,
            FormError::RateLimited { .. } => ErrorKind::TooManyRequests,
            FormError::InvalidSubmission(_) | FormError::MalformedBody(_) => ErrorKind::BadRequest,
            FormError::Configuration(_)
            | FormError::MailDelivery(_)
            | FormError::Meeting(_)
            | FormError::Feed(_)
            | FormError::Store(_) => ErrorKind::InternalServerError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// User-facing message
    ///
    /// Upstream detail is only included when `debug` is set.
    pub fn user_message(&self, debug: bool) -> Cow<'static, str> {
        match self {
            FormError::OriginDenied(_) => ORIGIN_DENIED_MESSAGE.into(),
            FormError::MethodNotAllowed(method) => {
                format!("Nur {method}-Anfragen sind erlaubt.").into()
            }
            FormError::RateLimited { retry_after_secs } => format!(
                "Zu viele Anfragen. Bitte versuche es in {} Minute(n) erneut.",
                retry_after_secs.div_ceil(60)
            )
            .into(),
            FormError::InvalidCsrfToken => CSRF_FAILED_MESSAGE.into(),
            FormError::InvalidSubmission(invalid) => invalid.summary.clone(),
            FormError::MalformedBody(_) => MALFORMED_BODY_MESSAGE.into(),
            FormError::Configuration(_) => CONFIGURATION_MESSAGE.into(),
            FormError::MailDelivery(_) => MAIL_FAILED_MESSAGE.into(),
            FormError::Meeting(e) if debug => format!("Es ist ein Fehler aufgetreten: {e}").into(),
            FormError::Store(e) if debug => format!("Es ist ein Fehler aufgetreten: {e}").into(),
            FormError::Meeting(_) | FormError::Store(_) => GENERIC_SERVER_MESSAGE.into(),
            FormError::Feed(e) if debug => format!("{FEED_FAILED_MESSAGE} ({e})").into(),
            FormError::Feed(_) => FEED_FAILED_MESSAGE.into(),
        }
    }

    /// Convert into the unified error, deciding on upstream detail
    pub fn into_app_error(self, debug: bool) -> AppError {
        let app_error = AppError::new(self.kind(), self.user_message(debug));
        match self {
            FormError::RateLimited { retry_after_secs } => {
                app_error.with_retry_after(retry_after_secs)
            }
            FormError::InvalidSubmission(invalid) => app_error.with_field_errors(invalid.issues),
            FormError::MailDelivery(e) | FormError::Meeting(e) | FormError::Feed(e) => {
                app_error.with_source(e)
            }
            FormError::Store(e) => app_error.with_source(e),
            _ => app_error,
        }
    }

    /// Log the error with appropriate level
    pub(crate) fn log(&self) {
        match self {
            FormError::OriginDenied(origin) => {
                tracing::warn!(origin = %origin, "Request from disallowed origin");
            }
            FormError::InvalidCsrfToken => {
                tracing::warn!("CSRF validation failed");
            }
            FormError::RateLimited { retry_after_secs } => {
                tracing::warn!(retry_after = retry_after_secs, "Rate limit exceeded");
            }
            FormError::Configuration(keys) => {
                tracing::error!(missing = %keys.join(", "), "Endpoint is not configured");
            }
            FormError::MailDelivery(e) | FormError::Meeting(e) | FormError::Feed(e) => {
                tracing::error!(service = e.service(), error = %e, "Upstream failure");
            }
            FormError::Store(e) => {
                tracing::error!(error = %e, "Rate limit store failure");
            }
            _ => {
                tracing::debug!(error = %self, "Request rejected");
            }
        }
    }
}

impl From<FormError> for AppError {
    fn from(err: FormError) -> Self {
        err.into_app_error(false)
    }
}

impl IntoResponse for FormError {
    fn into_response(self) -> Response {
        Rejection::new(self, false).into_response()
    }
}

/// Error response carrying the debug flag of the serving configuration
#[derive(Debug)]
pub struct Rejection {
    pub error: FormError,
    pub debug: bool,
}

impl Rejection {
    pub fn new(error: FormError, debug: bool) -> Self {
        Self { error, debug }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        self.error.log();
        self.error.into_app_error(self.debug).into_response()
    }
}
