//! Error conversions - HTTP response rendering for [`AppError`]

#[cfg(feature = "axum")]
use super::app_error::AppError;

/// Generic user-facing message for server-side failures.
pub const GENERIC_SERVER_MESSAGE: &str =
    "Es ist ein Fehler aufgetreten. Bitte versuche es später erneut oder kontaktiere uns direkt.";

// ============================================================================
// Axum conversions (feature-gated)
// ============================================================================

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::{HeaderValue, StatusCode, header};

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = (status, Json(self.to_body())).into_response();

        if let Some(seconds) = self.retry_after() {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }

        response
    }
}
