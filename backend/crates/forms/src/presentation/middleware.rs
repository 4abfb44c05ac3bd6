//! Forms Middleware

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use platform::cors::{CorsDecision, CorsPolicy, apply_headers};

use crate::error::FormError;

/// Middleware that enforces the origin allow-list
///
/// Denied origins never reach the handler. Allowed origins get the CORS
/// headers on whatever the handler answers, errors included.
pub async fn enforce_cors(
    State(policy): State<Arc<CorsPolicy>>,
    req: Request,
    next: Next,
) -> Response {
    let decision = policy.check_headers(req.headers());

    if let CorsDecision::Denied(origin) = decision {
        return FormError::OriginDenied(origin).into_response();
    }

    let mut response = next.run(req).await;
    apply_headers(response.headers_mut(), &decision);
    response
}
