//! HTTP Handlers

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::FormRejection;
use axum::extract::{ConnectInfo, Form, FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use platform::client::{client_key, extract_client_ip};
use platform::rate_limit::RateLimitStore;

use crate::application::book_consultation::{BookConsultationUseCase, BookingInput};
use crate::application::config::FormsConfig;
use crate::application::guard::RequestGuard;
use crate::application::instagram_feed::InstagramFeedUseCase;
use crate::application::issue_token::IssueTokenUseCase;
use crate::application::submit_contact::{ContactInput, SubmitContactUseCase};
use crate::domain::ports::{FeedCache, FeedSource, Mailer, MeetingProvider};
use crate::domain::submissions::FormFields;
use crate::error::{FormError, Rejection};
use crate::presentation::dto::{
    BOOKING_SUCCESS_MESSAGE, CONTACT_SUCCESS_MESSAGE, CsrfTokenResponse, FeedResponse,
    MessageResponse,
};

/// Header carrying the CSRF token for script clients
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Form field carrying the CSRF token
pub const CSRF_FIELD: &str = "csrf_token";

/// Concrete adapter types behind the ports
pub trait FormsAdapters: Send + Sync + 'static {
    type Store: RateLimitStore + Send + Sync + 'static;
    type Mailer: Mailer + Send + Sync + 'static;
    type Meetings: MeetingProvider + Send + Sync + 'static;
    type Feed: FeedSource + Send + Sync + 'static;
    type Cache: FeedCache + Send + Sync + 'static;
}

/// Shared state for form handlers
pub struct AppState<A: FormsAdapters> {
    pub guard: Arc<RequestGuard<A::Store>>,
    pub mailer: Arc<A::Mailer>,
    pub meetings: Arc<A::Meetings>,
    pub feed_source: Arc<A::Feed>,
    pub feed_cache: Arc<A::Cache>,
    pub config: Arc<FormsConfig>,
}

impl<A: FormsAdapters> Clone for AppState<A> {
    fn clone(&self) -> Self {
        Self {
            guard: self.guard.clone(),
            mailer: self.mailer.clone(),
            meetings: self.meetings.clone(),
            feed_source: self.feed_source.clone(),
            feed_cache: self.feed_cache.clone(),
            config: self.config.clone(),
        }
    }
}

impl<A: FormsAdapters> AppState<A> {
    fn reject(&self, error: FormError) -> Rejection {
        Rejection::new(error, self.config.debug)
    }
}

/// Client address as seen through proxies, plus its rate-limit key
#[derive(Debug, Clone)]
pub struct ClientAddr {
    pub ip: IpAddr,
    pub key: String,
}

impl<S> FromRequestParts<S> for ClientAddr
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let direct = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let ip = extract_client_ip(&parts.headers, direct);

        Ok(Self {
            key: client_key(&ip),
            ip,
        })
    }
}

/// GET /api/csrf-token
pub async fn csrf_token<A: FormsAdapters>(
    State(state): State<AppState<A>>,
    client: ClientAddr,
) -> Result<Json<CsrfTokenResponse>, Rejection> {
    let use_case = IssueTokenUseCase::new(state.guard.clone(), state.config.clone());

    let token = use_case
        .execute(&client.key)
        .await
        .map_err(|e| state.reject(e))?;

    Ok(Json(CsrfTokenResponse {
        success: true,
        token,
    }))
}

/// POST /api/contact
pub async fn contact<A: FormsAdapters>(
    State(state): State<AppState<A>>,
    client: ClientAddr,
    headers: HeaderMap,
    form: Result<Form<FormFields>, FormRejection>,
) -> Result<Json<MessageResponse>, Rejection> {
    let fields = form_fields(form).map_err(|e| state.reject(e))?;

    let use_case = SubmitContactUseCase::new(
        state.guard.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    let input = ContactInput {
        client_key: client.key,
        client_ip: client.ip,
        csrf_token: submitted_csrf_token(&headers, &fields),
        fields,
    };

    use_case.execute(input).await.map_err(|e| state.reject(e))?;

    Ok(Json(MessageResponse::ok(CONTACT_SUCCESS_MESSAGE)))
}

/// POST /api/booking
pub async fn booking<A: FormsAdapters>(
    State(state): State<AppState<A>>,
    client: ClientAddr,
    headers: HeaderMap,
    form: Result<Form<FormFields>, FormRejection>,
) -> Result<Json<MessageResponse>, Rejection> {
    let fields = form_fields(form).map_err(|e| state.reject(e))?;

    let use_case = BookConsultationUseCase::new(
        state.guard.clone(),
        state.mailer.clone(),
        state.meetings.clone(),
        state.config.clone(),
    );

    let input = BookingInput {
        client_key: client.key,
        csrf_token: submitted_csrf_token(&headers, &fields),
        fields,
    };

    use_case.execute(input).await.map_err(|e| state.reject(e))?;

    Ok(Json(MessageResponse::ok(BOOKING_SUCCESS_MESSAGE)))
}

/// GET /api/instagram-feed
pub async fn instagram_feed<A: FormsAdapters>(
    State(state): State<AppState<A>>,
    client: ClientAddr,
) -> Result<Json<FeedResponse>, Rejection> {
    let use_case = InstagramFeedUseCase::new(
        state.guard.clone(),
        state.feed_source.clone(),
        state.feed_cache.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(&client.key)
        .await
        .map_err(|e| state.reject(e))?;

    Ok(Json(FeedResponse {
        success: true,
        data: output.posts,
        cached: output.cache_age.is_some(),
        cache_age: output.cache_age,
    }))
}

/// OPTIONS on any endpoint; CORS headers are added by the middleware
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Fallback for GET-only endpoints
pub async fn get_only() -> FormError {
    FormError::MethodNotAllowed("GET")
}

/// Fallback for POST-only endpoints
pub async fn post_only() -> FormError {
    FormError::MethodNotAllowed("POST")
}

fn form_fields(form: Result<Form<FormFields>, FormRejection>) -> Result<FormFields, FormError> {
    form.map(|Form(fields)| fields)
        .map_err(|e| FormError::MalformedBody(e.body_text()))
}

/// Token from the form body, falling back to the header
fn submitted_csrf_token(headers: &HeaderMap, fields: &FormFields) -> Option<String> {
    fields
        .get(CSRF_FIELD)
        .filter(|token| !token.is_empty())
        .or_else(|| headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok()))
        .map(str::to_owned)
}
