//! Forms Router

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use platform::cors::CorsPolicy;
use platform::rate_limit::FileRateLimitStore;

use crate::infra::{
    ensemble::EnsembleDataClient, feed_cache::FileFeedCache, mail_relay::HttpMailRelay,
    zoom::ZoomClient,
};
use crate::presentation::handlers::{self, AppState, FormsAdapters};
use crate::presentation::middleware::enforce_cors;

/// Production adapters: file-backed stores and the HTTP clients
pub enum LiveAdapters {}

impl FormsAdapters for LiveAdapters {
    type Store = FileRateLimitStore;
    type Mailer = HttpMailRelay;
    type Meetings = ZoomClient;
    type Feed = EnsembleDataClient;
    type Cache = FileFeedCache;
}

/// Create the forms router
///
/// Mount under `/api`. Requests must carry `ConnectInfo<SocketAddr>` or
/// proxy headers for per-client rate limiting to work.
pub fn forms_router<A: FormsAdapters>(state: AppState<A>, cors: CorsPolicy) -> Router {
    Router::new()
        .route(
            "/csrf-token",
            get(handlers::csrf_token::<A>)
                .options(handlers::preflight)
                .fallback(handlers::get_only),
        )
        .route(
            "/contact",
            post(handlers::contact::<A>)
                .options(handlers::preflight)
                .fallback(handlers::post_only),
        )
        .route(
            "/booking",
            post(handlers::booking::<A>)
                .options(handlers::preflight)
                .fallback(handlers::post_only),
        )
        .route(
            "/instagram-feed",
            get(handlers::instagram_feed::<A>)
                .options(handlers::preflight)
                .fallback(handlers::get_only),
        )
        .layer(middleware::from_fn_with_state(Arc::new(cors), enforce_cors))
        .with_state(state)
}
