//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; request errors are rendered by the
//! `forms` crate.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use forms::application::guard::RequestGuard;
use forms::infra::{
    ensemble::EnsembleDataClient,
    feed_cache::FileFeedCache,
    http_client,
    mail_relay::{HttpMailRelay, Sender},
    zoom::{ZoomClient, ZoomCredentials},
};
use forms::{AppState, FormsConfig, LiveAdapters, forms_router};
use platform::config::Settings;
use platform::cors::CorsPolicy;
use platform::csrf::{CsrfConfig, CsrfTokenService, DEFAULT_MAX_AGE};
use platform::rate_limit::{FileRateLimitStore, RateLimiter, SweepPolicy};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Settings without which no endpoint can work
const REQUIRED_KEYS: &[&str] = &["CSRF_SECRET", "ALLOWED_ORIGINS"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,forms=info,platform=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load settings (.env overlaid with the process environment)
    let env_file = env::var_os("ENV_FILE").map(PathBuf::from);
    let settings = Settings::load(env_file.as_deref())?;
    settings.require_all(REQUIRED_KEYS)?;

    // CSRF
    let csrf = Arc::new(CsrfTokenService::new(CsrfConfig::new(
        settings.require("CSRF_SECRET")?,
        Duration::from_secs(settings.parse_or("CSRF_TOKEN_MAX_AGE", DEFAULT_MAX_AGE.as_secs())?),
    )));

    // Rate limiting
    let sweep = SweepPolicy {
        max_age: Duration::from_secs(settings.parse_or("RATE_LIMIT_CLEANUP_MAX_AGE", 86_400u64)?),
        probability_percent: settings
            .parse_or("RATE_LIMIT_CLEANUP_PROBABILITY", 1u8)?
            .min(100),
    };
    let rate_limit_dir = settings.get_or("RATE_LIMIT_DIR", "_rate_limit");
    let limiter = RateLimiter::new(Arc::new(FileRateLimitStore::new(&rate_limit_dir)), sweep);

    // CORS
    let cors = CorsPolicy::from_list(settings.require("ALLOWED_ORIGINS")?);
    tracing::info!(origins = ?cors.origins(), "Origin allow-list loaded");

    // Endpoint configuration
    let config = FormsConfig::from_settings(&settings)?;
    for (endpoint, missing) in [
        ("contact", &config.contact_missing),
        ("booking", &config.booking_missing),
        ("instagram-feed", &config.feed_missing),
    ] {
        if !missing.is_empty() {
            tracing::warn!(
                endpoint,
                missing = %missing.join(", "),
                "Endpoint is not fully configured and will answer 500"
            );
        }
    }
    if config.debug {
        tracing::warn!("DEBUG_MODE is enabled, upstream errors are exposed to clients");
    }

    // External services
    let http = http_client()?;

    let mailer = HttpMailRelay::new(
        http.clone(),
        settings.get_or("MAIL_RELAY_URL", ""),
        settings.get("MAIL_RELAY_API_KEY").map(str::to_owned),
        Sender {
            email: settings.get_or("FROM_EMAIL", ""),
            name: settings.get_or("FROM_NAME", ""),
        },
    );

    let meetings = ZoomClient::new(
        http.clone(),
        ZoomCredentials {
            account_id: settings.get_or("ZOOM_ACCOUNT_ID", ""),
            client_id: settings.get_or("ZOOM_CLIENT_ID", ""),
            client_secret: settings.get_or("ZOOM_CLIENT_SECRET", ""),
        },
    );

    let feed_source =
        EnsembleDataClient::new(http, settings.get_or("ENSEMBLEDATA_API_TOKEN", ""));
    let feed_cache = FileFeedCache::new(
        settings.get_or("INSTAGRAM_CACHE_FILE", "cache/instagram-feed.json"),
    );

    let state: AppState<LiveAdapters> = AppState {
        guard: Arc::new(RequestGuard::new(limiter, csrf)),
        mailer: Arc::new(mailer),
        meetings: Arc::new(meetings),
        feed_source: Arc::new(feed_source),
        feed_cache: Arc::new(feed_cache),
        config: Arc::new(config),
    };

    // Build router
    let app = Router::new()
        .nest("/api", forms_router(state, cors))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr =
        settings.parse_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 31113)))?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
