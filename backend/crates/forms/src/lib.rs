//! Form Endpoints Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Typed submissions, mail content, ports to external services
//! - `application/` - Use cases and the shared request guard
//! - `infra/` - HTTP clients and the on-disk feed cache
//! - `presentation/` - HTTP handlers, CORS middleware, router
//!
//! ## Security Model
//! - Every endpoint checks the origin allow-list before anything else
//! - Every endpoint is rate limited per client address hash
//! - State-changing endpoints require a valid CSRF token
//! - All user input is validated and HTML-escaped before it reaches a mail
//! - Upstream error detail is only exposed with `DEBUG_MODE=true`

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::{EndpointLimits, FormsConfig};
pub use error::{FormError, FormResult, Rejection};
pub use presentation::handlers::{AppState, FormsAdapters};
pub use presentation::router::{LiveAdapters, forms_router};

// Re-export kernel error types for unified error handling
pub use kernel::error::{app_error::AppError, kind::ErrorKind};
