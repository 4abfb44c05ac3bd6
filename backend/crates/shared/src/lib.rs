//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of the backend vocabulary:
//! - Error classification mapped to HTTP status codes
//! - The unified application error and result alias
//! - The JSON envelope every endpoint answers with (`success` + `message`)
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all endpoints.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
