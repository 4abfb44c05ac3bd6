//! Platform Crate - Request Security Infrastructure
//!
//! This crate provides the technical foundations shared by every form endpoint:
//! - Cryptographic utilities (SHA-256, HMAC-SHA256, Base64, constant-time compare)
//! - Configuration loading (`.env` file into an immutable settings object)
//! - Client identification (proxy-aware IP extraction, hashed client keys)
//! - Stateless CSRF tokens
//! - Sliding-window rate limiting over pluggable stores
//! - CORS allow-list policy
//! - Field validators for user input

pub mod client;
pub mod config;
pub mod cors;
pub mod crypto;
pub mod csrf;
pub mod rate_limit;
pub mod validation;
