//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.
//! Every use case runs the request guard before its own logic.

pub mod book_consultation;
pub mod config;
pub mod guard;
pub mod instagram_feed;
pub mod issue_token;
pub mod submit_contact;
