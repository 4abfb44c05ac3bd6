//! Domain Layer
//!
//! Typed submissions, notification mails and the ports to external services.
//! This layer has no knowledge of HTTP or of concrete service clients.

pub mod messages;
pub mod ports;
pub mod submissions;
