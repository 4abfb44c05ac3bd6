//! API DTOs (Data Transfer Objects)

use serde::Serialize;

use crate::domain::ports::FeedPost;

pub const CONTACT_SUCCESS_MESSAGE: &str =
    "Vielen Dank für deine Nachricht! Ich melde mich bald bei dir.";
pub const BOOKING_SUCCESS_MESSAGE: &str = "Vielen Dank! Dein Termin wurde erfolgreich gebucht. Du erhältst in Kürze eine Bestätigungsmail mit den Zoom-Zugangsdaten.";

/// Response for GET /api/csrf-token
#[derive(Debug, Clone, Serialize)]
pub struct CsrfTokenResponse {
    pub success: bool,
    pub token: String,
}

/// Response for POST /api/contact and POST /api/booking
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

impl MessageResponse {
    pub fn ok(message: &'static str) -> Self {
        Self {
            success: true,
            message,
        }
    }
}

/// Response for GET /api/instagram-feed
#[derive(Debug, Clone, Serialize)]
pub struct FeedResponse {
    pub success: bool,
    pub data: Vec<FeedPost>,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_age: Option<u64>,
}
