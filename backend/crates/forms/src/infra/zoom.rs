//! Zoom meeting provider
//!
//! Server-to-server OAuth (account credentials grant) followed by a
//! scheduled meeting on the account's own user.

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use crate::domain::ports::{Meeting, MeetingProvider, MeetingRequest, UpstreamError};
use crate::infra::connection_error;

const SERVICE: &str = "zoom";

pub const DEFAULT_OAUTH_URL: &str = "https://zoom.us/oauth/token";
pub const DEFAULT_API_URL: &str = "https://api.zoom.us/v2";

/// Server-to-server app credentials
#[derive(Clone)]
pub struct ZoomCredentials {
    pub account_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ZoomCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoomCredentials")
            .field("account_id", &self.account_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ZoomClient {
    client: Client,
    credentials: ZoomCredentials,
    oauth_url: String,
    api_url: String,
}

impl ZoomClient {
    pub fn new(client: Client, credentials: ZoomCredentials) -> Self {
        Self {
            client,
            credentials,
            oauth_url: DEFAULT_OAUTH_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Point the client at different endpoints
    pub fn with_urls(mut self, oauth_url: impl Into<String>, api_url: impl Into<String>) -> Self {
        self.oauth_url = oauth_url.into();
        self.api_url = api_url.into();
        self
    }

    async fn access_token(&self) -> Result<String, UpstreamError> {
        let response = self
            .client
            .post(&self.oauth_url)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .query(&[
                ("grant_type", "account_credentials"),
                ("account_id", self.credentials.account_id.as_str()),
            ])
            .send()
            .await
            .map_err(|e| connection_error(SERVICE, e))?;

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            tracing::error!(status, "Zoom authentication failed");
            return Err(UpstreamError::Status {
                service: SERVICE,
                status,
            });
        }

        let body: Value = response.json().await.map_err(|e| invalid(e.to_string()))?;
        body.get("access_token")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| invalid("no access token in OAuth response"))
    }
}

impl MeetingProvider for ZoomClient {
    async fn create_meeting(&self, request: &MeetingRequest) -> Result<Meeting, UpstreamError> {
        let token = self.access_token().await?;

        let response = self
            .client
            .post(format!("{}/users/me/meetings", self.api_url))
            .bearer_auth(token)
            .json(&meeting_payload(request))
            .send()
            .await
            .map_err(|e| connection_error(SERVICE, e))?;

        if response.status() != StatusCode::CREATED {
            let status = response.status().as_u16();
            tracing::error!(status, "Zoom meeting creation failed");
            return Err(UpstreamError::Status {
                service: SERVICE,
                status,
            });
        }

        let body: Value = response.json().await.map_err(|e| invalid(e.to_string()))?;
        parse_meeting(&body)
    }
}

fn invalid(detail: impl Into<String>) -> UpstreamError {
    UpstreamError::InvalidResponse {
        service: SERVICE,
        detail: detail.into(),
    }
}

/// Scheduled meeting (type 2) with waiting room, no registration
fn meeting_payload(request: &MeetingRequest) -> Value {
    json!({
        "topic": request.topic,
        "type": 2,
        "start_time": request.start_time.format("%Y-%m-%dT%H:%M:%S").to_string(),
        "duration": request.duration_minutes,
        "timezone": request.timezone,
        "agenda": request.agenda,
        "settings": {
            "host_video": true,
            "participant_video": true,
            "join_before_host": false,
            "mute_upon_entry": false,
            "watermark": false,
            "use_pmi": false,
            "approval_type": 2,
            "audio": "both",
            "auto_recording": "none",
            "waiting_room": true,
            "meeting_authentication": false
        }
    })
}

fn parse_meeting(body: &Value) -> Result<Meeting, UpstreamError> {
    let id = match body.get("id") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => return Err(invalid("no meeting id in response")),
    };

    let text = |key: &str| {
        body.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    Ok(Meeting {
        id,
        password: text("password"),
        join_url: text("join_url"),
        start_url: text("start_url"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_meeting_payload() {
        let request = MeetingRequest {
            topic: "Erstgespräch: Anna Muster".to_string(),
            start_time: NaiveDate::from_ymd_opt(2030, 3, 4)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            duration_minutes: 45,
            timezone: "Europe/Berlin".to_string(),
            agenda: "Anamnesegespräch".to_string(),
        };

        let payload = meeting_payload(&request);
        assert_eq!(payload["type"], 2);
        assert_eq!(payload["start_time"], "2030-03-04T09:30:00");
        assert_eq!(payload["duration"], 45);
        assert_eq!(payload["timezone"], "Europe/Berlin");
        assert_eq!(payload["settings"]["waiting_room"], true);
    }

    #[test]
    fn test_parse_meeting_numeric_id() {
        let body = json!({
            "id": 85746065432u64,
            "password": "abc123",
            "join_url": "https://zoom.us/j/85746065432",
            "start_url": "https://zoom.us/s/85746065432"
        });

        let meeting = parse_meeting(&body).unwrap();
        assert_eq!(meeting.id, "85746065432");
        assert_eq!(meeting.password, "abc123");
        assert_eq!(meeting.join_url, "https://zoom.us/j/85746065432");
    }

    #[test]
    fn test_parse_meeting_without_password() {
        let body = json!({ "id": "xyz", "join_url": "https://zoom.us/j/1" });
        let meeting = parse_meeting(&body).unwrap();
        assert_eq!(meeting.id, "xyz");
        assert_eq!(meeting.password, "");
        assert_eq!(meeting.start_url, "");
    }

    #[test]
    fn test_parse_meeting_requires_id() {
        let err = parse_meeting(&json!({ "join_url": "https://zoom.us/j/1" })).unwrap_err();
        assert!(matches!(err, UpstreamError::InvalidResponse { service: "zoom", .. }));
    }

    mod http {
        use std::collections::HashMap;

        use axum::Json;
        use axum::extract::Query;
        use axum::http::{HeaderMap, StatusCode as HttpStatus, header::AUTHORIZATION};
        use axum::response::{IntoResponse, Response};
        use axum::routing::post;
        use chrono::NaiveDate;
        use serde_json::{Value, json};

        use super::super::*;
        use crate::infra::{http_client, stub};

        // base64("zoom-client:zoom-secret")
        const BASIC_AUTH: &str = "Basic em9vbS1jbGllbnQ6em9vbS1zZWNyZXQ=";

        fn credentials() -> ZoomCredentials {
            ZoomCredentials {
                account_id: "zoom-account".to_string(),
                client_id: "zoom-client".to_string(),
                client_secret: "zoom-secret".to_string(),
            }
        }

        fn request() -> MeetingRequest {
            MeetingRequest {
                topic: "Erstgespräch: Anna Muster".to_string(),
                start_time: NaiveDate::from_ymd_opt(2030, 3, 4)
                    .unwrap()
                    .and_hms_opt(9, 30, 0)
                    .unwrap(),
                duration_minutes: 30,
                timezone: "Europe/Berlin".to_string(),
                agenda: "Anamnesegespräch".to_string(),
            }
        }

        fn authorization(headers: &HeaderMap) -> Option<&str> {
            headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
        }

        async fn oauth(Query(params): Query<HashMap<String, String>>, headers: HeaderMap) -> Response {
            let grant_ok = params.get("grant_type").map(String::as_str) == Some("account_credentials")
                && params.get("account_id").map(String::as_str) == Some("zoom-account");
            if !grant_ok || authorization(&headers) != Some(BASIC_AUTH) {
                return HttpStatus::UNAUTHORIZED.into_response();
            }
            Json(json!({ "access_token": "zoom-token", "expires_in": 3600 })).into_response()
        }

        async fn create(headers: HeaderMap, Json(body): Json<Value>) -> Response {
            if authorization(&headers) != Some("Bearer zoom-token") {
                return HttpStatus::UNAUTHORIZED.into_response();
            }
            if body["topic"] != "Erstgespräch: Anna Muster" || body["duration"] != 30 {
                return HttpStatus::BAD_REQUEST.into_response();
            }
            let created = json!({
                "id": 85746065432u64,
                "password": "abc123",
                "join_url": "https://zoom.us/j/85746065432",
                "start_url": "https://zoom.us/s/85746065432"
            });
            (HttpStatus::CREATED, Json(created)).into_response()
        }

        async fn client_for(router: axum::Router) -> ZoomClient {
            let base = stub::serve(router).await;
            ZoomClient::new(http_client().unwrap(), credentials())
                .with_urls(format!("{base}/oauth/token"), format!("{base}/v2"))
        }

        #[tokio::test]
        async fn test_token_exchange_then_create() {
            let client = client_for(
                axum::Router::new()
                    .route("/oauth/token", post(oauth))
                    .route("/v2/users/me/meetings", post(create)),
            )
            .await;

            let meeting = client.create_meeting(&request()).await.unwrap();
            assert_eq!(meeting.id, "85746065432");
            assert_eq!(meeting.password, "abc123");
            assert_eq!(meeting.start_url, "https://zoom.us/s/85746065432");
        }

        #[tokio::test]
        async fn test_rejected_credentials() {
            let client = client_for(
                axum::Router::new()
                    .route("/oauth/token", post(|| async { HttpStatus::UNAUTHORIZED }))
                    .route("/v2/users/me/meetings", post(create)),
            )
            .await;

            let err = client.create_meeting(&request()).await.unwrap_err();
            assert!(matches!(err, UpstreamError::Status { service: "zoom", status: 401 }));
        }

        #[tokio::test]
        async fn test_token_response_without_token() {
            let client = client_for(axum::Router::new().route(
                "/oauth/token",
                post(|| async { Json(json!({ "reason": "none" })) }),
            ))
            .await;

            let err = client.create_meeting(&request()).await.unwrap_err();
            assert!(matches!(err, UpstreamError::InvalidResponse { service: "zoom", .. }));
        }

        #[tokio::test]
        async fn test_meeting_requires_created_status() {
            let client = client_for(
                axum::Router::new()
                    .route("/oauth/token", post(oauth))
                    .route(
                        "/v2/users/me/meetings",
                        post(|| async { Json(json!({ "id": 1 })) }),
                    ),
            )
            .await;

            let err = client.create_meeting(&request()).await.unwrap_err();
            assert!(matches!(err, UpstreamError::Status { status: 200, .. }));
        }
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let credentials = ZoomCredentials {
            account_id: "acc".to_string(),
            client_id: "id".to_string(),
            client_secret: "very-secret".to_string(),
        };
        assert!(!format!("{credentials:?}").contains("very-secret"));
    }
}
