//! EnsembleData feed source
//!
//! Fetches recent Instagram posts through the EnsembleData API and
//! normalizes them into [`FeedPost`]s.

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use crate::domain::ports::{FeedPost, FeedSource, MediaType, UpstreamError};
use crate::infra::connection_error;

const SERVICE: &str = "ensembledata";

pub const DEFAULT_POSTS_URL: &str = "https://ensembledata.com/apis/instagram/user/posts";

const PERMALINK_BASE: &str = "https://www.instagram.com/p/";

#[derive(Clone)]
pub struct EnsembleDataClient {
    client: Client,
    api_token: String,
    posts_url: String,
}

impl EnsembleDataClient {
    pub fn new(client: Client, api_token: impl Into<String>) -> Self {
        Self {
            client,
            api_token: api_token.into(),
            posts_url: DEFAULT_POSTS_URL.to_string(),
        }
    }

    pub fn with_url(mut self, posts_url: impl Into<String>) -> Self {
        self.posts_url = posts_url.into();
        self
    }
}

impl std::fmt::Debug for EnsembleDataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnsembleDataClient")
            .field("posts_url", &self.posts_url)
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}

impl FeedSource for EnsembleDataClient {
    async fn fetch_posts(&self, username: &str, count: usize) -> Result<Vec<FeedPost>, UpstreamError> {
        let response = self
            .client
            .post(&self.posts_url)
            .bearer_auth(&self.api_token)
            .json(&json!({ "username": username, "count": count }))
            .send()
            .await
            .map_err(|e| connection_error(SERVICE, e))?;

        if response.status() != StatusCode::OK {
            return Err(UpstreamError::Status {
                service: SERVICE,
                status: response.status().as_u16(),
            });
        }

        let body: Value = response.json().await.map_err(|e| invalid(e.to_string()))?;
        normalize_response(&body, chrono::Utc::now().timestamp())
    }
}

fn invalid(detail: impl Into<String>) -> UpstreamError {
    UpstreamError::InvalidResponse {
        service: SERVICE,
        detail: detail.into(),
    }
}

/// Normalize the `data` array of an API response
pub fn normalize_response(body: &Value, now: i64) -> Result<Vec<FeedPost>, UpstreamError> {
    let posts = body
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid("missing data array"))?;

    Ok(posts.iter().map(|post| normalize_post(post, now)).collect())
}

/// Normalize a single post
///
/// Missing values fall back to empty strings, zero counters and `now`
/// for the timestamp.
pub fn normalize_post(post: &Value, now: i64) -> FeedPost {
    let str_at = |key: &str| post.get(key).and_then(Value::as_str).filter(|s| !s.is_empty());
    let count_at = |key: &str| {
        post.get(key)
            .and_then(|edge| edge.get("count"))
            .and_then(Value::as_u64)
            .unwrap_or(0)
    };

    let id = match post.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    let caption = str_at("caption")
        .or_else(|| {
            post.pointer("/edge_media_to_caption/edges/0/node/text")
                .and_then(Value::as_str)
        })
        .unwrap_or_default()
        .to_string();

    let media_type = if post.get("is_video").and_then(Value::as_bool).unwrap_or(false) {
        MediaType::Video
    } else {
        MediaType::Image
    };

    FeedPost {
        id,
        caption,
        media_url: str_at("display_url")
            .or_else(|| str_at("thumbnail_url"))
            .unwrap_or_default()
            .to_string(),
        permalink: str_at("shortcode")
            .map(|code| format!("{PERMALINK_BASE}{code}"))
            .unwrap_or_default(),
        timestamp: post
            .get("taken_at_timestamp")
            .and_then(Value::as_i64)
            .unwrap_or(now),
        media_type,
        likes: count_at("edge_liked_by"),
        comments: count_at("edge_media_to_comment"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_750_000_000;

    #[test]
    fn test_normalize_full_post() {
        let post = json!({
            "id": "3141592653",
            "caption": "Frühstück für einen gesunden Darm",
            "display_url": "https://cdn.example/display.jpg",
            "thumbnail_url": "https://cdn.example/thumb.jpg",
            "shortcode": "C1a2B3",
            "taken_at_timestamp": 1_700_000_000,
            "is_video": false,
            "edge_liked_by": { "count": 42 },
            "edge_media_to_comment": { "count": 7 }
        });

        let normalized = normalize_post(&post, NOW);
        assert_eq!(normalized.id, "3141592653");
        assert_eq!(normalized.caption, "Frühstück für einen gesunden Darm");
        assert_eq!(normalized.media_url, "https://cdn.example/display.jpg");
        assert_eq!(normalized.permalink, "https://www.instagram.com/p/C1a2B3");
        assert_eq!(normalized.timestamp, 1_700_000_000);
        assert_eq!(normalized.media_type, MediaType::Image);
        assert_eq!(normalized.likes, 42);
        assert_eq!(normalized.comments, 7);
    }

    #[test]
    fn test_normalize_sparse_post() {
        let post = json!({
            "id": 12345,
            "thumbnail_url": "https://cdn.example/thumb.jpg",
            "is_video": true,
            "edge_media_to_caption": { "edges": [{ "node": { "text": "Reel" } }] }
        });

        let normalized = normalize_post(&post, NOW);
        assert_eq!(normalized.id, "12345");
        assert_eq!(normalized.caption, "Reel");
        assert_eq!(normalized.media_url, "https://cdn.example/thumb.jpg");
        assert_eq!(normalized.permalink, "");
        assert_eq!(normalized.timestamp, NOW);
        assert_eq!(normalized.media_type, MediaType::Video);
        assert_eq!(normalized.likes, 0);
    }

    #[test]
    fn test_normalize_response_requires_data() {
        assert!(normalize_response(&json!({ "error": "quota" }), NOW).is_err());

        let posts = normalize_response(&json!({ "data": [{ "id": "1" }, { "id": "2" }] }), NOW).unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[1].id, "2");
    }

    mod http {
        use axum::Json;
        use axum::http::{HeaderMap, StatusCode as HttpStatus, header::AUTHORIZATION};
        use axum::response::{IntoResponse, Response};
        use axum::routing::post;
        use serde_json::{Value, json};

        use super::super::*;
        use crate::infra::{http_client, stub};

        async fn posts(headers: HeaderMap, Json(body): Json<Value>) -> Response {
            let bearer = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
            if bearer != Some("Bearer ed-token") {
                return HttpStatus::UNAUTHORIZED.into_response();
            }
            if body != json!({ "username": "wohl_fuehl_gesundheit", "count": 12 }) {
                return HttpStatus::BAD_REQUEST.into_response();
            }
            Json(json!({
                "data": [
                    { "id": "1", "shortcode": "AbC", "display_url": "https://cdn.example/1.jpg" },
                    { "id": "2", "is_video": true, "edge_liked_by": { "count": 3 } }
                ]
            }))
            .into_response()
        }

        async fn client_for(router: axum::Router) -> EnsembleDataClient {
            let base = stub::serve(router).await;
            EnsembleDataClient::new(http_client().unwrap(), "ed-token").with_url(format!("{base}/posts"))
        }

        #[tokio::test]
        async fn test_fetch_posts() {
            let client = client_for(axum::Router::new().route("/posts", post(posts))).await;

            let fetched = client.fetch_posts("wohl_fuehl_gesundheit", 12).await.unwrap();
            assert_eq!(fetched.len(), 2);
            assert_eq!(fetched[0].permalink, "https://www.instagram.com/p/AbC");
            assert_eq!(fetched[1].media_type, MediaType::Video);
            assert_eq!(fetched[1].likes, 3);
        }

        #[tokio::test]
        async fn test_error_status() {
            let client = client_for(axum::Router::new().route(
                "/posts",
                post(|| async { HttpStatus::INTERNAL_SERVER_ERROR }),
            ))
            .await;

            let err = client.fetch_posts("wohl_fuehl_gesundheit", 12).await.unwrap_err();
            assert!(matches!(err, UpstreamError::Status { service: "ensembledata", status: 500 }));
        }

        #[tokio::test]
        async fn test_body_without_data() {
            let client = client_for(axum::Router::new().route(
                "/posts",
                post(|| async { Json(json!({ "detail": "quota exceeded" })) }),
            ))
            .await;

            let err = client.fetch_posts("wohl_fuehl_gesundheit", 12).await.unwrap_err();
            assert!(matches!(err, UpstreamError::InvalidResponse { .. }));
        }
    }

    #[test]
    fn test_serialized_shape() {
        let normalized = normalize_post(&json!({ "id": "1", "is_video": true }), NOW);
        let value = serde_json::to_value(&normalized).unwrap();
        assert_eq!(value["type"], "video");
        assert_eq!(value["media_url"], "");
    }
}
