//! Acting user extractor.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use serde_json::json;
use uuid::Uuid;

use freightbook_shared::types::UserId;

/// Header carrying the acting user's ID.
pub const ACTOR_HEADER: &str = "x-user-id";

/// The user performing a request, recorded in the audit log.
///
/// The header is optional; requests without it are audited without an actor.
///
/// ```ignore
/// async fn handler(Actor(actor): Actor) -> impl IntoResponse {
///     // actor: Option<UserId>
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Actor(pub Option<UserId>);

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(ACTOR_HEADER) else {
            return Ok(Self(None));
        };
        value
            .to_str()
            .ok()
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .map(|id| Self(Some(UserId::from_uuid(id))))
            .ok_or_else(|| {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "VALIDATION_ERROR",
                        "message": format!("{ACTOR_HEADER} must be a UUID")
                    })),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<Actor, StatusCode> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(ACTOR_HEADER, value);
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        Actor::from_request_parts(&mut parts, &())
            .await
            .map_err(|(status, _)| status)
    }

    #[tokio::test]
    async fn test_missing_header_is_anonymous() {
        assert!(extract(None).await.unwrap().0.is_none());
    }

    #[tokio::test]
    async fn test_valid_header() {
        let id = Uuid::now_v7();
        let actor = extract(Some(&id.to_string())).await.unwrap();
        assert_eq!(actor.0, Some(UserId::from_uuid(id)));
    }

    #[tokio::test]
    async fn test_malformed_header_rejected() {
        assert_eq!(extract(Some("admin")).await.unwrap_err(), StatusCode::BAD_REQUEST);
    }
}
