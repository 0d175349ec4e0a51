//! API middleware.

#![allow(missing_docs)]

use adoptme_common::ErrorDetail;
use adoptme_core::{
    AccountService, AuditService, FavoriteService, InquiryService, ListingService,
    ModerationService,
};
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub listing_service: ListingService,
    pub favorite_service: FavoriteService,
    pub inquiry_service: InquiryService,
    pub moderation_service: ModerationService,
    pub audit_service: AuditService,
}

/// Why a presented bearer token was refused. Read by the auth extractors.
#[derive(Debug, Clone)]
pub struct AuthRejection(pub String);

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Authentication middleware.
///
/// A valid token puts the caller's `user::Model` into the request extensions.
/// An invalid one is remembered as an [`AuthRejection`] so protected routes can
/// answer with the reason while public routes carry on anonymously.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(req.headers()) {
        match state.account_service.authenticate(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) if e.is_server_error() => return e.into_response(),
            Err(e) => {
                tracing::debug!(error = %e, "Bearer token rejected");
                req.extensions_mut().insert(AuthRejection(e.public_message()));
            }
        }
    }

    next.run(req).await
}

/// Adds the internal cause of a 5xx to the JSON body as `detail`.
///
/// Only installed outside production.
pub async fn expose_error_detail(req: Request<Body>, next: Next) -> Response {
    let response = next.run(req).await;
    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let (mut parts, body) = response.into_parts();
    let Ok(bytes) = axum::body::to_bytes(body, usize::MAX).await else {
        return Response::from_parts(parts, Body::empty());
    };

    let bytes = match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(mut map)) => {
            map.insert("detail".to_string(), Value::String(detail));
            serde_json::to_vec(&map).map_or(bytes, Bytes::from)
        }
        _ => bytes,
    };

    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(bytes))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use adoptme_common::AppError;
    use axum::{Router, http::StatusCode, middleware, routing::get};
    use tower::ServiceExt;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def"));
    }

    #[tokio::test]
    async fn test_expose_error_detail() {
        let app = Router::new()
            .route(
                "/boom",
                get(|| async { AppError::Database("relation missing".to_string()) }),
            )
            .route(
                "/gone",
                get(|| async { AppError::not_found("Listing") }),
            )
            .layer(middleware::from_fn(expose_error_detail));

        let response = app
            .clone()
            .oneshot(Request::get("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Internal server error");
        assert_eq!(json["detail"], "Database error: relation missing");

        let response = app
            .oneshot(Request::get("/gone").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Listing not found");
        assert!(json.get("detail").is_none());
    }
}
