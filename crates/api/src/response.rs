//! API response helpers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Map, Value, json};

/// `{message}` confirmation, optionally with extra top-level fields.
#[derive(Debug, Clone)]
pub struct Message {
    body: Map<String, Value>,
    status: StatusCode,
}

impl Message {
    /// A 200 confirmation.
    #[must_use]
    pub fn ok(message: &str) -> Self {
        let mut body = Map::new();
        body.insert("message".to_string(), Value::String(message.to_string()));
        Self {
            body,
            status: StatusCode::OK,
        }
    }

    /// A 201 confirmation.
    #[must_use]
    pub fn created(message: &str) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::ok(message)
        }
    }

    /// Add a field next to the message.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        self.body
            .insert(key.to_string(), serde_json::to_value(value).unwrap_or(Value::Null));
        self
    }
}

impl IntoResponse for Message {
    fn into_response(self) -> Response {
        (self.status, Json(Value::Object(self.body))).into_response()
    }
}

/// `{items}` envelope for unpaginated lists.
#[derive(Debug, Serialize)]
pub struct Items<T: Serialize> {
    pub items: Vec<T>,
}

/// 201 with a JSON body.
#[must_use]
pub fn created<T: Serialize>(body: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(body))
}

/// `{ok: true}`.
#[must_use]
pub fn ok() -> Json<Value> {
    Json(json!({ "ok": true }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_message_with_fields() {
        let response = Message::created("Inquiry sent")
            .with("inquiryId", "abc")
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({ "message": "Inquiry sent", "inquiryId": "abc" }));
    }
}
