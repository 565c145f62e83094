use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The envelope every endpoint answers with.
#[derive(Debug, Serialize, Deserialize)]
pub struct APIResponse<T = Value> {
    pub status: u16,
    pub message: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl<T> APIResponse<T> {
    pub fn with_data(status: StatusCode, msg: &str, data: T) -> Self {
        APIResponse {
            status: status.as_u16(),
            message: msg.to_owned(),
            date: now_iso(),
            data: Some(data),
        }
    }

    pub fn ok(msg: &str, data: T) -> Self {
        Self::with_data(StatusCode::OK, msg, data)
    }

    pub fn created(msg: &str, data: T) -> Self {
        Self::with_data(StatusCode::CREATED, msg, data)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl APIResponse {
    pub fn new_from_msg(status: StatusCode, msg: &str) -> Self {
        APIResponse {
            status: status.as_u16(),
            message: msg.to_owned(),
            date: now_iso(),
            data: None,
        }
    }

    pub fn bad_request(msg: &str) -> Self {
        Self::new_from_msg(StatusCode::BAD_REQUEST, msg)
    }

    pub fn not_found(msg: &str) -> Self {
        Self::new_from_msg(StatusCode::NOT_FOUND, msg)
    }

    pub fn server_error() -> Self {
        Self::new_from_msg(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
    }
}

impl<T: Serialize> IntoResponse for APIResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        tracing::debug!(status = self.status, message = %self.message, "sending response");
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omits_data_when_absent() {
        let body = serde_json::to_value(APIResponse::not_found("Wishlist not found.")).unwrap();
        assert_eq!(body["status"], 404);
        assert_eq!(body["message"], "Wishlist not found.");
        assert!(body.get("data").is_none());
        assert!(body["date"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn keeps_data_when_present() {
        let body = serde_json::to_value(APIResponse::created("Created wishlist.", vec![1, 2])).unwrap();
        assert_eq!(body["status"], 201);
        assert_eq!(body["data"], serde_json::json!([1, 2]));
    }

    #[test]
    fn decodes_envelope_without_data() {
        let raw = r#"{"status":200,"message":"Pong!","date":"2024-01-01T00:00:00.000Z"}"#;
        let env: APIResponse<Vec<i32>> = serde_json::from_str(raw).unwrap();
        assert!(env.is_success());
        assert!(env.data.is_none());
    }
}
