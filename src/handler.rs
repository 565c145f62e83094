use std::sync::Arc;

use axum::{Json, extract::rejection::JsonRejection};
use tracing::info;

use crate::api::APIResponse;
use crate::db::Database;
use crate::error::HandlerError;
use crate::validate;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
}

pub async fn healthcheck() -> APIResponse {
    info!("got ping request");
    APIResponse::new_from_msg(axum::http::StatusCode::OK, "Pong!")
}

/// Parses a numeric id taken from the path.
pub fn path_id(field: &'static str, raw: &str) -> Result<i64, HandlerError> {
    validate::id(raw).map_err(|e| e.on(field).into())
}

/// Unwraps a JSON body, turning axum's rejection into an enveloped 400.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, HandlerError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(HandlerError::BadBody(rejection.body_text())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn path_id_reports_field() {
        assert_eq!(path_id("wishlist_id", "12").unwrap(), 12);

        let err = path_id("wish_id", "x1").unwrap_err();
        assert_eq!(err.to_string(), "ValidationError: wish_id is not a number");
        assert_eq!(err.into_response().status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn healthcheck_pongs() {
        let response = healthcheck().await;
        assert_eq!(response.status, 200);
        assert_eq!(response.message, "Pong!");
    }
}
