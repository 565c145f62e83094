use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::api::APIResponse;
use crate::validate::ValidationError;

#[derive(Debug, Error)]
pub enum DbError {
    /// The data-access layer returned no result; the cause was logged there.
    #[error("query returned no result")]
    NoResult,
    #[error("unexpected value in column {column}: {reason}")]
    Decode { column: usize, reason: String },
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("ValidationError: {0}")]
    Validation(#[from] ValidationError),
    #[error("BadBody: {0}")]
    BadBody(String),
    #[error("NotFound: {0}")]
    NotFound(&'static str),
    #[error("DbError: {0}")]
    Db(#[from] DbError),
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        match self {
            HandlerError::Validation(e) => {
                APIResponse::bad_request(&format!("Bad request: {}.", e)).into_response()
            }
            HandlerError::BadBody(reason) => {
                APIResponse::bad_request(&format!("Bad request: {}.", reason)).into_response()
            }
            HandlerError::NotFound(msg) => APIResponse::not_found(msg).into_response(),
            HandlerError::Db(e) => {
                tracing::error!(error = %e, "request failed in the data layer");
                APIResponse::server_error().into_response()
            }
        }
    }
}
