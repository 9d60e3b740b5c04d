//! API error responses

use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

use yield_core::CoreError;

use crate::dto::ApiResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Internal server error")]
    InternalServerError,
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownProtocol(key) => {
                Self::BadRequest(format!("Unsupported protocol: {key}"))
            }
            CoreError::UnknownNetwork(key) => {
                Self::BadRequest(format!("Unsupported network: {key}"))
            }
            CoreError::ChainNotConfigured { .. } | CoreError::InvalidConfig(_) => {
                tracing::error!(error = %err, "Configuration error while serving request");
                Self::InternalServerError
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, msg) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };
        let response: ApiResponse<()> = ApiResponse::error(msg);
        (status, Json(response)).into_response()
    }
}
