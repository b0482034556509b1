//! HTTP error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::error::{CacheError, TransportError};
use crate::models::ErrorResponse;

// == Api Error ==
/// Error returned by the HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Key not found in the cache
    #[error("Key not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Cache(CacheError::Codec(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Cache(CacheError::Transport(TransportError::Timeout)) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            ApiError::Cache(CacheError::Transport(TransportError::InvalidTtl(_))) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Cache(CacheError::Transport(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Cache(CacheError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}
