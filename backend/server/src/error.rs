use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Email already in use")]
    EmailInUse,

    /// Same text for an unknown email and a wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Please authenticate")]
    Unauthorized,

    #[error("Order could not be placed: {0}")]
    OrderFailed(#[source] StoreError),

    #[error("Internal error: {0}")]
    InternalError(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl AppError {
    pub fn internal(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        AppError::InternalError(error.into())
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        AppError::internal(error)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Validation { .. }
            | AppError::EmailInUse
            | AppError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::OrderFailed { .. } | AppError::InternalError { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = match &self {
            AppError::OrderFailed(source) => {
                error!("Order creation error: {source}");
                json!({ "message": "Server error", "error": source.to_string() })
            }
            AppError::InternalError(source) => {
                error!("Internal error: {source}");
                json!({ "message": "Server error" })
            }
            other => json!({ "message": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
