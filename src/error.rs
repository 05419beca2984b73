use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;
use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<&'static str>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, fields) = match self {
            AppError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                "Missing required fields".to_string(),
                Some(e.fields),
            ),
            AppError::NotFound(name) => (StatusCode::NOT_FOUND, format!("{} not found", name), None),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::Store(e) => {
                error!("store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
            fields,
        });

        (status, body).into_response()
    }
}
