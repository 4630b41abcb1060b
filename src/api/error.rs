use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No files uploaded")]
    NoFiles,

    #[error("Too many files: at most {0} allowed per request")]
    TooManyFiles(usize),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Route not found")]
    NotFound,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, detail) = match self {
            AppError::NoFiles => (
                StatusCode::BAD_REQUEST,
                "No files uploaded".to_string(),
                None,
            ),
            AppError::TooManyFiles(max) => (
                StatusCode::BAD_REQUEST,
                "Too many files".to_string(),
                Some(format!("At most {} files may be uploaded at once", max)),
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "Invalid upload request".to_string(),
                Some(msg),
            ),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "File too large".to_string(), Some(msg))
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, "Route not found".to_string(), None),
        };

        let body = match detail {
            Some(error) => json!({ "success": false, "message": message, "error": error }),
            None => json!({ "success": false, "message": message }),
        };

        (status, Json(body)).into_response()
    }
}
