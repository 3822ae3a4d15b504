use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub type ApiResult<T> = Result<T, ApiError>;

/// Failures reported to clients as `{"code": 1, "message": ...}`.
///
/// Every variant except `NotFound` is answered with HTTP 200; clients read
/// the outcome from `code`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing image parameter")]
    MissingImage,

    #[error("recognition failed: {0}")]
    Recognition(String),

    #[error("missing required parameters")]
    MissingParameters,

    #[error("base64 decode failed: {0}")]
    Base64(String),

    #[error("not found")]
    NotFound,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::OK,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "code": 1,
            "message": self.to_string(),
        }));
        (self.status_code(), body).into_response()
    }
}

impl From<slidematch::SlideError> for ApiError {
    fn from(err: slidematch::SlideError) -> Self {
        match err {
            slidematch::SlideError::ClassificationFailed { reason } => ApiError::Recognition(reason),
            other => ApiError::Recognition(other.to_string()),
        }
    }
}
