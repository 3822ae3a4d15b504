//! HTTP handlers.
//!
//! - `ocr`: text captcha recognition
//! - `slide`: slide-captcha offsets
//!
//! Handlers take the raw body and parse it themselves so that a malformed
//! body follows each endpoint's own error policy.

pub mod ocr;
pub mod slide;

use crate::error::ApiError;
use axum::Json;
use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;
use serde_json::{json, Value};

/// Successful envelope: `{"code": 0, "data": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiSuccess<T> {
    pub code: u8,
    pub data: T,
}

impl<T> ApiSuccess<T> {
    pub fn new(data: T) -> Self {
        Self { code: 0, data }
    }
}

/// Liveness message (GET /).
pub async fn root() -> Json<Value> {
    Json(json!({
        "status": "running",
        "message": "captcha recognition service is running",
    }))
}

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Decodes standard base64, tolerating embedded whitespace and a
/// `data:<mime>;base64,` prefix.
pub(crate) fn decode_base64(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = encoded
        .split_once(";base64,")
        .map_or(encoded, |(_, rest)| rest);
    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    general_purpose::STANDARD.decode(compact)
}
