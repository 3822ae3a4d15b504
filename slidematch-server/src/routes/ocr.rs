use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::routes::{decode_base64, ApiSuccess};
use crate::state::AppState;

/// Body of `POST /ocr`.
#[derive(Debug, Deserialize)]
pub struct OcrRequest {
    /// Base64-encoded captcha image.
    #[serde(default)]
    pub image: Option<String>,
}

/// Recognizes the text in a captcha image.
///
/// ```json
/// // Request
/// { "image": "iVBORw0KGgo..." }
///
/// // Response
/// { "code": 0, "data": "a7Kx" }
/// ```
pub async fn recognize_text(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<ApiSuccess<String>>> {
    let started = Instant::now();
    match recognize(state, &body).await {
        Ok(text) => {
            tracing::info!(
                "recognized {text:?} in {:.3}s",
                started.elapsed().as_secs_f64()
            );
            Ok(Json(ApiSuccess::new(text)))
        }
        Err(err) => {
            tracing::error!(error = %err, "text recognition request failed");
            Err(err)
        }
    }
}

async fn recognize(state: Arc<AppState>, body: &[u8]) -> ApiResult<String> {
    let request: OcrRequest =
        serde_json::from_slice(body).map_err(|err| ApiError::Recognition(err.to_string()))?;
    let encoded = request.image.ok_or(ApiError::MissingImage)?;
    let image = decode_base64(&encoded).map_err(|err| ApiError::Recognition(err.to_string()))?;

    let text = tokio::task::spawn_blocking(move || state.recognizer.recognize(&image))
        .await
        .map_err(|err| ApiError::Recognition(err.to_string()))??;
    Ok(text)
}
