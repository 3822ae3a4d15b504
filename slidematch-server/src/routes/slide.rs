use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use slidematch::{MatchRequest, SlideOffset};

use crate::error::{ApiError, ApiResult};
use crate::routes::{decode_base64, ApiSuccess};
use crate::state::AppState;

/// Body of `POST /slide`: either both halves of the puzzle or one screenshot.
///
/// Fields keep their raw JSON value so that presence decides the request
/// shape and a wrongly typed field only fails the field that is used.
/// An explicit `null` counts as present.
#[derive(Debug, Default, Deserialize)]
pub struct SlideRequest {
    /// Base64-encoded background image.
    #[serde(default, deserialize_with = "present")]
    pub bg_image: Option<Value>,
    /// Base64-encoded puzzle piece.
    #[serde(default, deserialize_with = "present")]
    pub slide_image: Option<Value>,
    /// Base64-encoded full screenshot. Only its presence matters.
    #[serde(default, deserialize_with = "present")]
    pub full_image: Option<Value>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl SlideRequest {
    /// Parses a body. Anything but a JSON object is rejected.
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        match serde_json::from_slice(body)? {
            value @ Value::Object(_) => Self::deserialize(value),
            _ => Err(serde::de::Error::custom("expected a JSON object")),
        }
    }
}

/// Offset payload: `{"x": .., "y": ..}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SlideData {
    pub x: u32,
    pub y: u32,
}

impl From<SlideOffset> for SlideData {
    fn from(offset: SlideOffset) -> Self {
        Self {
            x: offset.x,
            y: offset.y,
        }
    }
}

pub type SlideResponse = ApiResult<Json<ApiSuccess<SlideData>>>;

fn respond(offset: SlideOffset) -> SlideResponse {
    Ok(Json(ApiSuccess::new(offset.into())))
}

/// Computes the horizontal offset the slider has to travel.
///
/// The two-image shape wins when both shapes are present. Matching
/// failures never surface: they answer the default offset `(150, 0)`.
pub async fn solve_slide(State(state): State<Arc<AppState>>, body: Bytes) -> SlideResponse {
    let request = match SlideRequest::parse(&body) {
        Ok(request) => request,
        Err(err) => {
            tracing::warn!(error = %err, "unreadable slide request, answering default offset");
            return respond(SlideOffset::DEFAULT);
        }
    };

    match request {
        SlideRequest {
            bg_image: Some(bg_image),
            slide_image: Some(slide_image),
            ..
        } => solve_pair(state, &bg_image, &slide_image).await,
        SlideRequest {
            full_image: Some(_),
            ..
        } => {
            tracing::info!("full screenshot received, answering default offset");
            respond(state.coordinator.resolve_full_image().offset)
        }
        _ => Err(ApiError::MissingParameters),
    }
}

fn decode_field(name: &str, value: &Value) -> Result<Vec<u8>, String> {
    let text = value
        .as_str()
        .ok_or_else(|| format!("{name} must be a string"))?;
    decode_base64(text).map_err(|err| err.to_string())
}

async fn solve_pair(state: Arc<AppState>, bg_image: &Value, slide_image: &Value) -> SlideResponse {
    let started = Instant::now();
    let decoded = decode_field("bg_image", bg_image)
        .and_then(|bg| Ok((bg, decode_field("slide_image", slide_image)?)));
    let (background, template) = match decoded {
        Ok(pair) => pair,
        Err(err) => {
            tracing::error!(error = %err, "slide images are not valid base64");
            return Err(ApiError::Base64(err));
        }
    };

    let task = tokio::task::spawn_blocking(move || {
        state
            .coordinator
            .resolve_detailed(&MatchRequest::new(&background, &template))
    });
    let resolution = match task.await {
        Ok(resolution) => resolution,
        Err(err) => {
            tracing::warn!(error = %err, "slide matching task failed, answering default offset");
            return respond(SlideOffset::DEFAULT);
        }
    };

    tracing::info!(
        source = %resolution.source,
        "slide offset {} in {:.3}s",
        resolution.offset,
        started.elapsed().as_secs_f64()
    );
    respond(resolution.offset)
}
