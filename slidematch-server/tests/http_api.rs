//! Drives the router end to end with in-memory requests.

use std::io::Cursor;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::{engine::general_purpose, Engine as _};
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use slidematch::{SlideResult, TextRecognizer};
use slidematch_server::{build_router, AppState, ServerConfig};
use tower::ServiceExt;

fn app(state: AppState) -> Router {
    build_router(Arc::new(state), &ServerConfig::default())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post(app: Router, uri: &str, body: impl Into<Body>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();
    send(app, request).await
}

fn noise_rgb(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    RgbImage::from_fn(width, height, |_, _| Rgb([rng.random(), rng.random(), rng.random()]))
}

fn png_base64(img: RgbImage) -> String {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    general_purpose::STANDARD.encode(buf.into_inner())
}

fn default_offset() -> Value {
    json!({"code": 0, "data": {"x": 150, "y": 0}})
}

struct Upper;

impl TextRecognizer for Upper {
    fn classify(&self, image: &[u8]) -> SlideResult<String> {
        Ok(String::from_utf8_lossy(image).to_uppercase())
    }
}

#[tokio::test]
async fn root_reports_running() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(app(AppState::new()), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"status": "running", "message": "captcha recognition service is running"})
    );
}

#[tokio::test]
async fn unknown_route_uses_error_envelope() {
    let request = Request::builder().uri("/nope").body(Body::empty()).unwrap();
    let (status, body) = send(app(AppState::new()), request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"code": 1, "message": "not found"}));
}

#[tokio::test]
async fn slide_without_parameters_is_rejected() {
    let (status, body) = post(app(AppState::new()), "/slide", "{}").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"code": 1, "message": "missing required parameters"}));

    let (_, body) = post(app(AppState::new()), "/slide", r#"{"bg_image": "aGk="}"#).await;
    assert_eq!(body["code"], 1);
}

#[tokio::test]
async fn slide_full_image_answers_default() {
    let payload = json!({"full_image": png_base64(noise_rgb(40, 20, 1))}).to_string();
    let (_, body) = post(app(AppState::new()), "/slide", payload).await;
    assert_eq!(body, default_offset());
}

#[tokio::test]
async fn slide_malformed_body_answers_default() {
    let (_, body) = post(app(AppState::new()), "/slide", "not json").await;
    assert_eq!(body, default_offset());
    let (_, body) = post(app(AppState::new()), "/slide", "[1, 2]").await;
    assert_eq!(body, default_offset());
}

#[tokio::test]
async fn slide_bad_base64_is_reported() {
    let payload = json!({"bg_image": "%%%", "slide_image": "aGk="}).to_string();
    let (_, body) = post(app(AppState::new()), "/slide", payload).await;
    assert_eq!(body["code"], 1);
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("base64 decode failed: "), "{message}");
}

#[tokio::test]
async fn slide_non_string_image_is_reported() {
    let payload = json!({"bg_image": png_base64(noise_rgb(60, 30, 4)), "slide_image": 123});
    let (_, body) = post(app(AppState::new()), "/slide", payload.to_string()).await;
    assert_eq!(
        body,
        json!({"code": 1, "message": "base64 decode failed: slide_image must be a string"})
    );

    let (_, body) = post(
        app(AppState::new()),
        "/slide",
        r#"{"bg_image": null, "slide_image": "aGk="}"#,
    )
    .await;
    assert_eq!(body["code"], 1);
}

#[tokio::test]
async fn slide_full_image_of_any_type_answers_default() {
    for full_image in [json!(true), json!(null), json!({"nested": 1})] {
        let payload = json!({"full_image": full_image}).to_string();
        let (_, body) = post(app(AppState::new()), "/slide", payload).await;
        assert_eq!(body, default_offset());
    }
}

#[tokio::test]
async fn slide_non_image_payload_answers_default() {
    let text = general_purpose::STANDARD.encode(b"definitely not an image");
    let payload = json!({"bg_image": text, "slide_image": text}).to_string();
    let (_, body) = post(app(AppState::new()), "/slide", payload).await;
    assert_eq!(body, default_offset());
}

#[tokio::test]
async fn slide_tiny_image_answers_default() {
    let payload = json!({
        "bg_image": png_base64(noise_rgb(60, 30, 2)),
        "slide_image": png_base64(noise_rgb(9, 9, 3)),
    })
    .to_string();
    let (_, body) = post(app(AppState::new()), "/slide", payload).await;
    assert_eq!(body, default_offset());
}

#[tokio::test]
async fn slide_locates_exact_piece() {
    let bg = noise_rgb(90, 40, 7);
    let piece = image::imageops::crop_imm(&bg, 37, 12, 16, 14).to_image();
    let payload = json!({
        "bg_image": png_base64(bg),
        "slide_image": png_base64(piece),
        "full_image": true,
    })
    .to_string();
    let (status, body) = post(app(AppState::new()), "/slide", payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"code": 0, "data": {"x": 37, "y": 12}}));
}

#[tokio::test]
async fn ocr_requires_image_field() {
    let (status, body) = post(app(AppState::new()), "/ocr", r#"{"img": "x"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"code": 1, "message": "missing image parameter"}));
}

#[tokio::test]
async fn ocr_reports_failures() {
    let (_, body) = post(app(AppState::new()), "/ocr", r#"{"image": "%%%"}"#).await;
    assert_eq!(body["code"], 1);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("recognition failed: "));

    let payload = json!({"image": general_purpose::STANDARD.encode(b"abc")}).to_string();
    let (_, body) = post(app(AppState::new()), "/ocr", payload).await;
    assert_eq!(
        body,
        json!({"code": 1, "message": "recognition failed: no text recognition model is loaded"})
    );
}

#[tokio::test]
async fn ocr_returns_recognizer_text() {
    let state = AppState::new().with_recognizer(Arc::new(Upper));
    let payload = json!({"image": general_purpose::STANDARD.encode(b"x7kq")}).to_string();
    let (_, body) = post(app(state), "/ocr", payload).await;
    assert_eq!(body, json!({"code": 0, "data": "X7KQ"}));
}

#[tokio::test]
async fn cors_preflight_is_allowed() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/slide")
        .header("origin", "https://example.com")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app(AppState::new()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers.get("access-control-allow-origin").unwrap(),
        "https://example.com"
    );
    assert_eq!(headers.get("access-control-allow-credentials").unwrap(), "true");
    assert_eq!(headers.get("access-control-allow-methods").unwrap(), "POST");
    assert_eq!(
        headers.get("access-control-allow-headers").unwrap(),
        "content-type"
    );
}
