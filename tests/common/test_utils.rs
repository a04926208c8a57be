use super::mocks::MockModelClient;
use axum::{Router, body::Body, http::Response};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use pid_analyzer::{
    config::LlmConfig,
    controller::InteractionController,
    prompt::PromptContext,
    server::{self, handlers::AppState},
    session::SessionStore,
};
use serde_json::Value;
use std::{io::Cursor, sync::Arc};

pub const MULTIPART_BOUNDARY: &str = "pid-analyzer-test-boundary";

/// Small striped diagram stand-in
pub fn sample_image() -> DynamicImage {
    let mut img = RgbImage::new(16, 12);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let shade = if (x + y) % 4 == 0 { 20 } else { 230 };
        *pixel = Rgb([shade, shade, 255 - shade]);
    }
    DynamicImage::ImageRgb8(img)
}

pub fn image_bytes(format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    sample_image().write_to(&mut buffer, format).unwrap();
    buffer.into_inner()
}

pub fn png_bytes() -> Vec<u8> {
    image_bytes(ImageFormat::Png)
}

/// Model config pointed at a local mock server
pub fn create_test_llm_config(base_url: &str) -> LlmConfig {
    LlmConfig {
        base_url: base_url.to_string(),
        api_key: "test-api-key".to_string(),
        ..LlmConfig::default()
    }
}

pub fn create_controller(model: Arc<MockModelClient>) -> InteractionController {
    InteractionController::new(model, Arc::new(PromptContext::default()))
}

pub fn create_test_app(model: Arc<MockModelClient>) -> Router {
    let state = AppState {
        sessions: Arc::new(SessionStore::new()),
        controller: Arc::new(create_controller(model)),
    };
    server::router(state, 1024 * 1024)
}

/// Builds a single-file multipart body, returning the content type and bytes
pub fn multipart_body(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> (String, Vec<u8>) {
    let mut body = format!(
        "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

    (
        format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        body,
    )
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
