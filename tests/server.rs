//! Integration tests for the HTTP API.
//!
//! Each test builds its own router around an orchestrator with in-process
//! stages, so no model or network access is needed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use omslag::cli::commands::router;
use omslag::config::Settings;
use omslag::imaging::{write_image, ImageGenerator};
use omslag::orchestrator::Orchestrator;
use omslag::scratch::require_file;
use omslag::summarization::Summarizer;
use omslag::transcription::{Transcriber, Transcript};
use omslag::{OmslagError, Result};

// =============================================================================
// Helpers
// =============================================================================

const BOUNDARY: &str = "omslag-test-boundary";
const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";

struct EchoTranscriber;

#[async_trait]
impl Transcriber for EchoTranscriber {
    async fn transcribe(&self, path: &Path) -> Result<Transcript> {
        let text = String::from_utf8_lossy(&tokio::fs::read(path).await?).to_string();
        Ok(Transcript::new(text, None))
    }
}

struct FileSummarizer {
    lose_transcript: bool,
}

#[async_trait]
impl Summarizer for FileSummarizer {
    async fn summarize(&self, text_source: &Path) -> Result<String> {
        if self.lose_transcript {
            std::fs::remove_file(text_source)?;
        }
        require_file(text_source)?;
        Ok(format!("A summary of {}", tokio::fs::read_to_string(text_source).await?))
    }
}

struct PngGenerator {
    fail: bool,
}

#[async_trait]
impl ImageGenerator for PngGenerator {
    async fn generate_image(&self, prompt: &str, output_path: &Path) -> Result<PathBuf> {
        if self.fail {
            return Err(OmslagError::OpenAI("CUDA out of memory".to_string()));
        }
        let mut bytes = PNG.to_vec();
        bytes.extend_from_slice(prompt.as_bytes());
        write_image(output_path, &bytes).await
    }
}

struct TestApp {
    _dir: TempDir,
    router: axum::Router,
}

fn make_app_with(lose_transcript: bool, fail_generation: bool) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = Settings::default();
    settings.general.temp_dir = dir.path().join("scratch").to_string_lossy().to_string();
    settings.image.output_dir = dir.path().join("covers").to_string_lossy().to_string();
    settings.server.max_upload_mb = 1;

    let orchestrator = Orchestrator::with_components(
        settings,
        Arc::new(EchoTranscriber),
        Arc::new(FileSummarizer { lose_transcript }),
        Arc::new(PngGenerator {
            fail: fail_generation,
        }),
    )
    .unwrap();

    TestApp {
        _dir: dir,
        router: router(Arc::new(orchestrator)),
    }
}

fn make_app() -> TestApp {
    make_app_with(false, false)
}

/// Encode `(name, filename, content)` parts as a multipart body.
fn multipart_body(parts: &[(&str, Option<&str>, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: video/mp4\r\n\r\n",
                    name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(content.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_post(uri: &str, parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
    Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

/// Read full response body bytes.
async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), 4 * 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(resp: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

// =============================================================================
// Endpoints
// =============================================================================

#[tokio::test]
async fn test_health() {
    let app = make_app();
    let resp = app
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "ok");
}

#[tokio::test]
async fn test_process_returns_cover_image() {
    let app = make_app();
    let resp = app
        .router
        .oneshot(multipart_post(
            "/process",
            &[
                ("file", Some("talk.mp4"), "a talk about lighthouses"),
                ("style", None, "watercolor"),
                ("color", None, "teal"),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");
    assert!(resp.headers().contains_key("x-request-id"));

    let bytes = body_bytes(resp).await;
    assert!(bytes.starts_with(PNG));
    assert!(bytes.ends_with(
        b"A summary of a talk about lighthouses in Style: watercolor, in Color: teal."
    ));
}

#[tokio::test]
async fn test_process_without_style_fields() {
    let app = make_app();
    let resp = app
        .router
        .oneshot(multipart_post(
            "/process",
            &[("file", Some("clip.mp4"), "waves")],
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_bytes(resp)
        .await
        .ends_with(b"A summary of waves in Style: , in Color: ."));
}

#[tokio::test]
async fn test_process_missing_file_is_bad_request() {
    let app = make_app();
    let resp = app
        .router
        .oneshot(multipart_post("/process", &[("style", None, "retro")]))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(json["kind"], "invalid_input");
    assert_eq!(json["error"], "Invalid input: missing 'file' field");
    assert!(json.get("stage").is_none());
}

#[tokio::test]
async fn test_process_empty_file_is_bad_request() {
    let app = make_app();
    let resp = app
        .router
        .oneshot(multipart_post("/process", &[("file", Some("empty.mp4"), "")]))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_transcript_is_not_found() {
    let app = make_app_with(true, false);
    let resp = app
        .router
        .oneshot(multipart_post(
            "/process",
            &[("file", Some("clip.mp4"), "video")],
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let json = body_json(resp).await;
    assert_eq!(json["kind"], "not_found");
    assert_eq!(json["stage"], "summarization");
}

#[tokio::test]
async fn test_generation_failure_is_server_error() {
    let app = make_app_with(false, true);
    let resp = app
        .router
        .oneshot(multipart_post(
            "/process",
            &[("file", Some("clip.mp4"), "video")],
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(resp).await;
    assert_eq!(json["kind"], "generation_failure");
    assert_eq!(json["stage"], "image_generation");
    assert!(json["error"].as_str().unwrap().contains("CUDA out of memory"));
}

#[tokio::test]
async fn test_summarize_returns_json() {
    let app = make_app();
    let resp = app
        .router
        .oneshot(multipart_post(
            "/summarize",
            &[("file", Some("bread.mp4"), "a recipe for bread")],
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["summary"], "A summary of a recipe for bread");
}

#[tokio::test]
async fn test_upload_over_limit_is_rejected() {
    let app = make_app();
    let video = "x".repeat(2 * 1024 * 1024);
    let resp = app
        .router
        .oneshot(multipart_post(
            "/process",
            &[("file", Some("big.mp4"), video.as_str())],
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
