//! End-to-end submission flow against an in-process mock upstream, with
//! request counting to observe exactly when upstream calls happen.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use design_assistant::config::Config;
use design_assistant::preferences::{DesignSource, RawFields};
use design_assistant::session::DesignSession;

#[derive(Clone)]
struct MockState {
    calls: Arc<AtomicUsize>,
    fail_attempts: usize,
}

async fn generate_handler(
    State(state): State<MockState>,
    Json(req): Json<serde_json::Value>,
) -> Response {
    let attempt = state.calls.fetch_add(1, Ordering::SeqCst) + 1;
    if attempt <= state.fail_attempts {
        return (StatusCode::INTERNAL_SERVER_ERROR, "simulated outage").into_response();
    }
    // Echo the style line so distinct submissions produce distinct text.
    let prompt = req
        .get("prompt")
        .and_then(|p| p.as_str())
        .unwrap_or_default();
    let style_line = prompt.lines().nth(1).unwrap_or_default();
    Json(json!({ "output": format!("# Plan\n\nGenerated for {style_line}") })).into_response()
}

async fn search_handler(State(state): State<MockState>) -> Response {
    state.calls.fetch_add(1, Ordering::SeqCst);
    if state.fail_attempts > 0 {
        return (StatusCode::INTERNAL_SERVER_ERROR, "simulated outage").into_response();
    }
    Json(json!({
        "results": [
            { "urls": { "regular": "https://example.com/one" } },
            { "urls": { "regular": "https://example.com/two" } }
        ]
    }))
    .into_response()
}

async fn spawn_mock(fail_attempts: usize) -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let state = MockState {
        calls: calls.clone(),
        fail_attempts,
    };
    let app = Router::new()
        .route("/generate", post(generate_handler))
        .route("/search/photos", get(search_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), calls)
}

fn text_config(base: &str) -> Config {
    Config {
        genai_api_key: "test-key".to_string(),
        genai_base_url: format!("{base}/generate"),
        genai_model: "mock".to_string(),
        image_api_key: None,
        // unroutable: no image call may ever reach it in these tests
        image_base_url: "http://127.0.0.1:9".to_string(),
    }
}

fn image_config(base: &str) -> Config {
    Config {
        genai_api_key: "test-key".to_string(),
        genai_base_url: "http://127.0.0.1:9/generate".to_string(),
        genai_model: "mock".to_string(),
        image_api_key: Some("image-key".to_string()),
        image_base_url: base.to_string(),
    }
}

fn raw_fields(style: &str, extras: Option<&str>) -> RawFields {
    RawFields {
        style: style.to_string(),
        size: "2000 sq ft".to_string(),
        rooms: "4".to_string(),
        extras: extras.map(str::to_string),
        ..RawFields::default()
    }
}

#[tokio::test]
async fn identical_submissions_make_one_upstream_call() {
    let (base, calls) = spawn_mock(0).await;
    let mut session = DesignSession::new(&text_config(&base));

    let descriptor = session.aggregate(&raw_fields("Modern", None)).unwrap();
    let first = session.generate(&descriptor).await;
    let second = session.generate(&descriptor).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.markdown, second.markdown);
    assert_eq!(first.source, DesignSource::Upstream);
    assert_eq!(second.source, DesignSource::Cache);
}

#[tokio::test]
async fn validation_failure_makes_no_upstream_call() {
    let (base, calls) = spawn_mock(0).await;
    let mut session = DesignSession::new(&text_config(&base));

    let raw = RawFields {
        extras: Some("anything".to_string()),
        ..RawFields::default()
    };
    let err = session.aggregate(&raw).unwrap_err();
    assert_eq!(err.missing, vec!["style", "size", "rooms"]);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn upstream_failure_falls_back_and_is_not_cached() {
    let (base, calls) = spawn_mock(usize::MAX).await;
    let mut session = DesignSession::new(&text_config(&base));

    let descriptor = session.aggregate(&raw_fields("Modern", None)).unwrap();
    let result = session.generate(&descriptor).await;

    assert_eq!(result.source, DesignSource::Fallback);
    assert!(!result.markdown.is_empty());
    assert!(result.markdown.contains("Modern"));
    assert!(result.markdown.contains("2000 sq ft"));
    assert!(result.markdown.contains("4"));

    // the fallback never lands in the cache, so the next submission retries
    session.generate(&descriptor).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn extras_change_produces_an_independent_entry() {
    let (base, calls) = spawn_mock(0).await;
    let mut session = DesignSession::new(&text_config(&base));

    let plain = session.aggregate(&raw_fields("Modern", None)).unwrap();
    let with_extras = session
        .aggregate(&raw_fields("Modern", Some("wine cellar")))
        .unwrap();

    session.generate(&plain).await;
    session.generate(&with_extras).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // both entries now serve hits
    session.generate(&plain).await;
    session.generate(&with_extras).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(session.cache().len(), 2);
}

#[tokio::test]
async fn live_image_search_returns_result_urls() {
    let (base, calls) = spawn_mock(0).await;
    let mut session = DesignSession::new(&image_config(&base));

    let descriptor = session.aggregate(&raw_fields("Modern", None)).unwrap();
    let images = session.fetch_images(&descriptor).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        images.urls(),
        ["https://example.com/one", "https://example.com/two"]
    );
}

#[tokio::test]
async fn image_search_failure_collapses_to_empty() {
    let (base, _calls) = spawn_mock(usize::MAX).await;
    let mut session = DesignSession::new(&image_config(&base));

    let descriptor = session.aggregate(&raw_fields("Modern", None)).unwrap();
    let images = session.fetch_images(&descriptor).await;
    assert!(images.is_empty());
}

#[tokio::test]
async fn missing_image_credential_uses_curated_table() {
    // no server anywhere: the curated table must answer locally
    let mut session = DesignSession::new(&text_config("http://127.0.0.1:9"));

    let descriptor = session
        .aggregate(&raw_fields("Modern Farmhouse", None))
        .unwrap();
    let images = session.fetch_images(&descriptor).await;

    assert_eq!(images.len(), 3);
    assert_eq!(
        images.urls(),
        design_assistant::images::curated_images("modern").urls()
    );
}
