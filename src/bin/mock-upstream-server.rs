//! Stand-in for both upstreams: the generative-text service and the image
//! search. Counts requests (exposed at /stats) so tests and demos can
//! observe that a cache hit makes no upstream call, and fails the first N
//! generate calls when asked, to exercise the fallback path.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

#[derive(Clone)]
struct AppState {
    generate_calls: Arc<AtomicUsize>,
    search_calls: Arc<AtomicUsize>,
    fail_generate_attempts: usize,
}

#[derive(Deserialize)]
struct GenRequest {
    prompt: String,
}

#[derive(Serialize)]
struct GenResponse {
    output: String,
}

async fn generate(State(state): State<AppState>, Json(req): Json<GenRequest>) -> Response {
    let attempt = state.generate_calls.fetch_add(1, Ordering::SeqCst) + 1;
    println!("Mock upstream: generate call {attempt}");
    println!("Prompt preview: {}...", &req.prompt[..req.prompt.len().min(200)]);

    if attempt <= state.fail_generate_attempts {
        println!("Mock upstream: simulating outage");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "simulated upstream outage",
        )
            .into_response();
    }

    Json(GenResponse {
        output: canned_design(),
    })
    .into_response()
}

// Deterministic Markdown with the same five sections a real reply carries.
fn canned_design() -> String {
    let mut s = String::new();
    s.push_str("# Custom Home Design Plan\n\n");
    s.push_str("## Design Concept Overview\n\n");
    s.push_str("A light-filled home arranged around a central open living area.\n\n");
    s.push_str("## Layout with Room Sizes\n\n");
    s.push_str("- Living area: 24 x 18 ft\n- Kitchen: 14 x 12 ft\n- Bedrooms: 12 x 12 ft each\n\n");
    s.push_str("## Furniture Recommendations\n\n");
    s.push_str("Low-profile seating, a solid oak dining table, built-in storage walls.\n\n");
    s.push_str("## Materials and Finishes\n\n");
    s.push_str("White oak floors, honed stone counters, matte black fixtures.\n\n");
    s.push_str("## Style-Specific Tips\n\n");
    s.push_str("Keep sight lines open and repeat one accent material per room.\n");
    s
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: String,
    #[serde(default)]
    per_page: Option<usize>,
    #[serde(default)]
    orientation: Option<String>,
}

async fn search_photos(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<serde_json::Value> {
    let call = state.search_calls.fetch_add(1, Ordering::SeqCst) + 1;
    let count = params.per_page.unwrap_or(3).min(3);
    println!(
        "Mock upstream: search call {call} (query: {}, orientation: {})",
        &params.query[..params.query.len().min(80)],
        params.orientation.as_deref().unwrap_or("any"),
    );

    let results: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            serde_json::json!({
                "urls": { "regular": format!("https://images.unsplash.com/photo-mock-{i}") }
            })
        })
        .collect();

    Json(serde_json::json!({ "results": results }))
}

async fn stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "generate_calls": state.generate_calls.load(Ordering::SeqCst),
        "search_calls": state.search_calls.load(Ordering::SeqCst),
    }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let port = std::env::var("MOCK_UPSTREAM_PORT")
        .unwrap_or_else(|_| "8081".to_string())
        .parse::<u16>()
        .unwrap_or(8081);

    let fail_generate_attempts = std::env::var("MOCK_FAIL_GENERATE")
        .unwrap_or_else(|_| "0".to_string())
        .parse::<usize>()
        .unwrap_or(0);

    let state = AppState {
        generate_calls: Arc::new(AtomicUsize::new(0)),
        search_calls: Arc::new(AtomicUsize::new(0)),
        fail_generate_attempts,
    };

    let app = Router::new()
        .route("/generate", post(generate))
        .route("/search/photos", get(search_photos))
        .route("/stats", get(stats))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("Mock upstream server listening on http://{addr}");
    if fail_generate_attempts > 0 {
        println!("Will fail the first {fail_generate_attempts} generate call(s)");
    }
    println!("Point GENAI_BASE_URL at http://{addr}/generate");
    println!("Point IMAGE_BASE_URL at http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
