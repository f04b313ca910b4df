//! HTTP shell tests.
//!
//! Drives the axum router in-process with `tower::ServiceExt::oneshot`; the
//! generation backend is a canned in-memory generator.

#![cfg(feature = "http")]
// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use selfheal::llm::{GenerationOutcome, TextGenerator};
use selfheal::observability::ObservabilityHandle;
use selfheal::pipeline::PipelineGraph;
use selfheal::server::{AppState, router};
use selfheal::{KnowledgeStore, RemediationPipeline};
use serde_json::{Value, json};
use tower::ServiceExt;

struct Canned(GenerationOutcome);

impl TextGenerator for Canned {
    fn name(&self) -> &'static str {
        "canned"
    }

    fn generate(&self, _prompt: &str, _max_output_tokens: u32) -> GenerationOutcome {
        self.0.clone()
    }
}

fn state_with(outcome: GenerationOutcome, graph: bool) -> AppState {
    if graph {
        state_with_graph(outcome).0
    } else {
        let pipeline = RemediationPipeline::new(
            Arc::new(KnowledgeStore::default()),
            Arc::new(Canned(outcome)),
        );
        AppState::new(Some(pipeline), None, ObservabilityHandle::default())
    }
}

fn state_with_graph(outcome: GenerationOutcome) -> (AppState, Arc<PipelineGraph>) {
    let graph = Arc::new(PipelineGraph::new());
    let pipeline =
        RemediationPipeline::new(Arc::new(KnowledgeStore::default()), Arc::new(Canned(outcome)))
            .with_recorder(graph.clone());
    let state = AppState::new(
        Some(pipeline),
        Some(graph.clone()),
        ObservabilityHandle::default(),
    );
    (state, graph)
}

async fn post_analyze(state: AppState, body: Value) -> (StatusCode, Value) {
    let response = router(state)
        .oneshot(
            Request::post("/api/analyze")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_index_page() {
    let response = router(state_with(GenerationOutcome::NoUsableText, false))
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get(header::X_FRAME_OPTIONS).unwrap(), "DENY");

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("<textarea"));
    assert!(html.contains("Run Self-Healing Analysis"));
}

#[tokio::test]
async fn test_health() {
    let response = router(state_with(GenerationOutcome::NoUsableText, false))
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_analyze_report() {
    let state = state_with(GenerationOutcome::Report("Free disk space".to_string()), true);
    let (status, body) = post_analyze(state, json!({"incident": "Disk space < 5%"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "report");
    assert_eq!(body["message"], "Free disk space");
    assert_eq!(body["outcome"]["kind"], "report");
    assert_eq!(body["context"][0], "Disk space alerts can lead to service crashes.");
    assert_eq!(body["graph_recorded"], true);
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn test_graph_does_not_retain_reported_runs() {
    let (state, graph) = state_with_graph(GenerationOutcome::Report("ok".to_string()));

    for i in 0..200 {
        let (status, body) =
            post_analyze(state.clone(), json!({"incident": format!("disk alert {i}")})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["graph_recorded"], true);
    }

    assert!(graph.runs().is_empty());
}

#[tokio::test]
async fn test_generation_failure_is_shown_as_report_text() {
    let state = state_with(GenerationOutcome::RequestFailed("timed out".to_string()), false);
    let (status, body) = post_analyze(state, json!({"incident": "CPU spike"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "report");
    assert_eq!(body["message"], "⚠️ Network/Request error: timed out");
    assert_eq!(body["outcome"]["kind"], "request_failed");
    assert_eq!(body["graph_recorded"], false);
}

#[tokio::test]
async fn test_blank_incident_warning() {
    let state = state_with(GenerationOutcome::NoUsableText, false);
    let (status, body) = post_analyze(state, json!({"incident": "   "})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "warning");
    assert_eq!(body["message"], "Please enter system logs or incidents.");
}

#[tokio::test]
async fn test_missing_field_is_blank_incident() {
    let state = state_with(GenerationOutcome::NoUsableText, false);
    let (_, body) = post_analyze(state, json!({})).await;
    assert_eq!(body["status"], "warning");
}

#[tokio::test]
async fn test_missing_key_error() {
    let state = AppState::new(None, None, ObservabilityHandle::default());
    let (status, body) = post_analyze(state, json!({"incident": "Disk full"})).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "error");
    assert_eq!(
        body["message"],
        "GEMINI_API_KEY not found. Set environment variable or config file."
    );
}

#[tokio::test]
async fn test_metrics_disabled() {
    let response = router(state_with(GenerationOutcome::NoUsableText, false))
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
