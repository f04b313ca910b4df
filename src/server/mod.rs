//! Single-page HTTP shell.
//!
//! Serves a page with an incident textarea and a trigger button, plus a JSON
//! endpoint that runs one analysis per request:
//!
//! | Route | Method | Purpose |
//! |-------|--------|---------|
//! | `/` | GET | The page |
//! | `/api/analyze` | POST | `{"incident": "..."}` to a status/message object |
//! | `/health` | GET | Liveness check |
//! | `/metrics` | GET | Prometheus snapshot (404 when metrics are off) |
//!
//! The generation call is blocking, so each analysis runs on the blocking
//! thread pool. Requests share only the read-only pipeline.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::cli::build_pipeline;
use crate::config::SelfhealConfig;
use crate::knowledge::Fact;
use crate::llm::GenerationOutcome;
use crate::observability::ObservabilityHandle;
use crate::pipeline::{PipelineGraph, RemediationPipeline};
use crate::{Error, Result};

const INDEX_HTML: &str = include_str!("index.html");

const CONTENT_SECURITY_POLICY: &str = "default-src 'none'; script-src 'unsafe-inline'; \
     style-src 'unsafe-inline'; connect-src 'self'; frame-ancestors 'none'";

/// Shared state for the HTTP shell.
#[derive(Clone)]
pub struct AppState {
    /// `None` when no API key is configured; analyses are refused.
    pipeline: Option<RemediationPipeline>,
    graph: Option<Arc<PipelineGraph>>,
    observability: ObservabilityHandle,
}

impl AppState {
    /// Creates server state.
    #[must_use]
    pub const fn new(
        pipeline: Option<RemediationPipeline>,
        graph: Option<Arc<PipelineGraph>>,
        observability: ObservabilityHandle,
    ) -> Self {
        Self {
            pipeline,
            graph,
            observability,
        }
    }

    /// Builds state from configuration.
    ///
    /// A missing API key is not fatal here: the page still loads and each
    /// analysis request answers with the missing-key error.
    ///
    /// # Errors
    ///
    /// Propagates any pipeline construction error other than a missing key.
    pub fn from_config(
        config: &SelfhealConfig,
        observability: ObservabilityHandle,
    ) -> Result<Self> {
        match build_pipeline(config) {
            Ok((pipeline, graph)) => Ok(Self::new(Some(pipeline), graph, observability)),
            Err(Error::MissingApiKey) => {
                tracing::warn!("{}", Error::MissingApiKey);
                Ok(Self::new(None, None, observability))
            },
            Err(e) => Err(e),
        }
    }
}

/// Body of `POST /api/analyze`.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Incident text.
    #[serde(default)]
    pub incident: String,
}

/// Which of the three user-visible states a response is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    /// The analysis ran; `message` holds the report or the failure text.
    Report,
    /// The input was rejected.
    Warning,
    /// The shell cannot run analyses.
    Error,
}

/// Body returned by `POST /api/analyze`.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    /// Response state.
    pub status: ResponseStatus,
    /// Text to show the user.
    pub message: String,
    /// Correlation id of the analysis.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Facts used as context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<Fact>>,
    /// Structured generation outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<GenerationOutcome>,
    /// Whether the run was recorded in the pipeline graph.
    pub graph_recorded: bool,
}

impl AnalyzeResponse {
    fn simple(status: ResponseStatus, message: String) -> Self {
        Self {
            status,
            message,
            request_id: None,
            context: None,
            outcome: None,
            graph_recorded: false,
        }
    }
}

/// Builds the router with security headers and request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/analyze", post(analyze))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        // Security headers (OWASP recommendations)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            header::HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            header::HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            header::HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            header::HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Runs the HTTP shell on `port` until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the runtime cannot be created or the port cannot be
/// bound.
pub fn run(config: SelfhealConfig, observability: ObservabilityHandle, port: u16) -> Result<()> {
    // The blocking HTTP client inside the pipeline must be dropped outside
    // the runtime, so this handle outlives `block_on`.
    let state = AppState::from_config(&config, observability)?;
    let app = router(state.clone());

    let rt = tokio::runtime::Runtime::new().map_err(|e| Error::OperationFailed {
        operation: "create_runtime".to_string(),
        cause: e.to_string(),
    })?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(port, "Starting selfheal HTTP shell");

    let served = rt.block_on(async {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::OperationFailed {
                operation: "bind".to_string(),
                cause: format!("{addr}: {e}"),
            })?;

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down HTTP shell");
            })
            .await
            .map_err(|e| Error::OperationFailed {
                operation: "serve".to_string(),
                cause: e.to_string(),
            })
    });

    drop(rt);
    drop(state);
    served
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.observability.render_metrics() {
        Some(body) => {
            ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response()
        },
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> (StatusCode, Json<AnalyzeResponse>) {
    let Some(pipeline) = state.pipeline.clone() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(AnalyzeResponse::simple(
                ResponseStatus::Error,
                Error::MissingApiKey.to_string(),
            )),
        );
    };

    let joined = tokio::task::spawn_blocking(move || pipeline.analyze(&request.incident)).await;

    match joined {
        Ok(Ok(analysis)) => {
            // Reported runs are removed; the graph only holds analyses in flight.
            let graph_recorded = state
                .graph
                .as_ref()
                .is_some_and(|g| g.take_run(&analysis.request_id).is_some());
            (
                StatusCode::OK,
                Json(AnalyzeResponse {
                    status: ResponseStatus::Report,
                    message: analysis.display_text(),
                    request_id: Some(analysis.request_id),
                    context: Some(analysis.context),
                    outcome: Some(analysis.outcome),
                    graph_recorded,
                }),
            )
        },
        Ok(Err(Error::InvalidInput(message))) => (
            StatusCode::BAD_REQUEST,
            Json(AnalyzeResponse::simple(ResponseStatus::Warning, message)),
        ),
        Ok(Err(e)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(AnalyzeResponse::simple(ResponseStatus::Error, e.to_string())),
        ),
        Err(e) => {
            tracing::error!(error = %e, "analysis task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AnalyzeResponse::simple(
                    ResponseStatus::Error,
                    "analysis task failed".to_string(),
                )),
            )
        },
    }
}
