//! Incident analysis pipeline.
//!
//! One call to [`RemediationPipeline::analyze`] is one request: retrieve
//! facts for the incident, build the prompt, make a single generation call.
//! All per-request state lives in the returned [`Analysis`]; the pipeline
//! itself only holds shared, read-only collaborators.

mod graph;

pub use graph::{
    GraphEdge, GraphNode, INPUT_NODE, NoopRecorder, OUTPUT_NODE, PipelineGraph, PipelineRecorder,
    RunGraph,
};

use crate::knowledge::{Fact, KnowledgeStore};
use crate::llm::{GeminiClient, GenerationOutcome, TextGenerator};
use crate::observability::{RequestContext, enter_request_context};
use crate::prompt::build_prompt;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::info_span;

/// Warning shown when the incident text is blank.
pub const EMPTY_INCIDENT_WARNING: &str = "Please enter system logs or incidents.";

/// Default number of facts placed in the prompt.
pub const DEFAULT_TOP_K: usize = 3;

/// Prompt assembled for one incident, before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedPrompt {
    /// Trimmed incident text.
    pub incident: String,
    /// Retrieved facts, best first.
    pub context: Vec<Fact>,
    /// The full prompt.
    pub prompt: String,
}

/// Result of one analysis.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    /// Correlation id for logs and graph records.
    pub request_id: String,
    /// Trimmed incident text.
    pub incident: String,
    /// Retrieved facts, best first.
    pub context: Vec<Fact>,
    /// The prompt sent to the generation service.
    pub prompt: String,
    /// What the generation service produced.
    pub outcome: GenerationOutcome,
    /// When the analysis finished.
    pub generated_at: DateTime<Utc>,
    /// Wall time of the whole analysis in milliseconds.
    pub elapsed_ms: u64,
}

impl Analysis {
    /// The text to show the user: the report or the failure message.
    #[must_use]
    pub fn display_text(&self) -> String {
        self.outcome.to_string()
    }
}

/// Retrieval, prompt assembly, and generation wired together.
#[derive(Clone)]
pub struct RemediationPipeline {
    store: Arc<KnowledgeStore>,
    generator: Arc<dyn TextGenerator>,
    top_k: usize,
    max_output_tokens: u32,
    recorder: Arc<dyn PipelineRecorder>,
}

impl RemediationPipeline {
    /// Creates a pipeline over `store` using `generator`.
    #[must_use]
    pub fn new(store: Arc<KnowledgeStore>, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            store,
            generator,
            top_k: DEFAULT_TOP_K,
            max_output_tokens: GeminiClient::DEFAULT_MAX_OUTPUT_TOKENS,
            recorder: Arc::new(NoopRecorder),
        }
    }

    /// Sets how many facts go into the prompt.
    #[must_use]
    pub const fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Sets the output token cap passed to the generator.
    #[must_use]
    pub const fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    /// Attaches a graph recorder, replacing the default [`NoopRecorder`].
    #[must_use]
    pub fn with_recorder(mut self, recorder: Arc<dyn PipelineRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    /// The knowledge store in use.
    #[must_use]
    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    /// Configured top-k.
    #[must_use]
    pub const fn top_k(&self) -> usize {
        self.top_k
    }

    /// Name of the generation backend.
    #[must_use]
    pub fn generator_name(&self) -> &'static str {
        self.generator.name()
    }

    /// Retrieves facts and builds the prompt without calling the generator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the incident is blank.
    pub fn prepare(&self, incident: &str) -> Result<PreparedPrompt> {
        let incident = incident.trim();
        if incident.is_empty() {
            return Err(Error::InvalidInput(EMPTY_INCIDENT_WARNING.to_string()));
        }

        let context: Vec<Fact> = self
            .store
            .retriever()
            .retrieve(incident, self.top_k)
            .into_iter()
            .cloned()
            .collect();
        let prompt = build_prompt(incident, &context);

        Ok(PreparedPrompt {
            incident: incident.to_string(),
            context,
            prompt,
        })
    }

    /// Runs one analysis for `incident`.
    ///
    /// Generation problems are reported inside [`Analysis::outcome`], not as
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the incident is blank; nothing is
    /// retrieved or sent in that case.
    pub fn analyze(&self, incident: &str) -> Result<Analysis> {
        let context = RequestContext::new();
        let request_id = context.request_id().to_string();
        let _context_guard = enter_request_context(context);

        let span = info_span!(
            "pipeline.analyze",
            request_id = %request_id,
            generator = self.generator.name(),
            top_k = self.top_k,
            retrieved = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );
        let _guard = span.enter();
        let start = Instant::now();

        let prepared = self.prepare(incident).inspect_err(|_| {
            tracing::warn!("rejected blank incident");
        })?;

        metrics::counter!("selfheal_analyses_total").increment(1);
        #[allow(clippy::cast_precision_loss)]
        metrics::histogram!("selfheal_retrieved_facts").record(prepared.context.len() as f64);
        span.record("retrieved", prepared.context.len());
        tracing::debug!(
            incident_len = prepared.incident.len(),
            facts = ?prepared.context,
            "retrieved knowledge context"
        );

        self.recorder
            .record_node(&request_id, INPUT_NODE, incident.chars().count());

        let outcome = self
            .generator
            .generate(&prepared.prompt, self.max_output_tokens);
        span.record("outcome", outcome.label());

        self.recorder
            .record_node(&request_id, OUTPUT_NODE, outcome.to_string().chars().count());
        self.recorder
            .record_edge(&request_id, INPUT_NODE, OUTPUT_NODE);

        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(elapsed_ms, outcome = outcome.label(), "analysis finished");

        Ok(Analysis {
            request_id,
            incident: prepared.incident,
            context: prepared.context,
            prompt: prepared.prompt,
            outcome,
            generated_at: Utc::now(),
            elapsed_ms,
        })
    }
}
