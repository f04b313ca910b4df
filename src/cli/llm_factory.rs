//! Builders turning configuration into pipeline components.

use std::sync::Arc;

use secrecy::ExposeSecret;

use crate::config::{LlmConfig, SelfhealConfig};
use crate::knowledge::KnowledgeStore;
use crate::llm::{GeminiClient, LlmHttpConfig};
use crate::pipeline::{PipelineGraph, RemediationPipeline};
use crate::{Error, Result};

/// Builds HTTP configuration from LLM config with environment overrides.
#[must_use]
pub fn build_http_config(llm_config: &LlmConfig) -> LlmHttpConfig {
    LlmHttpConfig::from_config(llm_config).with_env_overrides()
}

/// Builds a Gemini client from configuration.
///
/// # Errors
///
/// Returns [`Error::MissingApiKey`] if no non-blank API key is configured.
pub fn build_gemini_client(llm_config: &LlmConfig) -> Result<GeminiClient> {
    let api_key = llm_config.api_key().ok_or(Error::MissingApiKey)?;

    let mut client = GeminiClient::new(api_key.expose_secret());
    if let Some(ref model) = llm_config.model {
        client = client.with_model(model);
    }
    if let Some(ref base_url) = llm_config.base_url {
        client = client.with_endpoint(base_url);
    }
    Ok(client.with_http_config(build_http_config(llm_config)))
}

/// Builds the knowledge store: configured facts if any, else the built-ins.
#[must_use]
pub fn build_knowledge_store(config: &SelfhealConfig) -> KnowledgeStore {
    config
        .facts
        .as_ref()
        .map_or_else(KnowledgeStore::default, |facts| {
            KnowledgeStore::new(facts.iter().cloned())
        })
}

/// Builds the full pipeline from configuration.
///
/// Also returns the graph recorder when `features.pipeline_graph` is on, so
/// the caller can report on it.
///
/// # Errors
///
/// Returns [`Error::MissingApiKey`] if no API key is configured.
pub fn build_pipeline(
    config: &SelfhealConfig,
) -> Result<(RemediationPipeline, Option<Arc<PipelineGraph>>)> {
    let client = build_gemini_client(&config.llm)?;
    let store = Arc::new(build_knowledge_store(config));

    let mut pipeline = RemediationPipeline::new(store, Arc::new(client))
        .with_top_k(config.retrieval.top_k)
        .with_max_output_tokens(config.max_output_tokens());

    let graph = config.features.pipeline_graph.then(|| Arc::new(PipelineGraph::new()));
    if let Some(ref graph) = graph {
        pipeline = pipeline.with_recorder(graph.clone());
    }

    Ok((pipeline, graph))
}
