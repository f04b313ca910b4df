//! Config CLI command.

use std::io::Write;

use super::{build_http_config, build_knowledge_store, emit};
use crate::Result;
use crate::config::SelfhealConfig;
use crate::llm::GeminiClient;

/// Config command handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigCommand;

impl ConfigCommand {
    /// Creates a new config command.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Writes the effective configuration, or usage when `show` is false.
    ///
    /// The API key is never printed, only whether one is set.
    ///
    /// # Errors
    ///
    /// Returns an error if output cannot be written.
    pub fn execute(&self, config: &SelfhealConfig, show: bool, out: &mut dyn Write) -> Result<()> {
        if !show {
            return emit(out, "Use --show to display configuration");
        }

        let http = build_http_config(&config.llm);
        let store = build_knowledge_store(config);
        let api_key = if config.llm.api_key().is_some() {
            "(set)"
        } else {
            "(not set)"
        };

        let lines = [
            "Current Configuration".to_string(),
            "=====================".to_string(),
            String::new(),
            "LLM Configuration:".to_string(),
            format!("  API Key: {api_key}"),
            format!(
                "  Model: {}",
                config.llm.model.as_deref().unwrap_or(GeminiClient::DEFAULT_MODEL)
            ),
            format!(
                "  Base URL: {}",
                config
                    .llm
                    .base_url
                    .as_deref()
                    .unwrap_or(GeminiClient::DEFAULT_ENDPOINT)
            ),
            format!("  Max Output Tokens: {}", config.max_output_tokens()),
            format!("  Timeout: {}ms", http.timeout_ms),
            format!("  Connect Timeout: {}ms", http.connect_timeout_ms),
            String::new(),
            format!("Retrieval Top-K: {}", config.retrieval.top_k),
            format!(
                "Knowledge Facts: {} ({})",
                store.len(),
                if config.facts.is_some() { "configured" } else { "built-in" }
            ),
            String::new(),
            "Feature Flags:".to_string(),
            format!("  Pipeline Graph: {}", config.features.pipeline_graph),
            format!("  Show Prompt: {}", config.features.show_prompt),
            String::new(),
            "Logging:".to_string(),
            format!(
                "  Level: {}",
                config.logging.level.as_deref().unwrap_or("(default)")
            ),
            format!(
                "  Format: {}",
                config.logging.format.as_deref().unwrap_or("pretty")
            ),
            format!(
                "  File: {}",
                config
                    .logging
                    .file
                    .as_ref()
                    .map_or_else(|| "(stderr)".to_string(), |p| p.display().to_string())
            ),
            format!("Metrics Enabled: {}", config.metrics.enabled.unwrap_or(false)),
        ];

        for line in &lines {
            emit(out, line)?;
        }
        Ok(())
    }
}
