//! # Selfheal
//!
//! An incident remediation co-pilot for self-healing infrastructure.
//!
//! Selfheal takes a free-text incident description (server logs, alert
//! text), ranks a small set of canned knowledge hints against it by literal
//! keyword overlap, and asks a remote Gemini model for a remediation report
//! built from the incident plus the retrieved hints.
//!
//! ## Pipeline
//!
//! ```text
//! shell ─► Retriever(incident) ─► build_prompt(incident, facts)
//!       ─► GeminiClient::generate(prompt) ─► shell(report)
//! ```
//!
//! - [`KnowledgeStore`] holds the immutable fact list
//! - [`Retriever`] scores facts by word overlap and returns the top-k
//! - [`prompt::build_prompt`] fills the fixed remediation template
//! - [`llm::GeminiClient`] performs a single blocking `generateContent` call
//!   and never fails across its public surface
//! - [`RemediationPipeline`] wires them together per request
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use selfheal::{KnowledgeStore, RemediationPipeline};
//! use selfheal::llm::GeminiClient;
//!
//! let client = GeminiClient::new("my-api-key");
//! let pipeline = RemediationPipeline::new(Arc::new(KnowledgeStore::default()), Arc::new(client));
//! let analysis = pipeline.analyze("Disk space < 5% on db-01, service X failed")?;
//! println!("{}", analysis.outcome);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// Duplicate transitive versions come from the reqwest/axum/metrics stacks.
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod cli;
pub mod config;
pub mod knowledge;
pub mod llm;
pub mod observability;
pub mod pipeline;
pub mod prompt;
#[cfg(feature = "http")]
pub mod server;

// Re-exports for convenience
pub use config::{FeatureFlags, SelfhealConfig};
pub use knowledge::{Fact, KnowledgeStore, Retriever, ScoredFact};
pub use llm::{GenerationOutcome, TextGenerator};
pub use pipeline::{Analysis, PipelineRecorder, RemediationPipeline};

/// Error type for selfheal operations.
///
/// The generation call itself never produces an `Error`: transport and
/// parse failures are folded into [`GenerationOutcome`]. These variants
/// cover what happens around it.
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Blank incident text, unreadable incident file |
/// | `MissingApiKey` | No Gemini API key in env, `.env`, or config |
/// | `OperationFailed` | Config read/parse errors, logging init, server bind |
/// | `FeatureNotEnabled` | `serve` without the `http` feature |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - The incident text is empty or whitespace only
    /// - An incident file cannot be read
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No API key is configured for the generation service.
    #[error("GEMINI_API_KEY not found. Set environment variable or config file.")]
    MissingApiKey,

    /// An operation failed.
    ///
    /// Raised when:
    /// - The config file cannot be read or parsed
    /// - Logging or metrics initialization fails
    /// - The HTTP shell cannot bind its port
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// Feature not enabled (requires feature flag).
    #[error("feature not enabled: {0} (compile with --features {0})")]
    FeatureNotEnabled(String),
}

/// Result type alias for selfheal operations.
pub type Result<T> = std::result::Result<T, Error>;
