//! Text-generation client abstraction.
//!
//! The generation call is a never-fail boundary: transport errors, timeouts
//! and malformed bodies all come back as a [`GenerationOutcome`] rather than
//! an `Err`, with the underlying cause kept for display.

mod gemini;

pub use gemini::{GeminiClient, extract_text, generate};

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Marker prefixed to every user-visible failure message.
pub const WARNING_MARKER: &str = "⚠️";

/// Text shown when the service answered but produced no usable text.
pub const NO_USABLE_TEXT_MESSAGE: &str = "⚠️ Gemini API returned no usable text.";

/// Prefix of the message shown when the request itself failed.
pub const REQUEST_ERROR_PREFIX: &str = "⚠️ Network/Request error: ";

/// Trait for text-generation backends.
pub trait TextGenerator: Send + Sync {
    /// The backend name.
    fn name(&self) -> &'static str;

    /// Generates text for `prompt`, capped at `max_output_tokens`.
    ///
    /// Implementations must not panic or return early with an error; every
    /// failure path ends in a [`GenerationOutcome`].
    fn generate(&self, prompt: &str, max_output_tokens: u32) -> GenerationOutcome;
}

/// Result of one generation call.
///
/// `Display` renders the exact text a user should see for each case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum GenerationOutcome {
    /// The first non-empty text part of the first candidate, trimmed.
    Report(String),
    /// The response parsed but carried no usable text.
    NoUsableText,
    /// The network call or body parsing failed.
    RequestFailed(String),
}

impl GenerationOutcome {
    /// Whether the service produced a report.
    #[must_use]
    pub const fn is_report(&self) -> bool {
        matches!(self, Self::Report(_))
    }

    /// Returns the report text, if any.
    #[must_use]
    pub fn report(&self) -> Option<&str> {
        match self {
            Self::Report(text) => Some(text),
            Self::NoUsableText | Self::RequestFailed(_) => None,
        }
    }

    /// Short label used for metrics and structured logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Report(_) => "report",
            Self::NoUsableText => "no_usable_text",
            Self::RequestFailed(_) => "request_failed",
        }
    }
}

impl fmt::Display for GenerationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Report(text) => f.write_str(text),
            Self::NoUsableText => f.write_str(NO_USABLE_TEXT_MESSAGE),
            Self::RequestFailed(detail) => write!(f, "{REQUEST_ERROR_PREFIX}{detail}"),
        }
    }
}

/// HTTP client configuration for the generation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlmHttpConfig {
    /// Whole-request timeout in milliseconds (0 to disable).
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds (0 to disable).
    pub connect_timeout_ms: u64,
}

impl Default for LlmHttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            connect_timeout_ms: 3_000,
        }
    }
}

impl LlmHttpConfig {
    /// Loads HTTP configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Loads HTTP configuration from config file settings.
    #[must_use]
    pub fn from_config(config: &crate::config::LlmConfig) -> Self {
        let mut settings = Self::default();
        if let Some(timeout_ms) = config.timeout_ms {
            settings.timeout_ms = timeout_ms;
        }
        if let Some(connect_timeout_ms) = config.connect_timeout_ms {
            settings.connect_timeout_ms = connect_timeout_ms;
        }
        settings
    }

    /// Applies environment variable overrides.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("SELFHEAL_LLM_TIMEOUT_MS") {
            if let Ok(timeout_ms) = v.parse::<u64>() {
                self.timeout_ms = timeout_ms;
            }
        }
        if let Ok(v) = std::env::var("SELFHEAL_LLM_CONNECT_TIMEOUT_MS") {
            if let Ok(connect_timeout_ms) = v.parse::<u64>() {
                self.connect_timeout_ms = connect_timeout_ms;
            }
        }
        self
    }
}

/// Builds a blocking HTTP client with configured timeouts.
#[must_use]
pub fn build_http_client(config: LlmHttpConfig) -> reqwest::blocking::Client {
    let mut builder = reqwest::blocking::Client::builder();
    if config.timeout_ms > 0 {
        builder = builder.timeout(Duration::from_millis(config.timeout_ms));
    }
    if config.connect_timeout_ms > 0 {
        builder = builder.connect_timeout(Duration::from_millis(config.connect_timeout_ms));
    }

    builder.build().unwrap_or_else(|err| {
        tracing::warn!("Failed to build LLM HTTP client: {err}");
        reqwest::blocking::Client::new()
    })
}
