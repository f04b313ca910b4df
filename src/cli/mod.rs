//! CLI command implementations.
//!
//! Each submodule implements one `selfheal` subcommand. Commands write their
//! output to a caller-supplied writer (stdout in the binary) so they can be
//! exercised in tests.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `analyze` | Retrieve context, call Gemini, print the remediation report |
//! | `retrieve` | Show which facts match a query, with scores |
//! | `prompt` | Print the assembled prompt without calling the API |
//! | `facts` | List the knowledge store |
//! | `config` | Show the effective configuration |
//! | `serve` | Run the single-page HTTP shell (feature `http`) |
//!
//! # Example Usage
//!
//! ```bash
//! export GEMINI_API_KEY=...
//! selfheal analyze "CPU spikes to 95%, Disk space < 5%, Service X failed"
//! journalctl -u nginx --since -10m | selfheal analyze --format json
//! selfheal retrieve "disk space alerts" -k 3
//! ```

mod analyze;
mod config;
mod knowledge;
mod llm_factory;
mod serve;

pub use analyze::{AnalyzeCommand, read_incident};
pub use config::ConfigCommand;
pub use knowledge::{FactsCommand, PromptCommand, RetrieveCommand};
pub use llm_factory::{
    build_gemini_client, build_http_config, build_knowledge_store, build_pipeline,
};
pub use serve::{DEFAULT_PORT, ServeCommand};

use crate::{Error, Result};
use std::io::Write;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Writes a line to `out`, mapping I/O failures to [`Error::OperationFailed`].
pub(crate) fn emit(out: &mut dyn Write, text: &str) -> Result<()> {
    writeln!(out, "{text}").map_err(|e| Error::OperationFailed {
        operation: "write_output".to_string(),
        cause: e.to_string(),
    })
}

/// Serializes `value` as pretty JSON to `out`.
pub(crate) fn emit_json<T: serde::Serialize>(out: &mut dyn Write, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| Error::OperationFailed {
        operation: "serialize_output".to_string(),
        cause: e.to_string(),
    })?;
    emit(out, &json)
}
