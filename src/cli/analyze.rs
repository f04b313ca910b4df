//! Analyze CLI command.

use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{OutputFormat, emit, emit_json};
use crate::knowledge::Fact;
use crate::llm::GenerationOutcome;
use crate::pipeline::{Analysis, PipelineGraph, RemediationPipeline, RunGraph};
use crate::{Error, Result};

/// Heading printed above a text report.
pub const REPORT_HEADING: &str = "📝 Self-Healing Report";

/// Notice printed after a report when graph recording is on.
pub const GRAPH_NOTICE: &str = "Pipeline recorded in graph (local).";

/// Reads incident text from an argument, a file, or `stdin`, in that order.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the file or stdin cannot be read.
pub fn read_incident(
    text: Option<String>,
    file: Option<&Path>,
    stdin: &mut dyn Read,
) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidInput(format!("cannot read {}: {e}", path.display())));
    }
    let mut buf = String::new();
    stdin
        .read_to_string(&mut buf)
        .map_err(|e| Error::InvalidInput(format!("cannot read stdin: {e}")))?;
    Ok(buf)
}

/// JSON view of one analysis.
#[derive(Debug, Serialize)]
struct AnalysisView<'a> {
    request_id: &'a str,
    incident: &'a str,
    context: &'a [Fact],
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
    outcome: &'a GenerationOutcome,
    message: String,
    generated_at: DateTime<Utc>,
    elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    graph: Option<RunGraph>,
}

/// Analyze command handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeCommand {
    format: OutputFormat,
    show_prompt: bool,
}

impl AnalyzeCommand {
    /// Creates a new analyze command.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self {
            format,
            show_prompt: false,
        }
    }

    /// Also print the prompt sent to the model.
    #[must_use]
    pub const fn with_show_prompt(mut self, show_prompt: bool) -> Self {
        self.show_prompt = show_prompt;
        self
    }

    /// Runs the analysis and writes the result to `out`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a blank incident, or
    /// [`Error::OperationFailed`] if output cannot be written.
    pub fn execute(
        &self,
        pipeline: &RemediationPipeline,
        graph: Option<&PipelineGraph>,
        incident: &str,
        out: &mut dyn Write,
    ) -> Result<Analysis> {
        let analysis = pipeline.analyze(incident)?;
        let run = graph.and_then(|g| g.run(&analysis.request_id));

        match self.format {
            OutputFormat::Json => {
                let view = AnalysisView {
                    request_id: &analysis.request_id,
                    incident: &analysis.incident,
                    context: &analysis.context,
                    prompt: self.show_prompt.then_some(analysis.prompt.as_str()),
                    outcome: &analysis.outcome,
                    message: analysis.display_text(),
                    generated_at: analysis.generated_at,
                    elapsed_ms: analysis.elapsed_ms,
                    graph: run,
                };
                emit_json(out, &view)?;
            },
            OutputFormat::Text => {
                if self.show_prompt {
                    emit(out, "Prompt:")?;
                    emit(out, &analysis.prompt)?;
                }
                emit(out, REPORT_HEADING)?;
                emit(out, "")?;
                emit(out, &analysis.display_text())?;
                if run.is_some() {
                    emit(out, "")?;
                    emit(out, GRAPH_NOTICE)?;
                }
            },
        }

        Ok(analysis)
    }
}
