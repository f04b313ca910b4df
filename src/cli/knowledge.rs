//! Knowledge store inspection commands.
//!
//! None of these commands touch the network or need an API key.

use std::io::Write;

use serde::Serialize;

use super::{OutputFormat, emit, emit_json};
use crate::knowledge::{KnowledgeStore, ScoredFact};
use crate::pipeline::EMPTY_INCIDENT_WARNING;
use crate::prompt::build_prompt;
use crate::{Error, Result};

/// Facts command handler: lists the knowledge store in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FactsCommand {
    format: OutputFormat,
}

impl FactsCommand {
    /// Creates a new facts command.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Writes every fact to `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if output cannot be written.
    pub fn execute(&self, store: &KnowledgeStore, out: &mut dyn Write) -> Result<()> {
        match self.format {
            OutputFormat::Json => emit_json(out, &store.all_facts()),
            OutputFormat::Text => {
                for (i, fact) in store.all_facts().iter().enumerate() {
                    emit(out, &format!("{:>2}. {fact}", i + 1))?;
                }
                Ok(())
            },
        }
    }
}

/// Retrieve command handler: shows matching facts and their scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetrieveCommand {
    format: OutputFormat,
}

#[derive(Serialize)]
struct RetrieveView<'a> {
    query: &'a str,
    k: usize,
    results: Vec<ScoredFact<'a>>,
}

impl RetrieveCommand {
    /// Creates a new retrieve command.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Scores `query` against `store` and writes the top `k` matches.
    ///
    /// # Errors
    ///
    /// Returns an error if output cannot be written.
    pub fn execute(
        &self,
        store: &KnowledgeStore,
        query: &str,
        k: usize,
        out: &mut dyn Write,
    ) -> Result<()> {
        let mut results = store.retriever().score(query);
        results.truncate(k);

        match self.format {
            OutputFormat::Json => emit_json(out, &RetrieveView { query, k, results }),
            OutputFormat::Text => {
                if results.is_empty() {
                    return emit(out, "No matching facts.");
                }
                for scored in &results {
                    emit(out, &format!("[{}] {}", scored.score, scored.fact))?;
                }
                Ok(())
            },
        }
    }
}

/// Prompt command handler: prints the assembled prompt without sending it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptCommand;

impl PromptCommand {
    /// Creates a new prompt command.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Builds the prompt for `incident` from the top `k` facts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the incident is blank.
    pub fn execute(
        &self,
        store: &KnowledgeStore,
        incident: &str,
        k: usize,
        out: &mut dyn Write,
    ) -> Result<()> {
        let incident = incident.trim();
        if incident.is_empty() {
            return Err(Error::InvalidInput(EMPTY_INCIDENT_WARNING.to_string()));
        }
        let facts = store.retriever().retrieve(incident, k);
        emit(out, &build_prompt(incident, &facts))
    }
}
