//! Knowledge store of canned infrastructure-incident hints.
//!
//! The store is built once at startup and never mutated afterwards, so a
//! single instance can be shared behind an `Arc` by any number of
//! concurrent requests.

mod retriever;

pub use retriever::{Retriever, ScoredFact};

use serde::Serialize;
use std::fmt;

/// Built-in facts, in retrieval tie-break order.
pub const DEFAULT_FACTS: &[&str] = &[
    "High CPU usage may indicate process bottlenecks.",
    "Disk space alerts can lead to service crashes.",
    "Network latency spikes may degrade performance.",
    "Memory leaks can cause application instability.",
    "Automatic remediation can restart services or free resources.",
];

/// A single knowledge-base sentence used as retrieval context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Fact(Box<str>);

impl Fact {
    /// Creates a fact from its text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into().into_boxed_str())
    }

    /// Returns the fact text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fact {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Fact {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Fact {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Fixed, read-only, ordered collection of facts.
///
/// There are no mutation methods: the fact list is decided at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeStore {
    facts: Vec<Fact>,
}

impl KnowledgeStore {
    /// Creates a store from an ordered fact list.
    ///
    /// Order matters: equal retrieval scores are broken by position.
    #[must_use]
    pub fn new<I, F>(facts: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Fact>,
    {
        Self {
            facts: facts.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns every fact in store order.
    #[must_use]
    pub fn all_facts(&self) -> &[Fact] {
        &self.facts
    }

    /// Number of facts in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Whether the store holds no facts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Returns a retriever over this store.
    #[must_use]
    pub const fn retriever(&self) -> Retriever<'_> {
        Retriever::new(self)
    }
}

impl Default for KnowledgeStore {
    fn default() -> Self {
        Self::new(DEFAULT_FACTS.iter().copied())
    }
}
