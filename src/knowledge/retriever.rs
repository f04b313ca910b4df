//! Keyword-overlap retrieval.
//!
//! A fact's score is the number of query tokens (counted once per
//! occurrence in the query) that appear as a substring of the lower-cased
//! fact. Zero-score facts are dropped and the rest are ranked by score
//! descending with a stable sort, so ties keep store order.

use super::{Fact, KnowledgeStore};
use serde::Serialize;

/// A fact paired with its overlap score for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoredFact<'a> {
    /// Number of query tokens found in the fact.
    pub score: usize,
    /// The matched fact.
    pub fact: &'a Fact,
}

/// Ranks facts from a [`KnowledgeStore`] against a query.
#[derive(Debug, Clone, Copy)]
pub struct Retriever<'a> {
    store: &'a KnowledgeStore,
}

impl<'a> Retriever<'a> {
    /// Creates a retriever over `store`.
    #[must_use]
    pub const fn new(store: &'a KnowledgeStore) -> Self {
        Self { store }
    }

    /// Scores every fact against `query` and returns the matches, best first.
    ///
    /// Facts with a score of zero are not included.
    #[must_use]
    pub fn score(&self, query: &str) -> Vec<ScoredFact<'a>> {
        let query = query.to_lowercase();
        let tokens: Vec<&str> = query.split_whitespace().collect();
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<ScoredFact<'a>> = self
            .store
            .all_facts()
            .iter()
            .filter_map(|fact| {
                let haystack = fact.as_str().to_lowercase();
                let score = tokens
                    .iter()
                    .filter(|token| haystack.contains(*token))
                    .count();
                (score > 0).then_some(ScoredFact { score, fact })
            })
            .collect();

        // `sort_by` is stable: equal scores stay in store order.
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored
    }

    /// Returns up to `k` facts most relevant to `query`.
    #[must_use]
    pub fn retrieve(&self, query: &str, k: usize) -> Vec<&'a Fact> {
        if k == 0 {
            return Vec::new();
        }
        self.score(query)
            .into_iter()
            .take(k)
            .map(|scored| scored.fact)
            .collect()
    }
}
