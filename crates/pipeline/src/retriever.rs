//! Token-budgeted document retrieval.
//!
//! Runs one hybrid query against the search service, deduplicates the
//! hits, ranks them, and greedily selects the subset that fits the
//! context token budget.

use crate::replies;
use crate::tokenizer::Tokenizer;
use dulich_core::{AppError, AppResult, CancelToken};
use dulich_search::{EmbeddingProvider, HybridQuery, ScoredHit, SearchBackend};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::Arc;

/// Render the snippet a selected hit contributes to the retrieval
/// context. Token budgeting is computed over this rendered form.
pub fn context_snippet(hit: &ScoredHit) -> String {
    format!("**{}**\n{}\n{}", hit.title, hit.content, hit.link)
}

/// Exact-duplicate fingerprint over title+content+link.
fn fingerprint(hit: &ScoredHit) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(hit.title.as_bytes());
    hasher.update(hit.content.as_bytes());
    hasher.update(hit.link.as_bytes());
    hasher.finalize().into()
}

/// Remove exact duplicates, keeping first occurrences in order.
pub fn dedup_hits(hits: Vec<ScoredHit>) -> Vec<ScoredHit> {
    let mut seen = HashSet::new();
    hits.into_iter()
        .filter(|hit| seen.insert(fingerprint(hit)))
        .collect()
}

/// Retriever over the embedding and search collaborators.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    backend: Arc<dyn SearchBackend>,
    tokenizer: Tokenizer,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        backend: Arc<dyn SearchBackend>,
        tokenizer: Tokenizer,
    ) -> Self {
        Self {
            embedder,
            backend,
            tokenizer,
        }
    }

    /// Retrieve up to `top_k` documents fitting `max_context_tokens`.
    ///
    /// Cancellation is checked before the remote call and after
    /// receiving results; the call itself is not interruptible.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        max_context_tokens: usize,
        cancel: &CancelToken,
    ) -> AppResult<Vec<ScoredHit>> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let query = query.to_lowercase();
        let vector = self.embedder.embed(&query).await?;

        let hybrid = HybridQuery::new(&query, vector, top_k);
        let hits = self.backend.search(&hybrid).await?;

        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        if hits.is_empty() {
            return Err(AppError::Search(replies::NO_RESULTS.to_string()));
        }

        let unique = dedup_hits(hits);
        if unique.is_empty() {
            return Err(AppError::Search(replies::NO_RESULTS_AFTER_DEDUP.to_string()));
        }

        // Stable sort: ties keep service order.
        let mut sorted = unique;
        sorted.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // Greedy selection: stop at the first candidate that would
        // overflow the budget, never skip-and-continue.
        let mut selected = Vec::new();
        let mut current_tokens = 0;
        for hit in sorted.into_iter().take(top_k) {
            let snippet_tokens = self.tokenizer.count(&context_snippet(&hit));
            if current_tokens + snippet_tokens > max_context_tokens {
                break;
            }
            current_tokens += snippet_tokens;
            selected.push(hit);
        }

        if selected.is_empty() {
            return Err(AppError::Search(replies::NO_CONTENT_IN_BUDGET.to_string()));
        }

        tracing::info!(
            selected = selected.len(),
            context_tokens = current_tokens,
            "Retrieved documents"
        );

        Ok(selected)
    }
}
