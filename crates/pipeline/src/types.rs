//! Caller-facing pipeline types.

use dulich_search::ScoredHit;
use serde::{Deserialize, Serialize};

/// One turn of conversation history, supplied by the caller.
///
/// Most-recent-last. The pipeline only ever considers the last five
/// turns; older turns stay with the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryTurn {
    /// "user", "assistant" (or the legacy "bot")
    pub role: String,
    pub content: String,
}

impl HistoryTurn {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Result of one pipeline invocation.
///
/// `response` always carries displayable text; when `error` is true it
/// is a friendly failure message rather than an answer.
#[derive(Debug, Clone)]
pub struct PipelineReply {
    /// Answer text or friendly failure message
    pub response: String,

    /// Whether `response` is a failure message
    pub error: bool,

    /// Reply category for early exits ("greeting", "general")
    pub source: Option<String>,

    /// Documents that grounded the answer (empty for early exits
    /// and degraded context-free answers)
    pub documents: Vec<ScoredHit>,
}

impl PipelineReply {
    /// A successful grounded answer.
    pub fn answer(response: String, documents: Vec<ScoredHit>) -> Self {
        Self {
            response,
            error: false,
            source: None,
            documents,
        }
    }

    /// A fixed early reply (greeting or refusal).
    pub fn early(response: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            error: false,
            source: Some(source.into()),
            documents: Vec::new(),
        }
    }

    /// A failure surfaced to the user.
    pub fn failure(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            error: true,
            source: None,
            documents: Vec::new(),
        }
    }
}
