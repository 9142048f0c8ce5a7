//! Search collaborators for the Binh Dinh travel assistant.
//!
//! Two external services live behind traits here:
//! - the vectorization service (`EmbeddingProvider`)
//! - the document search service (`SearchBackend`)
//!
//! The hybrid query builder renders the lexical+fuzzy+vector request
//! body both implementations agree on.

pub mod backend;
pub mod embeddings;
pub mod query;

// Re-export main types
pub use backend::{ElasticBackend, ScoredHit, SearchBackend};
pub use embeddings::{EmbeddingProvider, HttpEmbedder};
pub use query::HybridQuery;
