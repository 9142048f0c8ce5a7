//! RAG pipeline for the Binh Dinh travel assistant.
//!
//! Answers natural-language questions about Binh Dinh travel by
//! combining hybrid document search with a language-model completion:
//! intent classification, token-budgeted retrieval and prompt
//! assembly, deadline-bounded generation with cooperative
//! cancellation, and answer post-processing.
//!
//! One [`Pipeline`] serves many concurrent invocations; each
//! invocation owns a private [`dulich_core::CancelToken`].

pub mod generator;
pub mod intent;
pub mod pipeline;
pub mod prompt;
pub mod replies;
pub mod retriever;
pub mod tokenizer;
pub mod types;

// Re-export main types
pub use generator::Generator;
pub use intent::{Intent, IntentClassifier};
pub use pipeline::Pipeline;
pub use prompt::PromptBuilder;
pub use retriever::Retriever;
pub use tokenizer::Tokenizer;
pub use types::{HistoryTurn, PipelineReply};
