//! LLM integration crate for the Binh Dinh travel assistant.
//!
//! Provides a provider-agnostic abstraction for chat completions. The
//! production deployment talks to an OpenAI-compatible endpoint; tests
//! substitute in-process fakes through the `LlmClient` trait.
//!
//! # Example
//! ```no_run
//! use dulich_llm::{ChatMessage, ChatRequest, LlmClient, OpenAiClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenAiClient::new("https://models.github.ai/inference", "token");
//! let request = ChatRequest::new(vec![ChatMessage::user("Xin chào")], "openai/gpt-4.1");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{ChatMessage, ChatRequest, ChatResponse, ChatRole, LlmClient};
pub use factory::create_client;
pub use providers::OpenAiClient;
