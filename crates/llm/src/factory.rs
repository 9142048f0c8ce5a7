//! LLM client factory.
//!
//! Creates a chat-completions client from application configuration.

use crate::client::LlmClient;
use crate::providers::OpenAiClient;
use dulich_core::{AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client for the configured endpoint.
///
/// # Arguments
/// * `endpoint` - OpenAI-compatible inference base URL
/// * `api_key` - Bearer token for the endpoint
///
/// # Errors
/// Returns `AppError::Config` when the API key is missing.
pub fn create_client(endpoint: &str, api_key: Option<&str>) -> AppResult<Arc<dyn LlmClient>> {
    let api_key = api_key
        .ok_or_else(|| AppError::Config("LLM endpoint requires an API key".to_string()))?;

    Ok(Arc::new(OpenAiClient::new(endpoint, api_key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client() {
        let client = create_client("https://models.github.ai/inference", Some("token"));
        assert!(client.is_ok());
        assert_eq!(client.unwrap().provider_name(), "openai");
    }

    #[test]
    fn test_missing_api_key() {
        match create_client("https://models.github.ai/inference", None) {
            Err(AppError::Config(msg)) => assert!(msg.contains("API key")),
            _ => panic!("Expected config error without API key"),
        }
    }
}
