//! OpenAI-compatible chat completions provider.
//!
//! Works against any endpoint speaking the OpenAI chat API, including
//! the GitHub Models inference endpoint the product runs on.

use crate::client::{ChatMessage, ChatRequest, ChatResponse, LlmClient};
use dulich_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// OpenAI chat completions request body.
#[derive(Debug, Serialize)]
struct CompletionsRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// OpenAI chat completions response body.
#[derive(Debug, Deserialize)]
struct CompletionsResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: String,
}

/// OpenAI-compatible LLM client.
pub struct OpenAiClient {
    /// Base URL for the inference API
    base_url: String,

    /// Bearer token
    api_key: String,

    /// HTTP client
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a new client for an OpenAI-compatible endpoint.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        tracing::debug!(model = %request.model, messages = request.messages.len(), "Sending completion request");

        let body = CompletionsRequest {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Generation(format!(
                "LLM API error ({}): {}",
                status, error_text
            )));
        }

        let completion: CompletionsResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to parse response: {}", e)))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Generation("Response contained no choices".to_string()))?;

        tracing::debug!("Received completion");

        Ok(ChatResponse {
            content: choice.message.content,
            model: completion.model.unwrap_or_else(|| request.model.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChatMessage;

    #[test]
    fn test_request_serialization_skips_unset_options() {
        let messages = vec![ChatMessage::user("Quy Nhơn có gì chơi?")];
        let body = CompletionsRequest {
            model: "openai/gpt-4.1",
            messages: &messages,
            max_tokens: None,
            temperature: None,
        };

        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("max_tokens"));
        assert!(!json.contains("temperature"));
        assert!(json.contains("Quy Nhơn"));
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{
            "model": "openai/gpt-4.1",
            "choices": [{"message": {"role": "assistant", "content": "Chào bạn!"}}]
        }"#;

        let parsed: CompletionsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices.len(), 1);
        assert_eq!(parsed.choices[0].message.content, "Chào bạn!");
    }
}
