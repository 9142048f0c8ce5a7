//! Embedding provider trait and HTTP implementation.
//!
//! The vectorization service is an external collaborator: one call,
//! `embed(text) -> Vec<f32>`. The production deployment uses a hosted
//! embedding API with an OpenAI-style request shape.

use dulich_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get provider name (e.g., "jina", "mock")
    fn provider_name(&self) -> &str;

    /// Generate an embedding vector for a single text.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>>;
}

/// Request payload for the embeddings API.
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

/// Response from the embeddings API.
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

/// HTTP embedding provider against an OpenAI-style embeddings endpoint.
pub struct HttpEmbedder {
    /// Full endpoint URL
    endpoint: String,

    /// Model name sent with each request
    model: String,

    /// Optional bearer token
    api_key: Option<String>,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpEmbedder {
    /// Create a new embedder for the given endpoint and model.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for HttpEmbedder {
    fn provider_name(&self) -> &str {
        "jina"
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(AppError::Embedding("Cannot embed empty text".to_string()));
        }

        tracing::debug!(model = %self.model, "Requesting embedding");

        let body = EmbeddingRequest {
            model: &self.model,
            input: vec![text],
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to reach embedding service: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Embedding(format!(
                "Embedding API error ({}): {}",
                status, error_text
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse embedding response: {}", e)))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let embedder = HttpEmbedder::new("http://localhost:1", "jina-embeddings-v3", None);
        let result = embedder.embed("   ").await;
        assert!(matches!(result, Err(AppError::Embedding(_))));
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{"data": [{"embedding": [0.1, -0.2, 0.3]}]}"#;
        let parsed: EmbeddingResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.data[0].embedding, vec![0.1, -0.2, 0.3]);
    }
}
