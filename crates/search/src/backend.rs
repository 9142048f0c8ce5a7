//! Document search backend.
//!
//! The search service is an external collaborator exposing a single
//! operation: run a hybrid query, get back scored hits. Retry and
//! backoff are the service's concern, not ours.

use crate::query::HybridQuery;
use dulich_core::{AppError, AppResult};
use serde::Deserialize;

/// A scored search hit.
///
/// Immutable once returned; its lifetime is one pipeline invocation.
#[derive(Debug, Clone)]
pub struct ScoredHit {
    pub title: String,
    pub content: String,
    pub link: String,
    pub score: f32,
    /// Highlight fragment with `<mark>` tags, when the service sends one
    pub highlight: Option<String>,
}

/// Trait for document search backends.
#[async_trait::async_trait]
pub trait SearchBackend: Send + Sync {
    /// Execute a hybrid query and return scored hits in service order.
    async fn search(&self, query: &HybridQuery) -> AppResult<Vec<ScoredHit>>;
}

/// Elasticsearch `_search` response shape (the parts we read).
#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_score")]
    score: f32,
    #[serde(rename = "_source")]
    source: RawSource,
    #[serde(default)]
    highlight: Option<RawHighlight>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    link: String,
}

#[derive(Debug, Deserialize)]
struct RawHighlight {
    #[serde(default)]
    text: Vec<String>,
}

/// Elasticsearch-backed search service client.
pub struct ElasticBackend {
    /// Base URL of the cluster
    base_url: String,

    /// Index holding the travel documents
    index: String,

    /// API key for the `Authorization: ApiKey …` header
    api_key: Option<String>,

    /// HTTP client
    client: reqwest::Client,
}

impl ElasticBackend {
    /// Create a backend for the given cluster and index.
    pub fn new(
        base_url: impl Into<String>,
        index: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            index: index.into(),
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl SearchBackend for ElasticBackend {
    async fn search(&self, query: &HybridQuery) -> AppResult<Vec<ScoredHit>> {
        let url = format!(
            "{}/{}/_search",
            self.base_url.trim_end_matches('/'),
            self.index
        );

        tracing::debug!(index = %self.index, top_k = query.top_k, "Running hybrid search");

        let mut request = self.client.post(&url).json(&query.to_body());
        if let Some(ref key) = self.api_key {
            request = request.header("Authorization", format!("ApiKey {}", key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Failed to reach search service: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Search(format!(
                "Search API error ({}): {}",
                status, error_text
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Search(format!("Failed to parse search response: {}", e)))?;

        let hits = parsed
            .hits
            .hits
            .into_iter()
            .map(|hit| ScoredHit {
                title: hit.source.title,
                content: hit.source.content,
                link: hit.source.link,
                score: hit.score,
                highlight: hit
                    .highlight
                    .and_then(|h| h.text.into_iter().next()),
            })
            .collect();

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing() {
        let json = r#"{
            "hits": {
                "hits": [
                    {
                        "_score": 3.2,
                        "_source": {
                            "title": "Tháp Đôi",
                            "content": "Tháp Chăm cổ tại Quy Nhơn.",
                            "link": "https://example.vn/thap-doi"
                        },
                        "highlight": {"text": ["<mark>Tháp Đôi</mark> Quy Nhơn"]}
                    },
                    {
                        "_score": 1.1,
                        "_source": {"title": "Kỳ Co", "content": "Bãi biển.", "link": ""}
                    }
                ]
            }
        }"#;

        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.hits.hits.len(), 2);
        assert_eq!(parsed.hits.hits[0].score, 3.2);
        assert_eq!(parsed.hits.hits[0].source.title, "Tháp Đôi");
        assert!(parsed.hits.hits[0].highlight.is_some());
        assert!(parsed.hits.hits[1].highlight.is_none());
    }
}
