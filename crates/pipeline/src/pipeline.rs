//! Pipeline orchestration.
//!
//! Sequences classification, retrieval, and generation for one query.
//! Stages run strictly in order; the orchestrator owns a cancellation
//! token shared with retrieval and generation. Retrieval failures
//! degrade to a context-free answer; cancellation is terminal.

use crate::generator::{Generator, MAX_CONTEXT_TOKENS};
use crate::intent::{Intent, IntentClassifier};
use crate::prompt::PromptBuilder;
use crate::replies;
use crate::retriever::Retriever;
use crate::tokenizer::Tokenizer;
use crate::types::{HistoryTurn, PipelineReply};
use dulich_core::{AppConfig, AppError, AppResult, CancelToken};
use dulich_llm::create_client;
use dulich_search::{ElasticBackend, HttpEmbedder};
use std::sync::Arc;
use std::time::Instant;

/// Documents requested per query.
const TOP_K: usize = 2;

/// One RAG pipeline, reusable across concurrent invocations.
///
/// Invocations share no mutable state; each gets its own cancellation
/// token.
pub struct Pipeline {
    classifier: IntentClassifier,
    retriever: Retriever,
    generator: Generator,
}

impl Pipeline {
    /// Build a pipeline with production collaborators from config.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let tokenizer = Tokenizer::new()?;

        let client = create_client(&config.llm_endpoint, config.llm_api_key.as_deref())?;

        let embedder = Arc::new(HttpEmbedder::new(
            &config.embedding_endpoint,
            &config.embedding_model,
            std::env::var("EMBEDDING_API_KEY").ok(),
        ));
        let backend = Arc::new(ElasticBackend::new(
            &config.search_url,
            &config.search_index,
            config.search_api_key.clone(),
        ));

        Ok(Self {
            classifier: IntentClassifier::new(Arc::clone(&client), &config.model),
            retriever: Retriever::new(embedder, backend, tokenizer.clone()),
            generator: Generator::new(
                client,
                PromptBuilder::new(tokenizer.clone())?,
                tokenizer,
                &config.model,
            ),
        })
    }

    /// Build a pipeline from pre-constructed components.
    pub fn with_components(
        classifier: IntentClassifier,
        retriever: Retriever,
        generator: Generator,
    ) -> Self {
        Self {
            classifier,
            retriever,
            generator,
        }
    }

    /// Answer one query with a fresh cancellation token.
    pub async fn answer(&self, query: &str, history: &[HistoryTurn]) -> PipelineReply {
        self.answer_with_cancel(query, history, &CancelToken::new())
            .await
    }

    /// Answer one query under a caller-supplied cancellation token.
    pub async fn answer_with_cancel(
        &self,
        query: &str,
        history: &[HistoryTurn],
        cancel: &CancelToken,
    ) -> PipelineReply {
        let started = Instant::now();

        let intent = self.classifier.classify(query).await;
        match intent {
            Intent::Greeting => {
                return PipelineReply::early(replies::GREETING_REPLY, "greeting");
            }
            Intent::Unrelated => {
                return PipelineReply::early(replies::UNRELATED_REPLY, "general");
            }
            Intent::Related => {}
        }

        let search_started = Instant::now();
        let documents = match self
            .retriever
            .search(query, TOP_K, MAX_CONTEXT_TOKENS, cancel)
            .await
        {
            Ok(documents) => documents,
            Err(e) if e.is_cancelled() => {
                return PipelineReply::failure(replies::STOPPED);
            }
            Err(e) => {
                // Degrade to a context-free answer rather than abort.
                tracing::warn!("Retrieval failed, generating without context: {}", e);
                Vec::new()
            }
        };
        tracing::info!(elapsed = ?search_started.elapsed(), "Retrieval finished");

        let generate_started = Instant::now();
        let reply = match self
            .generator
            .generate(query, &documents, history, cancel)
            .await
        {
            Ok(text) => PipelineReply::answer(text, documents),
            Err(e) => PipelineReply::failure(user_message(&e)),
        };
        tracing::info!(elapsed = ?generate_started.elapsed(), "Generation finished");

        tracing::info!(total = ?started.elapsed(), error = reply.error, "Pipeline finished");
        reply
    }
}

/// Map an error to its user-facing text.
///
/// Search and generation errors already carry friendly strings (or
/// diagnostic remote-failure text, which is allowed through).
fn user_message(err: &AppError) -> String {
    match err {
        AppError::Cancelled => replies::STOPPED.to_string(),
        AppError::Search(msg) | AppError::Generation(msg) | AppError::Embedding(msg) => {
            msg.clone()
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dulich_llm::{ChatRequest, ChatResponse, LlmClient};
    use dulich_search::{EmbeddingProvider, HybridQuery, ScoredHit, SearchBackend};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// LLM fake: first call answers classification, later calls answer
    /// generation.
    struct ScriptedLlm {
        intent_label: &'static str,
        answer: &'static str,
        calls: AtomicUsize,
    }

    impl ScriptedLlm {
        fn new(intent_label: &'static str, answer: &'static str) -> Self {
            Self {
                intent_label,
                answer,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for ScriptedLlm {
        fn provider_name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let content = if call == 0 {
                self.intent_label.to_string()
            } else {
                self.answer.to_string()
            };
            Ok(ChatResponse {
                content,
                model: request.model.clone(),
            })
        }
    }

    struct SlowAnswerLlm {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl LlmClient for SlowAnswerLlm {
        fn provider_name(&self) -> &str {
            "slow"
        }

        async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                return Ok(ChatResponse {
                    content: "related".to_string(),
                    model: request.model.clone(),
                });
            }
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(ChatResponse {
                content: "quá muộn.".to_string(),
                model: request.model.clone(),
            })
        }
    }

    struct FixedEmbedder;

    #[async_trait::async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        fn provider_name(&self) -> &str {
            "fixed"
        }

        async fn embed(&self, _text: &str) -> AppResult<Vec<f32>> {
            Ok(vec![0.1, 0.2])
        }
    }

    /// Search fake that counts calls.
    struct CountingBackend {
        hits: Vec<ScoredHit>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl SearchBackend for CountingBackend {
        async fn search(&self, _query: &HybridQuery) -> AppResult<Vec<ScoredHit>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.hits.clone())
        }
    }

    fn hit(title: &str, link: &str, score: f32) -> ScoredHit {
        ScoredHit {
            title: title.to_string(),
            content: format!("Thông tin về {}.", title),
            link: link.to_string(),
            score,
            highlight: None,
        }
    }

    fn pipeline_with(
        llm: Arc<dyn LlmClient>,
        hits: Vec<ScoredHit>,
    ) -> (Pipeline, Arc<AtomicUsize>) {
        let tokenizer = Tokenizer::new().unwrap();
        let search_calls = Arc::new(AtomicUsize::new(0));
        let backend = Arc::new(CountingBackend {
            hits,
            calls: Arc::clone(&search_calls),
        });

        let pipeline = Pipeline::with_components(
            IntentClassifier::new(Arc::clone(&llm), "test-model"),
            Retriever::new(Arc::new(FixedEmbedder), backend, tokenizer.clone()),
            Generator::new(
                llm,
                PromptBuilder::new(tokenizer.clone()).unwrap(),
                tokenizer,
                "test-model",
            ),
        );

        (pipeline, search_calls)
    }

    #[tokio::test]
    async fn test_related_query_gets_cited_answer() {
        let llm = Arc::new(ScriptedLlm::new("related", "Quy Nhơn có Kỳ Co, Eo Gió."));
        let (pipeline, _) = pipeline_with(llm, vec![hit("Kỳ Co", "https://example.vn/ky-co", 2.0)]);

        let reply = pipeline.answer("Quy Nhơn có gì chơi?", &[]).await;

        assert!(!reply.error);
        assert!(reply.response.contains("https://example.vn/ky-co"));
        assert_eq!(reply.documents.len(), 1);
    }

    #[tokio::test]
    async fn test_greeting_short_circuits_without_search() {
        let llm = Arc::new(ScriptedLlm::new("greeting", "unused"));
        let (pipeline, search_calls) = pipeline_with(llm, vec![hit("x", "l", 1.0)]);

        let reply = pipeline.answer("Xin chào", &[]).await;

        assert!(!reply.error);
        assert_eq!(reply.response, replies::GREETING_REPLY);
        assert_eq!(reply.source.as_deref(), Some("greeting"));
        assert_eq!(search_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unrelated_short_circuits_without_search() {
        let llm = Arc::new(ScriptedLlm::new("unrelated", "unused"));
        let (pipeline, search_calls) = pipeline_with(llm, vec![hit("x", "l", 1.0)]);

        let reply = pipeline.answer("Học Python ở đâu?", &[]).await;

        assert!(!reply.error);
        assert_eq!(reply.response, replies::UNRELATED_REPLY);
        assert_eq!(reply.source.as_deref(), Some("general"));
        assert_eq!(search_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_hits_degrades_to_contextless_answer() {
        let llm = Arc::new(ScriptedLlm::new("related", "Mình chưa có dữ liệu chỗ đó."));
        let (pipeline, search_calls) = pipeline_with(llm, vec![]);

        let reply = pipeline.answer("Chỗ nào đó xa lạ?", &[]).await;

        // Retrieval error was absorbed, generation proceeded without
        // context and without a citation.
        assert!(!reply.error);
        assert!(reply.documents.is_empty());
        assert!(!reply.response.contains("<a href"));
        assert_eq!(search_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_generation_timeout_surfaces_too_slow() {
        let llm = Arc::new(SlowAnswerLlm {
            calls: AtomicUsize::new(0),
        });
        let tokenizer = Tokenizer::new().unwrap();
        let backend = Arc::new(CountingBackend {
            hits: vec![hit("Kỳ Co", "https://example.vn/ky-co", 2.0)],
            calls: Arc::new(AtomicUsize::new(0)),
        });

        let pipeline = Pipeline::with_components(
            IntentClassifier::new(Arc::clone(&llm) as Arc<dyn LlmClient>, "test-model"),
            Retriever::new(Arc::new(FixedEmbedder), backend, tokenizer.clone()),
            Generator::new(
                llm,
                PromptBuilder::new(tokenizer.clone()).unwrap(),
                tokenizer,
                "test-model",
            )
            .with_deadline(Duration::from_millis(50)),
        );

        let cancel = CancelToken::new();
        let reply = pipeline.answer_with_cancel("Quy Nhơn có gì?", &[], &cancel).await;

        assert!(reply.error);
        assert_eq!(reply.response, replies::TOO_SLOW);
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_before_start_is_terminal() {
        let llm = Arc::new(ScriptedLlm::new("related", "không dùng"));
        let (pipeline, search_calls) = pipeline_with(llm, vec![hit("x", "l", 1.0)]);

        let cancel = CancelToken::new();
        cancel.cancel();

        let reply = pipeline
            .answer_with_cancel("Quy Nhơn có gì?", &[], &cancel)
            .await;

        assert!(reply.error);
        assert_eq!(reply.response, replies::STOPPED);
        assert_eq!(search_calls.load(Ordering::SeqCst), 0);
    }
}
