//! Query intent classification.
//!
//! Labels a query as related, unrelated, or greeting by delegating to
//! the language model with a fixed few-shot instruction. Failures
//! never abort the pipeline: ambiguous or failed classification
//! defaults to `Related`, so legitimate questions are never blocked.

use dulich_llm::{ChatMessage, ChatRequest, LlmClient};
use std::sync::Arc;

/// Few-shot classification instruction.
const CLASSIFIER_PROMPT: &str = "Bạn là bộ phân loại thông minh. Phân loại câu hỏi đầu vào thành 1 trong 3 loại sau:\n\
- related: nếu liên quan đến du lịch, văn hóa, lịch sử, ẩm thực, ăn uống, vui chơi ở Bình Định\n\
- unrelated: nếu không liên quan gì đến chủ đề trên\n\
- greeting: nếu là lời chào hỏi, cảm ơn, chúc, tạm biệt, v.v.\n\n\
Chỉ trả lời 1 từ: related / unrelated / greeting.\n\
Ví dụ:\n\
- 'Có những địa điểm du lịch nào ở Quy Nhơn?' → related\n\
- 'Tôi nên học Python ở đâu?' → unrelated\n\
- 'Chào bạn!' → greeting\n\
- 'Tạm biệt nhé, hẹn gặp lại!' → greeting\n\
- 'Nghệ thuật hát tuồng ở Bình Định ra sao?' → related\n\
- 'iPhone 15 ra mắt năm nào?' → unrelated\n";

/// Query intent label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// In-domain question, proceed through retrieval and generation
    Related,
    /// Outside the travel domain, answered with a fixed refusal
    Unrelated,
    /// Social nicety, answered with a fixed greeting
    Greeting,
}

impl Intent {
    /// Parse a model label. Unknown labels read as `Related`.
    fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "unrelated" => Self::Unrelated,
            "greeting" => Self::Greeting,
            _ => Self::Related,
        }
    }
}

/// LLM-backed intent classifier.
pub struct IntentClassifier {
    client: Arc<dyn LlmClient>,
    model: String,
}

impl IntentClassifier {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Classify a query.
    ///
    /// One remote call; on remote failure the query is treated as
    /// in-domain rather than rejected.
    pub async fn classify(&self, query: &str) -> Intent {
        let messages = vec![
            ChatMessage::system(CLASSIFIER_PROMPT),
            ChatMessage::user(format!(
                "Câu hỏi: {}\nTrả lời (related/unrelated/greeting):",
                query
            )),
        ];

        let request = ChatRequest::new(messages, &self.model)
            .with_max_tokens(5)
            .with_temperature(0.0);

        match self.client.complete(&request).await {
            Ok(response) => {
                let intent = Intent::from_label(&response.content);
                tracing::debug!(?intent, query, "Classified query");
                intent
            }
            Err(e) => {
                tracing::warn!("Intent classification failed, defaulting to related: {}", e);
                Intent::Related
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dulich_core::{AppError, AppResult};
    use dulich_llm::ChatResponse;

    struct FixedLlm {
        reply: AppResult<&'static str>,
    }

    #[async_trait::async_trait]
    impl LlmClient for FixedLlm {
        fn provider_name(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
            match &self.reply {
                Ok(content) => Ok(ChatResponse {
                    content: content.to_string(),
                    model: request.model.clone(),
                }),
                Err(_) => Err(AppError::Generation("remote down".to_string())),
            }
        }
    }

    fn classifier(reply: AppResult<&'static str>) -> IntentClassifier {
        IntentClassifier::new(Arc::new(FixedLlm { reply }), "openai/gpt-4.1")
    }

    #[test]
    fn test_label_parsing() {
        assert_eq!(Intent::from_label("related"), Intent::Related);
        assert_eq!(Intent::from_label(" GREETING \n"), Intent::Greeting);
        assert_eq!(Intent::from_label("unrelated"), Intent::Unrelated);
        assert_eq!(Intent::from_label("banana"), Intent::Related);
        assert_eq!(Intent::from_label(""), Intent::Related);
    }

    #[tokio::test]
    async fn test_classify_greeting() {
        let intent = classifier(Ok("greeting")).classify("Xin chào").await;
        assert_eq!(intent, Intent::Greeting);
    }

    #[tokio::test]
    async fn test_classify_fails_open() {
        let intent = classifier(Err(AppError::Generation("down".to_string())))
            .classify("Quy Nhơn có gì chơi?")
            .await;
        assert_eq!(intent, Intent::Related);
    }
}
