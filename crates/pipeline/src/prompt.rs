//! Prompt assembly.
//!
//! Builds the system instruction for the travel-guide persona, the
//! token-budgeted context section, and the query. With no documents
//! the apology variant is produced instead — a valid prompt, not an
//! error.

use crate::tokenizer::Tokenizer;
use dulich_core::{AppError, AppResult};
use dulich_search::ScoredHit;
use handlebars::Handlebars;
use serde_json::json;

/// Marker separating the persona block from the context section.
/// The generator splits the system message here when rebalancing.
pub const CONTEXT_HEADER: &str = "**Dữ liệu chính:**";

/// Fixed travel-guide persona and formatting rules.
const PERSONA: &str = "Bạn là hướng dẫn viên du lịch thân thiện, chuyên về Bình Định, được tạo bởi **Nguyễn Bá Lâm** (Phù Mỹ, Bình Định).\n\
Trả lời gần gũi, đúng trọng tâm, dùng **Markdown**:\n\
- Ưu tiên dữ liệu bên dưới, bổ sung kiến thức ngoài nếu cần (ghi rõ).\n\
- Nếu người dùng hỏi nhiều ý (ví dụ: địa điểm + món ăn), hãy cố gắng trả lời đầy đủ cả hai nếu liên quan đến Bình Định.\n\
- Giữ câu trả lời ~400 token, dùng gạch đầu dòng (-), in đậm **tiêu đề**.\n\
- Từ chối lịch sự nếu không liên quan đến du lịch, văn hóa, lịch sử Bình Định.\n\
- Chỉ dùng liên kết của tài liệu đầu tiên.\n";

/// Main prompt: persona, context section, query.
const MAIN_TEMPLATE: &str =
    "{{persona}}\n\n**Dữ liệu chính:**\n{{context}}\n\n**Câu hỏi:** {{query}}\n\n";

/// Apology variant when there is no context to ground the answer.
const APOLOGY_TEMPLATE: &str = "{{persona}}\n\n**Xin lỗi nhé!** Mình không có dữ liệu chính về \u{201c}{{query}}\u{201d}. Hỏi mình về du lịch Bình Định nhé! 😊";

/// Render the snippet a document contributes to the prompt context.
/// Links are excluded here; only the trailing citation carries one.
pub fn prompt_snippet(doc: &ScoredHit) -> String {
    format!("**{}**\n{}", doc.title, doc.content)
}

/// Greedily join document snippets under a token budget.
///
/// Same selection policy as retrieval: include candidates in order
/// while they fit, stop at the first overflow.
pub fn budgeted_context(documents: &[ScoredHit], budget: usize, tokenizer: &Tokenizer) -> String {
    let mut parts = Vec::new();
    let mut current_tokens = 0;

    for doc in documents {
        let snippet = prompt_snippet(doc);
        let snippet_tokens = tokenizer.count(&snippet);
        if current_tokens + snippet_tokens > budget {
            break;
        }
        current_tokens += snippet_tokens;
        parts.push(snippet);
    }

    parts.join("\n\n")
}

/// Prompt builder with pre-registered templates.
pub struct PromptBuilder {
    handlebars: Handlebars<'static>,
    tokenizer: Tokenizer,
}

impl PromptBuilder {
    pub fn new(tokenizer: Tokenizer) -> AppResult<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);

        handlebars
            .register_template_string("main", MAIN_TEMPLATE)
            .map_err(|e| AppError::Other(format!("Failed to register template: {}", e)))?;
        handlebars
            .register_template_string("apology", APOLOGY_TEMPLATE)
            .map_err(|e| AppError::Other(format!("Failed to register template: {}", e)))?;

        Ok(Self {
            handlebars,
            tokenizer,
        })
    }

    /// Build the system prompt for the given documents and query.
    ///
    /// The context section is re-budgeted here even though retrieval
    /// already budgets its selection, because callers may hand in more
    /// documents than retrieval would have kept.
    pub fn build(
        &self,
        documents: &[ScoredHit],
        query: &str,
        max_context_tokens: usize,
    ) -> AppResult<String> {
        if documents.is_empty() {
            let rendered = self
                .handlebars
                .render("apology", &json!({ "persona": PERSONA, "query": query }))
                .map_err(|e| AppError::Other(format!("Failed to render prompt: {}", e)))?;
            return Ok(rendered);
        }

        let context = budgeted_context(documents, max_context_tokens, &self.tokenizer);

        let rendered = self
            .handlebars
            .render(
                "main",
                &json!({ "persona": PERSONA, "context": context, "query": query }),
            )
            .map_err(|e| AppError::Other(format!("Failed to render prompt: {}", e)))?;

        tracing::debug!(
            prompt_tokens = self.tokenizer.count(&rendered),
            "Built prompt"
        );

        Ok(rendered)
    }
}
