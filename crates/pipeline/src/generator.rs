//! Deadline-bounded answer generation.
//!
//! Assembles the message sequence (system prompt, recent history,
//! query) under a global token budget, invokes the language model as a
//! separately cancellable task with a hard wall-clock deadline, and
//! post-processes the completion (trailing citation, sentence-boundary
//! trimming).

use crate::prompt::{budgeted_context, PromptBuilder, CONTEXT_HEADER};
use crate::replies;
use crate::tokenizer::Tokenizer;
use crate::types::HistoryTurn;
use dulich_core::{AppError, AppResult, CancelToken};
use dulich_llm::{ChatMessage, ChatRequest, ChatRole, LlmClient};
use dulich_search::ScoredHit;
use std::sync::Arc;
use std::time::Duration;

/// Token ceiling for the retrieval context section.
pub const MAX_CONTEXT_TOKENS: usize = 5000;

/// Token ceiling for included conversation history.
pub const HISTORY_BUDGET: usize = 1000;

/// Token ceiling for the whole message sequence.
pub const MAX_TOTAL_TOKENS: usize = 8000;

/// Wall-clock deadline for one completion call.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// Only the most recent turns are ever considered.
const MAX_HISTORY_TURNS: usize = 5;

/// When rebalancing, the context section never drops below this;
/// the query shrinks instead.
const CONTEXT_FLOOR: usize = 1000;

/// Tokens reserved for the markdown scaffolding around the context
/// section when rebalancing (header, separators, question label).
const FORMAT_SLACK: usize = 32;

/// Completion parameters for answers.
const ANSWER_MAX_TOKENS: u32 = 500;
const ANSWER_TEMPERATURE: f32 = 0.5;

/// Sentence-terminal markers an answer may end with.
const TERMINAL_MARKERS: [&str; 4] = [".", "!", "?", "😊"];

/// Answer generator.
pub struct Generator {
    client: Arc<dyn LlmClient>,
    prompt: PromptBuilder,
    tokenizer: Tokenizer,
    model: String,
    deadline: Duration,
}

impl Generator {
    pub fn new(
        client: Arc<dyn LlmClient>,
        prompt: PromptBuilder,
        tokenizer: Tokenizer,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            prompt,
            tokenizer,
            model: model.into(),
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Override the completion deadline (tests use short ones).
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Generate an answer for the query grounded in `documents`.
    pub async fn generate(
        &self,
        query: &str,
        documents: &[ScoredHit],
        history: &[HistoryTurn],
        cancel: &CancelToken,
    ) -> AppResult<String> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let prompt = self.prompt.build(documents, query, MAX_CONTEXT_TOKENS)?;
        let mut messages = self.assemble_messages(prompt, history, query);

        let total: usize = messages
            .iter()
            .map(|m| self.tokenizer.count(&m.content))
            .sum();
        tracing::debug!(total_tokens = total, "Assembled messages");

        if total > MAX_TOTAL_TOKENS {
            self.rebalance(&mut messages, documents, MAX_TOTAL_TOKENS)?;
        }

        let request = ChatRequest::new(messages, &self.model)
            .with_max_tokens(ANSWER_MAX_TOKENS)
            .with_temperature(ANSWER_TEMPERATURE);

        // The completion runs as its own task so the deadline bounds
        // our wait, not the remote call. On timeout the task is
        // aborted and the invocation's cancel flag is set so sibling
        // stages stop too.
        let client = Arc::clone(&self.client);
        let mut handle = tokio::spawn(async move { client.complete(&request).await });

        let response = match tokio::time::timeout(self.deadline, &mut handle).await {
            Ok(Ok(Ok(response))) => response,
            Ok(Ok(Err(e))) => return Err(e),
            Ok(Err(join_err)) => {
                return Err(AppError::Generation(format!(
                    "Completion task failed: {}",
                    join_err
                )))
            }
            Err(_) => {
                tracing::warn!(deadline = ?self.deadline, "Completion deadline elapsed");
                cancel.cancel();
                handle.abort();
                return Err(AppError::Generation(replies::TOO_SLOW.to_string()));
            }
        };

        // Cancellation observed after completion still wins: the
        // caller has moved on, the produced answer is discarded.
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let mut content = response.content;
        if let Some(first) = documents.first() {
            content.push_str(&replies::citation(&first.link));
        }

        Ok(finish_sentence(content))
    }

    /// Build the message sequence: system prompt, then up to the last
    /// five history turns, then the raw query as the user message.
    ///
    /// History turns share a running 1000-token allowance. A turn that
    /// would overflow it is truncated to whatever allowance remains
    /// and still included; once the allowance is gone, later turns
    /// come through empty.
    fn assemble_messages(
        &self,
        prompt: String,
        history: &[HistoryTurn],
        query: &str,
    ) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(prompt)];

        let recent = if history.len() > MAX_HISTORY_TURNS {
            &history[history.len() - MAX_HISTORY_TURNS..]
        } else {
            history
        };

        let mut history_tokens = 0;
        for turn in recent {
            let mut content = turn.content.clone();
            let mut turn_tokens = self.tokenizer.count(&content);

            if history_tokens + turn_tokens > HISTORY_BUDGET {
                content = self
                    .tokenizer
                    .truncate(&content, HISTORY_BUDGET.saturating_sub(history_tokens));
                turn_tokens = self.tokenizer.count(&content);
            }

            history_tokens += turn_tokens;
            messages.push(ChatMessage {
                role: ChatRole::from_label(&turn.role),
                content,
            });
        }

        messages.push(ChatMessage::user(query));
        messages
    }

    /// Shrink the message sequence back under `max_total` tokens.
    ///
    /// The persona part of the system message is preserved verbatim;
    /// the context section is rebuilt under whatever budget remains
    /// after system, history, and query. When that budget falls below
    /// the context floor, the query itself is truncated instead (it
    /// appears twice: in the system tail and as the user message).
    ///
    /// With no documents the system message is the apology variant,
    /// which also embeds the query; the query is truncated under what
    /// remains after the apology scaffolding and history, and the
    /// apology is re-rendered with the truncated query.
    fn rebalance(
        &self,
        messages: &mut Vec<ChatMessage>,
        documents: &[ScoredHit],
        max_total: usize,
    ) -> AppResult<()> {
        let last = messages.len() - 1;
        let history_tokens: usize = messages[1..last]
            .iter()
            .map(|m| self.tokenizer.count(&m.content))
            .sum();

        if documents.is_empty() {
            let scaffold = self.prompt.build(&[], "", MAX_CONTEXT_TOKENS)?;
            let fixed = self.tokenizer.count(&scaffold) + history_tokens + FORMAT_SLACK;
            let query_budget = max_total.saturating_sub(fixed) / 2;

            let query = self
                .tokenizer
                .truncate(&messages[last].content, query_budget);
            messages[0].content = self.prompt.build(&[], &query, MAX_CONTEXT_TOKENS)?;
            messages[last].content = query;

            let total: usize = messages
                .iter()
                .map(|m| self.tokenizer.count(&m.content))
                .sum();
            tracing::debug!(total_tokens = total, "Rebalanced messages");
            return Ok(());
        }

        let system = messages[0].content.clone();
        let base = system
            .split_once(CONTEXT_HEADER)
            .map(|(before, _)| before.to_string())
            .unwrap_or(system);
        let base_tokens = self.tokenizer.count(&base);

        let mut query = messages[last].content.clone();
        let mut query_tokens = self.tokenizer.count(&query);

        let fixed = base_tokens + history_tokens + FORMAT_SLACK;
        let mut remaining = max_total as i64 - (fixed + 2 * query_tokens) as i64;

        if remaining < CONTEXT_FLOOR as i64 {
            let query_budget = max_total.saturating_sub(fixed + CONTEXT_FLOOR) / 2;
            query = self.tokenizer.truncate(&query, query_budget);
            query_tokens = self.tokenizer.count(&query);
            remaining = max_total as i64 - (fixed + 2 * query_tokens) as i64;
        }

        let context_budget = remaining.max(0) as usize;
        let context = budgeted_context(documents, context_budget, &self.tokenizer);
        messages[0].content = format!(
            "{}{}\n{}\n\n**Câu hỏi:** {}\n\n",
            base, CONTEXT_HEADER, context, query
        );
        messages[last].content = query;

        let total: usize = messages
            .iter()
            .map(|m| self.tokenizer.count(&m.content))
            .sum();
        tracing::debug!(total_tokens = total, "Rebalanced messages");
        Ok(())
    }
}

/// Enforce natural sentence termination.
///
/// If the text does not already end at a terminal marker (or ends in
/// an ellipsis), it is cut back to the last terminal marker anywhere
/// in the text. Text with no terminal marker at all is returned
/// unchanged.
fn finish_sentence(text: String) -> String {
    let at_boundary = TERMINAL_MARKERS
        .iter()
        .any(|m| text.trim_end().ends_with(m));

    if at_boundary && !text.ends_with("...") {
        return text;
    }

    let mut best: Option<(usize, usize)> = None;
    for marker in TERMINAL_MARKERS {
        if let Some(idx) = text.rfind(marker) {
            if best.map_or(true, |(b, _)| idx > b) {
                best = Some((idx, marker.len()));
            }
        }
    }

    match best {
        Some((idx, len)) => {
            let mut trimmed = text;
            trimmed.truncate(idx + len);
            trimmed
        }
        None => text,
    }
}
