//! Token counting and truncation.
//!
//! Every budget in the pipeline is expressed in tokens of one
//! tokenization scheme (`cl100k_base`). Budgets are additive across
//! stages, so mixing schemes would be a design error, not just an
//! accuracy loss; a single `Tokenizer` is cloned into every component.

use dulich_core::{AppError, AppResult};
use std::sync::Arc;
use tiktoken_rs::CoreBPE;

/// Shared token counter and truncator.
#[derive(Clone)]
pub struct Tokenizer {
    bpe: Arc<CoreBPE>,
}

impl Tokenizer {
    /// Create a tokenizer over the `cl100k_base` encoding.
    pub fn new() -> AppResult<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| AppError::Config(format!("Failed to load tokenizer: {}", e)))?;
        Ok(Self { bpe: Arc::new(bpe) })
    }

    /// Count tokens in the given text.
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// Truncate text to at most `max_tokens` tokens.
    ///
    /// The result decodes to a prefix of `text`. Already-fitting input
    /// (and empty input) is returned unchanged. A token cut that lands
    /// inside a multi-byte character is backed off until the prefix
    /// decodes cleanly.
    pub fn truncate(&self, text: &str, max_tokens: usize) -> String {
        if text.is_empty() {
            return text.to_string();
        }

        let tokens = self.bpe.encode_ordinary(text);
        if tokens.len() <= max_tokens {
            return text.to_string();
        }

        let mut end = max_tokens;
        while end > 0 {
            if let Ok(decoded) = self.bpe.decode(tokens[..end].to_vec()) {
                return decoded;
            }
            end -= 1;
        }

        String::new()
    }
}

impl std::fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokenizer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_budget() {
        let tokenizer = Tokenizer::new().unwrap();
        let text = "Quy Nhơn là thành phố biển xinh đẹp của tỉnh Bình Định, nổi tiếng với Kỳ Co và Eo Gió.";

        for budget in [0, 1, 3, 8, 1000] {
            let truncated = tokenizer.truncate(text, budget);
            assert!(tokenizer.count(&truncated) <= budget);
        }
    }

    #[test]
    fn test_truncate_is_identity_when_fitting() {
        let tokenizer = Tokenizer::new().unwrap();
        let text = "Tháp Đôi Quy Nhơn";
        let count = tokenizer.count(text);

        assert_eq!(tokenizer.truncate(text, count), text);
        assert_eq!(tokenizer.truncate(text, count + 10), text);
    }

    #[test]
    fn test_truncate_empty_is_empty() {
        let tokenizer = Tokenizer::new().unwrap();
        assert_eq!(tokenizer.truncate("", 10), "");
        assert_eq!(tokenizer.truncate("", 0), "");
    }

    #[test]
    fn test_truncate_result_is_prefix() {
        let tokenizer = Tokenizer::new().unwrap();
        let text = "Bãi biển Kỳ Co nước trong xanh, cát trắng mịn.";
        let truncated = tokenizer.truncate(text, 5);
        assert!(text.starts_with(&truncated));
    }

    #[test]
    fn test_zero_budget_yields_empty() {
        let tokenizer = Tokenizer::new().unwrap();
        assert_eq!(tokenizer.truncate("một hai ba", 0), "");
    }
}
