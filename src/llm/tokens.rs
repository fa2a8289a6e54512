//! Character-based token estimation and the request token budget.
//!
//! Providers bill and limit requests in tokens, but no tokenizer is bundled
//! here. Token counts are approximated as `ceil(chars / chars_per_token)`.
//! This is a known-imprecise proxy: real tokenizers can count more or fewer
//! tokens for the same text, so every limit derived from it keeps a margin.

use crate::error::ConfigError;

/// Approximate characters per token (conservative for English and code).
pub const CHARS_PER_TOKEN: usize = 4;

/// Maximum tokens for the whole request (Groq on-demand tier allows 6000 TPM).
pub const MAX_TOTAL_TOKENS: usize = 5400;

/// Maximum tokens for the diff content alone.
pub const MAX_DIFF_TOKENS: usize = 3000;

/// Tokens kept free for the generated response.
pub const RESERVED_RESPONSE_TOKENS: usize = 100;

/// Named token limits applied while building a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBudget {
    pub max_diff_tokens: usize,
    pub max_total_tokens: usize,
    pub chars_per_token: usize,
    pub reserved_response_tokens: usize,
}

impl TokenBudget {
    /// Build a budget, checking that all limits are positive and that the
    /// diff limit is strictly below the total limit.
    pub fn new(
        max_diff_tokens: usize,
        max_total_tokens: usize,
        chars_per_token: usize,
        reserved_response_tokens: usize,
    ) -> Result<Self, ConfigError> {
        if max_diff_tokens == 0
            || max_total_tokens == 0
            || chars_per_token == 0
            || reserved_response_tokens == 0
        {
            return Err(ConfigError::InvalidBudget(
                "all token limits must be positive".to_string(),
            ));
        }

        if max_diff_tokens >= max_total_tokens {
            return Err(ConfigError::InvalidBudget(format!(
                "diff limit ({max_diff_tokens}) must be below the total limit ({max_total_tokens})"
            )));
        }

        Ok(Self {
            max_diff_tokens,
            max_total_tokens,
            chars_per_token,
            reserved_response_tokens,
        })
    }

    /// Estimate the token count of `text`.
    pub fn estimate(&self, text: &str) -> usize {
        estimate_tokens(text, self.chars_per_token)
    }

    /// Character allowance for the diff alone.
    pub fn max_diff_chars(&self) -> usize {
        self.max_diff_tokens * self.chars_per_token
    }
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            max_diff_tokens: MAX_DIFF_TOKENS,
            max_total_tokens: MAX_TOTAL_TOKENS,
            chars_per_token: CHARS_PER_TOKEN,
            reserved_response_tokens: RESERVED_RESPONSE_TOKENS,
        }
    }
}

/// Estimate tokens as `ceil(char_count / chars_per_token)`.
pub fn estimate_tokens(text: &str, chars_per_token: usize) -> usize {
    text.chars().count().div_ceil(chars_per_token.max(1))
}
