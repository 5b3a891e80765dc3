//! Token usage estimates.
//!
//! Upstream providers do not report token accounting through the bridge,
//! so usage is estimated at four characters per token, rounded up.

use serde::{Deserialize, Serialize};

use super::chat::ChatMessage;

const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count of `char_count` characters.
#[must_use]
pub fn estimate_tokens(char_count: usize) -> u32 {
    u32::try_from(char_count.div_ceil(CHARS_PER_TOKEN)).unwrap_or(u32::MAX)
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Estimate usage for a prompt conversation and its completion text.
    ///
    /// The prompt estimate is taken over the combined content length of
    /// all messages, not summed per message.
    pub fn estimate(messages: &[ChatMessage], completion: &str) -> Self {
        let prompt_chars: usize = messages.iter().map(|m| m.content.chars().count()).sum();
        let prompt_tokens = estimate_tokens(prompt_chars);
        let completion_tokens = estimate_tokens(completion.chars().count());
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}
