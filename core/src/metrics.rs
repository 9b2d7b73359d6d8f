//! Metrics tracking and token estimation for extraction sessions.

use std::time::Duration;

/// Metrics collected during one extraction session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionMetrics {
    /// Number of extraction/repair attempts made.
    pub total_attempts: usize,
    /// Wall-clock time elapsed during the session.
    pub wall_time: Duration,
    /// Estimated tokens sent in extraction and repair prompts.
    pub estimated_input_tokens: usize,
    /// Estimated tokens received in extraction and repair replies.
    pub estimated_output_tokens: usize,
}

impl ExtractionMetrics {
    /// Accounts for one extraction or repair round trip.
    pub fn record_call(&mut self, prompt: &str, reply: &str) {
        self.total_attempts += 1;
        self.estimated_input_tokens += estimate_tokens(prompt);
        self.estimated_output_tokens += estimate_tokens(reply);
    }
}

/// Estimate token count from text using the standard 4-chars-per-token heuristic.
///
/// Counts characters, not bytes, and rounds up.
///
/// # Examples
///
/// ```
/// use rig_extract_core::estimate_tokens;
///
/// assert_eq!(estimate_tokens("hello"), 2);  // 5 chars / 4 = 1.25 -> 2
/// assert_eq!(estimate_tokens("hello world"), 3);  // 11 chars / 4 = 2.75 -> 3
/// ```
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("a"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        assert_eq!(estimate_tokens("hello world"), 3); // 11 chars
    }

    #[test]
    fn test_estimate_tokens_utf8() {
        // "你好" is 2 chars but 6 bytes
        assert_eq!(estimate_tokens("你好"), 1);
        assert_eq!(estimate_tokens("hello 世界"), 2);
    }

    #[test]
    fn test_record_call_accumulates() {
        let mut metrics = ExtractionMetrics::default();
        metrics.record_call("abcd", "abcde");
        metrics.record_call("abcdefgh", "");

        assert_eq!(metrics.total_attempts, 2);
        assert_eq!(metrics.estimated_input_tokens, 3);
        assert_eq!(metrics.estimated_output_tokens, 2);
    }
}
