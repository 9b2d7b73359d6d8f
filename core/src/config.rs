//! Configuration for extraction retry behavior.

use std::time::Duration;

use crate::error::ExtractionError;

/// Configuration for extraction retry behavior.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Maximum number of attempts before giving up (default: 3).
    pub max_retries: usize,
    /// Model identifier passed to the [`ModelClient`](crate::ModelClient) (default: `gpt-4o-mini`).
    pub model_id: String,
    /// Info string of the fenced block the model must emit (default: `json`).
    pub fence_tag: String,
    /// Whether to repeat the field list in repair prompts (default: true).
    pub include_fields_in_repair: bool,
    /// Upper bound on in-flight model calls across all sessions (default: 4).
    pub max_concurrent_calls: usize,
    /// Per-call timeout applied at the model boundary (default: none).
    pub call_timeout: Option<Duration>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            model_id: "gpt-4o-mini".to_string(),
            fence_tag: "json".to_string(),
            include_fields_in_repair: true,
            max_concurrent_calls: 4,
            call_timeout: None,
        }
    }
}

impl ExtractionConfig {
    /// Set the maximum number of attempts.
    #[must_use]
    pub const fn with_max_retries(mut self, max: usize) -> Self {
        self.max_retries = max;
        self
    }

    /// Set the model identifier used for extraction and verification calls.
    #[must_use]
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Set the fenced block tag the parser looks for.
    #[must_use]
    pub fn with_fence_tag(mut self, tag: impl Into<String>) -> Self {
        self.fence_tag = tag.into();
        self
    }

    /// Set whether to include the field list in repair prompts.
    #[must_use]
    pub const fn with_fields_in_repair(mut self, include: bool) -> Self {
        self.include_fields_in_repair = include;
        self
    }

    /// Set the concurrency limit for model calls.
    #[must_use]
    pub const fn with_max_concurrent_calls(mut self, max: usize) -> Self {
        self.max_concurrent_calls = max;
        self
    }

    /// Set the per-call timeout.
    #[must_use]
    pub const fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Checks the configuration before any model call is made.
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::InvalidConfig` for zero retries or a fence tag
    /// that could never appear on a fence line.
    pub fn validate(&self) -> Result<(), ExtractionError> {
        if self.max_retries == 0 {
            return Err(ExtractionError::InvalidConfig(
                "max_retries must be at least 1".to_string(),
            ));
        }
        if self.fence_tag.trim().is_empty() {
            return Err(ExtractionError::InvalidConfig(
                "fence_tag must not be empty".to_string(),
            ));
        }
        if self
            .fence_tag
            .chars()
            .any(|c| c == '`' || c.is_whitespace())
        {
            return Err(ExtractionError::InvalidConfig(format!(
                "fence_tag '{}' may not contain backticks or whitespace",
                self.fence_tag
            )));
        }
        Ok(())
    }
}
