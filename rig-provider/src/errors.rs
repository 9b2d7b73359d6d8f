use rig_extract_core::ModelError;
use thiserror::Error;

/// Errors relating to the Rig-backed model client.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Error from Rig's prompt machinery (HTTP, provider, response decoding).
    #[error("Rig prompt error: {0}")]
    Prompt(#[from] rig::completion::PromptError),

    /// Invalid client settings.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ProviderError> for ModelError {
    fn from(err: ProviderError) -> Self {
        let message = err.to_string();
        if is_rate_limited(&message) {
            Self::RateLimited(message)
        } else {
            Self::Transport(message)
        }
    }
}

/// Recognises rate-limit refusals from provider error text.
///
/// Rig surfaces provider HTTP failures as strings, so the status is matched
/// textually.
#[must_use]
pub fn is_rate_limited(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("429")
        || lower.contains("rate limit")
        || lower.contains("rate_limit")
        || lower.contains("too many requests")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_detection() {
        assert!(is_rate_limited("HTTP 429 Too Many Requests"));
        assert!(is_rate_limited("error: rate_limit_exceeded"));
        assert!(is_rate_limited("Rate limit reached for gpt-4o-mini"));
        assert!(!is_rate_limited("connection reset by peer"));
    }

    #[test]
    fn test_config_error_maps_to_transport() {
        let err: ModelError = ProviderError::Config("bad temperature".to_string()).into();
        assert_eq!(
            err,
            ModelError::Transport("Configuration error: bad temperature".to_string())
        );
    }

    #[test]
    fn test_rate_limited_provider_error_maps_to_rate_limited() {
        let err: ModelError = ProviderError::Config("429 from upstream".to_string()).into();
        assert!(matches!(err, ModelError::RateLimited(_)));
    }
}
