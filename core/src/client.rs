//! The model boundary: the [`ModelClient`] seam and the gateway that bounds it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Semaphore;

/// Failures at the model boundary.
///
/// The retry loop never retries these; they abort the session unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Network, authentication or provider failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The provider refused the call because of rate limiting.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The call did not complete within the configured timeout.
    #[error("Model call timed out after {0:?}")]
    Timeout(Duration),

    /// The client can no longer accept calls.
    #[error("Model client unavailable: {0}")]
    Unavailable(String),
}

/// A stateless request/response capability for a generative text model.
///
/// Implementations must tolerate concurrent calls; one client is shared by
/// every session a controller runs.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Sends `prompt` to the model named `model_id` and returns its text reply.
    async fn send(&self, prompt: &str, model_id: &str) -> Result<String, ModelError>;
}

/// The single path from the core to a [`ModelClient`].
///
/// Every extraction, repair and verification call goes through here so the
/// concurrency limit and per-call timeout apply uniformly.
#[derive(Clone)]
pub struct ModelGateway {
    client: Arc<dyn ModelClient>,
    permits: Arc<Semaphore>,
    call_timeout: Option<Duration>,
}

impl ModelGateway {
    /// Creates a gateway allowing at most `max_concurrent_calls` (floored at 1)
    /// in-flight calls.
    #[must_use]
    pub fn new(
        client: Arc<dyn ModelClient>,
        max_concurrent_calls: usize,
        call_timeout: Option<Duration>,
    ) -> Self {
        Self {
            client,
            permits: Arc::new(Semaphore::new(max_concurrent_calls.max(1))),
            call_timeout,
        }
    }

    /// Sends one prompt, waiting for a permit first.
    ///
    /// # Errors
    ///
    /// Propagates the client's [`ModelError`], or `ModelError::Timeout` when
    /// the configured timeout elapses.
    pub async fn send(&self, prompt: &str, model_id: &str) -> Result<String, ModelError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| ModelError::Unavailable(e.to_string()))?;

        tracing::debug!(
            event = "model_call",
            model = model_id,
            prompt_chars = prompt.chars().count(),
            "model_call"
        );

        let reply = match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, self.client.send(prompt, model_id))
                .await
                .map_err(|_| ModelError::Timeout(limit))?,
            None => self.client.send(prompt, model_id).await,
        };

        match &reply {
            Ok(text) => tracing::debug!(
                event = "model_reply",
                model = model_id,
                reply_chars = text.chars().count(),
                "model_reply"
            ),
            Err(e) => tracing::warn!(
                event = "model_call_failed",
                model = model_id,
                error = %e,
                "model_call_failed"
            ),
        }

        reply
    }
}

impl std::fmt::Debug for ModelGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelGateway")
            .field("available_permits", &self.permits.available_permits())
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}
