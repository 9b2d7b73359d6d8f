use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig_extract_core::{ModelClient, ModelError};

use crate::errors::ProviderError;

/// Agent settings applied to every call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RigClientConfig {
    /// System prompt for every agent built by the client.
    pub preamble: Option<String>,
    /// Sampling temperature (0.0 to 2.0); provider default when `None`.
    pub temperature: Option<f64>,
}

impl RigClientConfig {
    /// Create a new `RigClientConfig` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the system prompt.
    #[must_use]
    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = Some(preamble.into());
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// [`ModelClient`] over any Rig [`CompletionClient`].
///
/// Each call builds a one-shot agent for the requested model and prompts it
/// once. The client holds no per-call state, so it is safe to share between
/// concurrent extraction sessions.
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # use rig_extract_core::{RetryController, Schema};
/// # use rig_extract_provider::RigModelClient;
/// # fn example<C>(rig_client: C, schema: Schema) -> Result<(), Box<dyn std::error::Error>>
/// # where
/// #     C: rig::client::CompletionClient + Send + Sync + 'static,
/// # {
/// let client = RigModelClient::new(rig_client);
/// let controller = RetryController::new(schema, Arc::new(client));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RigModelClient<C> {
    client: C,
    config: RigClientConfig,
}

impl<C> RigModelClient<C> {
    /// Wraps a Rig client with default agent settings.
    pub fn new(client: C) -> Self {
        Self {
            client,
            config: RigClientConfig::default(),
        }
    }

    /// Wraps a Rig client with custom agent settings.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Config` for a temperature outside 0.0..=2.0.
    pub fn with_config(client: C, config: RigClientConfig) -> Result<Self, ProviderError> {
        if let Some(temperature) = config.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ProviderError::Config(format!(
                    "temperature {temperature} is outside 0.0..=2.0"
                )));
            }
        }
        Ok(Self { client, config })
    }

    /// The agent settings in use.
    pub const fn config(&self) -> &RigClientConfig {
        &self.config
    }
}

#[async_trait]
impl<C> ModelClient for RigModelClient<C>
where
    C: CompletionClient + Send + Sync + 'static,
{
    async fn send(&self, prompt: &str, model_id: &str) -> Result<String, ModelError> {
        let mut builder = self.client.agent(model_id);
        if let Some(preamble) = &self.config.preamble {
            builder = builder.preamble(preamble);
        }
        if let Some(temperature) = self.config.temperature {
            builder = builder.temperature(temperature);
        }
        let agent = builder.build();

        match agent.prompt(prompt).await {
            Ok(reply) => {
                tracing::debug!(
                    event = "rig_prompt_completed",
                    model = model_id,
                    reply_chars = reply.len(),
                    "rig_prompt_completed"
                );
                Ok(reply)
            }
            Err(e) => {
                let err = ProviderError::from(e);
                tracing::warn!(
                    event = "rig_prompt_failed",
                    model = model_id,
                    error = %err,
                    "rig_prompt_failed"
                );
                Err(err.into())
            }
        }
    }
}

impl<C> std::fmt::Debug for RigModelClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RigModelClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
