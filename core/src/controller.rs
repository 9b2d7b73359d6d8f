//! The extract → parse → validate → repair loop.

use std::sync::Arc;

use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::time::Instant;
use tracing::Instrument;

use crate::client::{ModelClient, ModelGateway};
use crate::config::ExtractionConfig;
use crate::error::{ExtractionError, ValidationError};
use crate::metrics::ExtractionMetrics;
use crate::parser::OutputParser;
use crate::prompt::PromptBuilder;
use crate::schema::Schema;
use crate::session::{Attempt, Session};
use crate::validator::Validator;

/// Terminal state of one extraction session.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Every declared validator passed on this object.
    Success(Map<String, Value>),
    /// The attempt budget ran out.
    Exhausted {
        /// Number of attempts made.
        attempts: usize,
        /// Every error from the final attempt.
        errors: Vec<ValidationError>,
    },
}

impl Outcome {
    /// Whether the session converged.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The validated object, if the session converged.
    #[must_use]
    pub const fn value(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Success(value) => Some(value),
            Self::Exhausted { .. } => None,
        }
    }

    /// Converts into the validated object or an `Exhausted` error.
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::Exhausted` with the final attempt's errors.
    pub fn into_result(self) -> Result<Map<String, Value>, ExtractionError> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Exhausted { attempts, errors } => {
                Err(ExtractionError::Exhausted { attempts, errors })
            }
        }
    }
}

/// Drives bounded extraction sessions for one schema.
///
/// Each call to [`extract`](Self::extract) owns a fresh [`Session`]. Attempts
/// within a session are strictly sequential; only field checks inside an
/// attempt run concurrently. Separate sessions share nothing but the model
/// gateway, whose permit pool caps in-flight calls.
#[derive(Debug, Clone)]
pub struct RetryController {
    schema: Arc<Schema>,
    config: ExtractionConfig,
    gateway: ModelGateway,
    prompts: PromptBuilder,
    parser: OutputParser,
    validator: Validator,
}

impl RetryController {
    /// Creates a controller with the default configuration.
    #[must_use]
    pub fn new(schema: Schema, client: Arc<dyn ModelClient>) -> Self {
        Self::with_config(schema, client, ExtractionConfig::default())
    }

    /// Creates a controller with the given configuration.
    #[must_use]
    pub fn with_config(
        schema: Schema,
        client: Arc<dyn ModelClient>,
        config: ExtractionConfig,
    ) -> Self {
        let gateway = ModelGateway::new(client, config.max_concurrent_calls, config.call_timeout);
        let prompts = PromptBuilder::new(config.fence_tag.clone())
            .with_fields_in_repair(config.include_fields_in_repair);
        let parser = OutputParser::new(config.fence_tag.clone());
        let validator = Validator::new(
            gateway.clone(),
            prompts.clone(),
            parser.clone(),
            config.model_id.clone(),
        );
        Self {
            schema: Arc::new(schema),
            config,
            gateway,
            prompts,
            parser,
            validator,
        }
    }

    /// Sets the maximum number of attempts (fluent builder pattern).
    #[must_use]
    pub const fn max_retries(mut self, max: usize) -> Self {
        self.config.max_retries = max;
        self
    }

    /// The schema this controller extracts.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Runs one extraction session over `document`.
    ///
    /// Returns `Outcome::Success` as soon as an attempt passes every
    /// validator, or `Outcome::Exhausted` after `max_retries` failed attempts.
    /// Parse failures count as failed attempts. Dropping the returned future
    /// cancels the in-flight model call.
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::InvalidConfig` before any call if the
    /// configuration is unusable, and `ExtractionError::Model` as soon as any
    /// model call fails; model failures are never retried.
    pub async fn extract(
        &self,
        document: &str,
    ) -> Result<(Outcome, ExtractionMetrics), ExtractionError> {
        self.config.validate()?;
        let session = Session::new(self.config.max_retries);
        let span = tracing::info_span!(
            "extraction",
            session = %session.id(),
            max_retries = self.config.max_retries
        );
        self.run(session, document).instrument(span).await
    }

    /// Runs a session and deserializes the validated object into `T`.
    ///
    /// # Errors
    ///
    /// As [`extract`](Self::extract), plus `ExtractionError::Exhausted` when the
    /// session does not converge and `ExtractionError::Deserialize` when the
    /// validated object does not fit `T`.
    pub async fn extract_typed<T: DeserializeOwned>(
        &self,
        document: &str,
    ) -> Result<(T, ExtractionMetrics), ExtractionError> {
        let (outcome, metrics) = self.extract(document).await?;
        let value = outcome.into_result()?;
        let typed = serde_json::from_value(Value::Object(value))
            .map_err(ExtractionError::Deserialize)?;
        Ok((typed, metrics))
    }

    /// Runs independent sessions for several documents concurrently.
    ///
    /// Results keep the input order. All model calls still go through the
    /// shared permit pool, so upstream load stays bounded by
    /// `max_concurrent_calls`.
    pub async fn extract_all<'a, I>(
        &self,
        documents: I,
    ) -> Vec<Result<(Outcome, ExtractionMetrics), ExtractionError>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        join_all(documents.into_iter().map(|doc| self.extract(doc))).await
    }

    async fn run(
        &self,
        mut session: Session,
        document: &str,
    ) -> Result<(Outcome, ExtractionMetrics), ExtractionError> {
        let start = Instant::now();
        let mut metrics = ExtractionMetrics::default();
        let max = self.config.max_retries;

        loop {
            let number = session.len() + 1;
            let prompt = match session.last() {
                None => self.prompts.build_extract_prompt(&self.schema, document),
                Some(prior) => self.prompts.build_repair_prompt(
                    &self.schema,
                    document,
                    prior.prior_output(),
                    &prior.errors,
                    prior.number,
                    max,
                ),
            };

            let raw_output = self.gateway.send(&prompt, &self.config.model_id).await?;
            metrics.record_call(&prompt, &raw_output);

            let parsed = self.parser.parse_object(&raw_output);
            let errors = match &parsed {
                Ok(value) => self.validator.validate(&self.schema, value).await?,
                Err(e) => vec![ValidationError::unparsable(e)],
            };

            if errors.is_empty() {
                if let Ok(value) = parsed {
                    metrics.wall_time = start.elapsed();
                    tracing::info!(
                        event = "extraction_succeeded",
                        attempt = number,
                        "extraction_succeeded"
                    );
                    return Ok((Outcome::Success(value), metrics));
                }
            }

            tracing::info!(
                event = "attempt_failed",
                attempt = number,
                errors = errors.len(),
                parsed = parsed.is_ok(),
                "attempt_failed"
            );

            session.record(Attempt {
                number,
                prompt,
                raw_output,
                parsed,
                errors,
                elapsed: start.elapsed(),
            });

            if session.is_exhausted() {
                metrics.wall_time = start.elapsed();
                let errors = session
                    .last()
                    .map(|attempt| attempt.errors.clone())
                    .unwrap_or_default();
                tracing::warn!(
                    event = "extraction_exhausted",
                    attempts = session.len(),
                    errors = errors.len(),
                    "extraction_exhausted"
                );
                return Ok((
                    Outcome::Exhausted {
                        attempts: session.len(),
                        errors,
                    },
                    metrics,
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ModelError;
    use crate::schema::{FieldSpec, StructuralCheck};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct Replay {
        replies: Mutex<VecDeque<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Replay {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().map(|r| (*r).to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ModelClient for Replay {
        async fn send(&self, prompt: &str, _model_id: &str) -> Result<String, ModelError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ModelError::Unavailable("script exhausted".to_string()))
        }
    }

    fn schema() -> Schema {
        Schema::new(vec![FieldSpec::new("n", "A number").structural(
            StructuralCheck::from_fn(|v| {
                if v.as_i64() == Some(2) {
                    Vec::new()
                } else {
                    vec![format!("expected 2, found {v}")]
                }
            }),
        )])
        .unwrap()
    }

    #[tokio::test]
    async fn test_repair_uses_most_recent_attempt() {
        let client = Replay::new(&[
            "```json\n{\"n\": 0}\n```",
            "```json\n{\"n\": 1}\n```",
            "```json\n{\"n\": 2}\n```",
        ]);
        let controller = RetryController::new(schema(), client.clone());

        let (outcome, metrics) = controller.extract("doc").await.unwrap();

        assert_eq!(outcome.value().unwrap()["n"], 2);
        assert_eq!(metrics.total_attempts, 3);
        let prompts = client.prompts.lock().unwrap();
        assert!(prompts[1].contains("expected 2, found 0"));
        assert!(prompts[2].contains("expected 2, found 1"));
        assert!(!prompts[2].contains("expected 2, found 0"));
        assert!(prompts[2].contains("Attempt 2/3"));
    }

    #[tokio::test]
    async fn test_unparsable_prior_is_echoed_raw() {
        let client = Replay::new(&["I could not find anything.", "```json\n{\"n\": 2}\n```"]);
        let controller = RetryController::new(schema(), client.clone());

        let (outcome, _) = controller.extract("doc").await.unwrap();

        assert!(outcome.is_success());
        let prompts = client.prompts.lock().unwrap();
        assert!(prompts[1].contains("I could not find anything."));
        assert!(prompts[1].contains("- _document: no valid structured block found"));
    }

    #[tokio::test]
    async fn test_zero_retries_is_rejected_before_calling() {
        let client = Replay::new(&[]);
        let controller = RetryController::new(schema(), client.clone()).max_retries(0);

        let err = controller.extract("doc").await.unwrap_err();

        assert!(matches!(err, ExtractionError::InvalidConfig(_)));
        assert!(client.prompts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_outcome_into_result() {
        let exhausted = Outcome::Exhausted {
            attempts: 3,
            errors: vec![ValidationError::new("n", "bad")],
        };
        assert!(!exhausted.is_success());
        assert!(exhausted.value().is_none());
        let err = exhausted.into_result().unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::Exhausted { attempts: 3, ref errors } if errors.len() == 1
        ));
    }
}
