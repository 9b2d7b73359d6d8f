//! Per-field validation with error aggregation.

use futures::future::try_join_all;
use serde_json::{Map, Value};

use crate::client::{ModelError, ModelGateway};
use crate::error::ValidationError;
use crate::parser::OutputParser;
use crate::prompt::PromptBuilder;
use crate::schema::{FieldSpec, FieldValidator, Schema, SemanticCheck};

/// Message recorded for a blank entry in a verification verdict.
pub const UNSPECIFIED_VIOLATION: &str = "unspecified violation";

/// Runs every field's validator and collects every failure.
///
/// Structural checks are pure. Semantic checks call the model through the
/// shared [`ModelGateway`], so they are subject to its concurrency limit.
#[derive(Debug, Clone)]
pub struct Validator {
    gateway: ModelGateway,
    prompts: PromptBuilder,
    parser: OutputParser,
    default_model: String,
}

impl Validator {
    /// Creates a validator whose semantic checks default to `default_model`.
    pub fn new(
        gateway: ModelGateway,
        prompts: PromptBuilder,
        parser: OutputParser,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            prompts,
            parser,
            default_model: default_model.into(),
        }
    }

    /// Validates `value` against every field of `schema` that has a validator.
    ///
    /// Fields are checked concurrently and all results are joined before
    /// returning. Errors are ordered by field declaration order. A field with a
    /// validator but no value yields a `missing` error.
    ///
    /// # Errors
    ///
    /// Returns the [`ModelError`] of the first semantic check whose model call
    /// failed; the remaining checks are dropped with it.
    pub async fn validate(
        &self,
        schema: &Schema,
        value: &Map<String, Value>,
    ) -> Result<Vec<ValidationError>, ModelError> {
        let checks = schema.iter().filter_map(|field| {
            field
                .validator()
                .map(|validator| self.validate_field(field, validator, value.get(field.name())))
        });

        let per_field = try_join_all(checks).await?;
        Ok(per_field.into_iter().flatten().collect())
    }

    async fn validate_field(
        &self,
        field: &FieldSpec,
        validator: &FieldValidator,
        value: Option<&Value>,
    ) -> Result<Vec<ValidationError>, ModelError> {
        let Some(value) = value else {
            return Ok(vec![ValidationError::missing(field.name())]);
        };

        let messages = match validator {
            FieldValidator::Structural(check) => check.check(value),
            FieldValidator::Semantic(check) => self.verify(field.name(), value, check).await?,
        };

        Ok(messages
            .into_iter()
            .map(|message| ValidationError::new(field.name(), message))
            .collect())
    }

    /// Asks the model to list violations of `check`'s criteria.
    ///
    /// Every entry of a non-empty verdict is a violation, blank ones included.
    /// An unreadable reply counts as a violation of the field, not a fault.
    async fn verify(
        &self,
        field: &str,
        value: &Value,
        check: &SemanticCheck,
    ) -> Result<Vec<String>, ModelError> {
        let prompt = self
            .prompts
            .build_verification_prompt(field, value, &check.criteria);
        let model = check.model_id.as_deref().unwrap_or(&self.default_model);
        let reply = self.gateway.send(&prompt, model).await?;

        match self.parser.parse_string_list(&reply) {
            Ok(violations) => {
                tracing::debug!(
                    event = "semantic_check",
                    field,
                    violations = violations.len(),
                    "semantic_check"
                );
                Ok(violations
                    .into_iter()
                    .map(|v| {
                        if v.trim().is_empty() {
                            UNSPECIFIED_VIOLATION.to_string()
                        } else {
                            v
                        }
                    })
                    .collect())
            }
            Err(e) => {
                tracing::warn!(
                    event = "semantic_reply_unreadable",
                    field,
                    error = %e,
                    "semantic_reply_unreadable"
                );
                Ok(vec![format!("verification reply was unreadable: {e}")])
            }
        }
    }
}
