//! Error types for schema construction, output parsing, validation and the retry loop.

use std::fmt;

use thiserror::Error;

use crate::client::ModelError;

/// Field name used for failures that concern the whole reply rather than one field.
pub const DOCUMENT_FIELD: &str = "_document";

/// Errors raised while building a [`Schema`](crate::Schema) or its checks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Two fields were declared with the same name.
    #[error("Duplicate field name: {0}")]
    DuplicateField(String),

    /// A field was declared with a blank name.
    #[error("Field names must not be empty")]
    EmptyFieldName,

    /// A JSON Schema used as a structural check failed to compile.
    #[error("Invalid JSON schema: {0}")]
    InvalidJsonSchema(String),
}

/// Failure to recover a structured block from raw model text.
///
/// Recoverable: the retry loop turns it into a synthetic [`ValidationError`]
/// and issues a repair prompt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No complete fenced block with the expected tag was found.
    #[error("no ```{tag} block found")]
    MissingBlock {
        /// The fence tag that was searched for.
        tag: String,
    },

    /// The block was found but its content is not valid JSON.
    #[error("block content is not valid JSON: {0}")]
    Decode(String),

    /// The block decoded but has the wrong JSON shape.
    #[error("expected {expected} but found {found}")]
    UnexpectedShape {
        /// Shape the caller asked for.
        expected: &'static str,
        /// Shape that was actually decoded.
        found: &'static str,
    },
}

/// One failed check on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Name of the offending field, or [`DOCUMENT_FIELD`] for parse failures.
    pub field: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl ValidationError {
    /// Creates a validation error for `field`.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Error recorded when the field is absent from the parsed object.
    #[must_use]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, "missing")
    }

    /// Synthetic error standing in for a reply that could not be parsed.
    #[must_use]
    pub fn unparsable(err: &ParseError) -> Self {
        Self::new(
            DOCUMENT_FIELD,
            format!("no valid structured block found: {err}"),
        )
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Errors returned to callers of the retry loop.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The model call itself failed. Never retried; aborts the session.
    #[error("Model call failed: {0}")]
    Model(#[from] ModelError),

    /// The configuration cannot drive a session.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The loop ran out of attempts (typed entry points only).
    #[error("Extraction failed to converge after {attempts} attempts")]
    Exhausted {
        /// Number of attempts made.
        attempts: usize,
        /// Errors from the final attempt.
        errors: Vec<ValidationError>,
    },

    /// A validated result did not deserialize into the requested type.
    #[error("Deserialization to target type failed: {0}")]
    Deserialize(#[source] serde_json::Error),
}
