//! Schema-driven structured extraction with validation feedback.
//!
//! This crate implements a bounded extract → parse → validate → repair loop
//! over any generative text model:
//!
//! - [`Schema`] / [`FieldSpec`] - Ordered field declarations with optional validators
//! - [`PromptBuilder`] - Extraction, repair and verification prompts
//! - [`OutputParser`] - Fenced-block location and JSON decoding
//! - [`Validator`] - Structural and model-backed semantic checks, all errors aggregated
//! - [`RetryController`] - The session loop producing an [`Outcome`]
//! - [`ModelClient`] - The seam to the model provider
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use rig_extract_core::prelude::*;
//! # async fn example(client: Arc<dyn ModelClient>) -> Result<(), Box<dyn std::error::Error>> {
//! let schema = Schema::builder()
//!     .field(FieldSpec::new("title", "The talk's title"))
//!     .field(
//!         FieldSpec::new("links", "Links mentioned in the talk")
//!             .structural(StructuralCheck::records_with_keys(&["url", "description"])),
//!     )
//!     .build()?;
//!
//! let controller = RetryController::new(schema, client);
//! let (outcome, metrics) = controller.extract("...document text...").await?;
//! if let Outcome::Success(fields) = outcome {
//!     println!("{} fields in {} attempts", fields.len(), metrics.total_attempts);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod metrics;
pub mod parser;
pub mod prompt;
pub mod schema;
pub mod session;
pub mod validator;

pub use client::{ModelClient, ModelError, ModelGateway};
pub use config::ExtractionConfig;
pub use controller::{Outcome, RetryController};
pub use error::{ExtractionError, ParseError, SchemaError, ValidationError, DOCUMENT_FIELD};
pub use metrics::{estimate_tokens, ExtractionMetrics};
pub use parser::OutputParser;
pub use prompt::{PriorOutput, PromptBuilder};
pub use schema::{FieldSpec, FieldValidator, Schema, SchemaBuilder, SemanticCheck, StructuralCheck};
pub use session::{Attempt, Session};
pub use validator::{Validator, UNSPECIFIED_VIOLATION};

/// Common types for building schemas and running extractions.
pub mod prelude {
    pub use crate::client::{ModelClient, ModelError};
    pub use crate::config::ExtractionConfig;
    pub use crate::controller::{Outcome, RetryController};
    pub use crate::error::{ExtractionError, ValidationError};
    pub use crate::metrics::ExtractionMetrics;
    pub use crate::schema::{FieldSpec, Schema, SemanticCheck, StructuralCheck};
}
