//! Public error types for rig-extract.

use thiserror::Error;

/// Errors that can occur when building or running extractions.
///
/// Wraps the errors of the underlying crates, preserving the full chain.
#[derive(Debug, Error)]
pub enum Error {
    /// A schema or field check could not be built.
    #[error("Schema error: {0}")]
    Schema(#[from] rig_extract_core::SchemaError),

    /// The extraction session failed (model failure, exhaustion, bad config).
    #[error("{0}")]
    Extraction(#[from] rig_extract_core::ExtractionError),

    /// The Rig-backed client could not be configured.
    #[error("{0}")]
    Provider(#[from] rig_extract_provider::ProviderError),
}
