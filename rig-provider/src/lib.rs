#![deny(missing_docs)]
//! Rig-backed [`ModelClient`](rig_extract_core::ModelClient) for the extraction loop.
//!
//! Any Rig provider client (OpenAI, Anthropic, a CLI-backed provider, ...) can
//! drive extraction sessions by wrapping it in [`RigModelClient`].

/// The `ModelClient` implementation over Rig completion clients.
pub mod client;
/// Error types for the provider.
pub mod errors;

pub use client::{RigClientConfig, RigModelClient};
pub use errors::ProviderError;
