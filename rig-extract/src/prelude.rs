//! Common imports for rig-extract usage.
//!
//! ```
//! use rig_extract::prelude::*;
//! ```
//!
//! Re-exports the schema, controller and client types needed for a typical
//! extraction, plus the Rig client trait so users don't need a separate import.

// Error type (always available)
pub use crate::errors::Error;

// Core extraction types
pub use rig_extract_core::prelude::*;

// Rig-backed client
pub use rig_extract_provider::{RigClientConfig, RigModelClient};

// Re-export the Rig trait provider clients implement
pub use rig::client::CompletionClient;
