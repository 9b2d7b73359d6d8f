//! # rig-extract
//!
//! Validated structured extraction from unstructured documents with any Rig model.
//!
//! Declare the fields you want, attach structural or semantic checks, and let
//! the retry loop prompt the model, parse its fenced JSON block, validate every
//! field and feed the errors back until the result passes or the attempt
//! budget runs out.
//!
//! ## Example
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use rig_extract::prelude::*;
//! # async fn example<C>(rig_client: C, document: &str) -> Result<(), rig_extract::Error>
//! # where
//! #     C: rig::client::CompletionClient + Send + Sync + 'static,
//! # {
//! let client = Arc::new(RigModelClient::new(rig_client));
//! let controller = rig_extract::talks::talk_controller(client, ExtractionConfig::default())?;
//!
//! let (talk, metrics) = rig_extract::talks::extract_talk(&controller, document).await?;
//! println!("{} by {} ({} attempts)", talk.title, talk.speaker, metrics.total_attempts);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

/// Public error types.
pub mod errors;

/// Commonly used types and traits.
pub mod prelude;

/// Conference-talk extraction preset.
pub mod talks;

pub use errors::Error;
pub use rig_extract_core as core;
pub use rig_extract_provider as provider;
