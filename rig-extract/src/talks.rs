//! Extraction preset for conference talk listings.
//!
//! Pulls the title, speaker, mentioned links and mentioned technologies out of
//! a talk page or calendar entry. Links are checked structurally; the
//! technology list is judged by the model against naming criteria.

use std::sync::Arc;

use rig_extract_core::{
    ExtractionConfig, ExtractionMetrics, FieldSpec, ModelClient, RetryController, Schema,
    SchemaError, SemanticCheck, StructuralCheck,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Criteria every entry of the `technologies` field must meet.
pub const TECHNOLOGY_CRITERIA: [&str; 2] = [
    "Abbreviations are expanded in parentheses, for example: \
     `IPv6 (Internet Protocol Version 6)`",
    "Entries are written in English",
];

/// A link mentioned in a talk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Link {
    /// Target URL.
    pub url: String,
    /// What the link points to.
    pub description: String,
}

/// A validated talk extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Talk {
    /// The talk's title.
    pub title: String,
    /// The speaker's name.
    pub speaker: String,
    /// Links mentioned in the talk.
    pub links: Vec<Link>,
    /// Technologies mentioned in the talk.
    pub technologies: Vec<String>,
}

/// Every link must be a record with a non-empty `url` and `description`.
#[must_use]
pub fn links_check() -> StructuralCheck {
    StructuralCheck::records_with_keys(&["url", "description"])
}

/// Technologies must be in English with abbreviations expanded.
#[must_use]
pub fn technologies_check() -> SemanticCheck {
    SemanticCheck::new(TECHNOLOGY_CRITERIA)
}

/// The four-field talk schema.
///
/// # Errors
///
/// Never fails for the built-in field set; the `Result` mirrors [`Schema::new`].
pub fn talk_schema() -> Result<Schema, SchemaError> {
    Schema::builder()
        .field(FieldSpec::new("title", "The title of the talk"))
        .field(FieldSpec::new("speaker", "The name of the speaker"))
        .field(FieldSpec::new("links", "The links mentioned in the talk").structural(links_check()))
        .field(
            FieldSpec::new("technologies", "The technologies mentioned in the talk")
                .semantic(technologies_check()),
        )
        .build()
}

/// Builds a controller for the talk schema.
///
/// # Errors
///
/// Returns `Error::Schema` if the schema cannot be built and
/// `Error::Extraction` for an unusable configuration.
pub fn talk_controller(
    client: Arc<dyn ModelClient>,
    config: ExtractionConfig,
) -> Result<RetryController, Error> {
    config.validate()?;
    Ok(RetryController::with_config(talk_schema()?, client, config))
}

/// Extracts one talk and deserializes it into [`Talk`].
///
/// # Errors
///
/// Returns `Error::Extraction` when the session fails, exhausts its attempts,
/// or produces an object that does not fit [`Talk`].
pub async fn extract_talk(
    controller: &RetryController,
    document: &str,
) -> Result<(Talk, ExtractionMetrics), Error> {
    let (talk, metrics) = controller.extract_typed::<Talk>(document).await?;
    tracing::info!(
        event = "talk_extracted",
        links = talk.links.len(),
        technologies = talk.technologies.len(),
        attempts = metrics.total_attempts,
        "talk_extracted"
    );
    Ok((talk, metrics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rig_extract_core::FieldValidator;
    use serde_json::json;

    #[test]
    fn test_talk_schema_fields() {
        let schema = talk_schema().unwrap();
        assert_eq!(
            schema.names().collect::<Vec<_>>(),
            ["title", "speaker", "links", "technologies"]
        );
        assert!(schema.get("title").unwrap().validator().is_none());
        assert!(matches!(
            schema.get("links").unwrap().validator(),
            Some(FieldValidator::Structural(_))
        ));
        assert!(schema
            .get("technologies")
            .unwrap()
            .validator()
            .is_some_and(FieldValidator::requires_model));
    }

    #[test]
    fn test_links_check_messages() {
        let violations = links_check().check(&json!([{"url": "http://x"}]));
        assert_eq!(violations.len(), 1);
        assert!(violations[0].starts_with("missing description"));

        let violations = links_check().check(&json!([{"description": "Slides"}]));
        assert!(violations[0].starts_with("missing url"));
    }

    #[test]
    fn test_technologies_criteria() {
        let check = technologies_check();
        assert_eq!(check.criteria.len(), 2);
        assert!(check.criteria[0].contains("IPv6 (Internet Protocol Version 6)"));
        assert!(check.model_id.is_none());
    }

    #[test]
    fn test_talk_deserializes() {
        let talk: Talk = serde_json::from_value(json!({
            "title": "T",
            "speaker": "S",
            "links": [{"url": "u", "description": "d"}],
            "technologies": ["RAG (Retrieval Augmented Generation)"]
        }))
        .unwrap();
        assert_eq!(talk.links[0].url, "u");
    }

    #[test]
    fn test_derived_link_schema_agrees_with_links_check() {
        let derived = StructuralCheck::schema_for::<Vec<Link>>().unwrap();
        let good = json!([{"url": "u", "description": "d"}]);
        let bad = json!([{"url": "u"}]);

        assert!(derived.check(&good).is_empty());
        assert!(links_check().check(&good).is_empty());
        assert!(!derived.check(&bad).is_empty());
        assert!(!links_check().check(&bad).is_empty());
    }
}
