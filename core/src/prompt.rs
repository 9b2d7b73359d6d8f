//! Prompt rendering for extraction, repair and semantic verification.

use std::fmt::Write as _;

use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::schema::Schema;

/// How much of an unparsable reply is echoed back in a repair prompt.
pub const RAW_ECHO_LIMIT: usize = 500;

/// What the previous attempt produced, as shown to the model when repairing.
#[derive(Debug, Clone, Copy)]
pub enum PriorOutput<'a> {
    /// The reply decoded to an object.
    Parsed(&'a Map<String, Value>),
    /// The reply could not be parsed; only its raw text is available.
    Unparsed(&'a str),
}

/// Renders the prompts sent to the model.
///
/// All prompts are deterministic functions of their inputs and all of them
/// ask for exactly one fenced block tagged with [`fence_tag`](Self::fence_tag)
/// at the end of the reply, which is what [`OutputParser`](crate::OutputParser)
/// looks for.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    fence_tag: String,
    include_fields_in_repair: bool,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new("json")
    }
}

impl PromptBuilder {
    /// Creates a builder emitting ```` ```{fence_tag} ```` instructions.
    pub fn new(fence_tag: impl Into<String>) -> Self {
        Self {
            fence_tag: fence_tag.into(),
            include_fields_in_repair: true,
        }
    }

    /// Sets whether repair prompts repeat the field list.
    #[must_use]
    pub const fn with_fields_in_repair(mut self, include: bool) -> Self {
        self.include_fields_in_repair = include;
        self
    }

    /// The fence tag requested from the model.
    #[must_use]
    pub fn fence_tag(&self) -> &str {
        &self.fence_tag
    }

    /// Builds the first-attempt prompt for `document`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rig_extract_core::{FieldSpec, PromptBuilder, Schema};
    ///
    /// let schema = Schema::new(vec![FieldSpec::new("title", "The talk's title")]).unwrap();
    /// let prompt = PromptBuilder::default().build_extract_prompt(&schema, "Rust at scale");
    /// assert!(prompt.contains("Rust at scale"));
    /// assert!(prompt.contains("`title`: The talk's title"));
    /// ```
    #[must_use]
    pub fn build_extract_prompt(&self, schema: &Schema, document: &str) -> String {
        let mut prompt = String::from(
            "You are an expert information extractor. Read the document below and \
             extract the requested fields.\n\n",
        );
        push_document(&mut prompt, document);
        push_fields(&mut prompt, schema);
        prompt.push_str("# Output\n\n");
        let _ = write!(
            prompt,
            "Reply with exactly one ```{tag} block containing a single JSON object \
             with one key per field listed above. The block must be the last thing \
             in your reply.",
            tag = self.fence_tag
        );
        prompt
    }

    /// Builds a repair prompt from the most recent attempt.
    ///
    /// Only meaningful when `errors` is non-empty; the retry loop never calls
    /// it otherwise.
    ///
    /// Includes:
    /// - Attempt counter (e.g., "Attempt 2/3")
    /// - The document and, optionally, the field list
    /// - The previous extraction verbatim, or the raw reply if it did not parse
    /// - Every error as its own `- field: message` line
    /// - An instruction to re-emit the complete corrected object
    #[must_use]
    pub fn build_repair_prompt(
        &self,
        schema: &Schema,
        document: &str,
        prior: PriorOutput<'_>,
        errors: &[ValidationError],
        attempt: usize,
        max_attempts: usize,
    ) -> String {
        debug_assert!(!errors.is_empty(), "repair prompt requires errors");

        let mut prompt = format!(
            "Attempt {attempt}/{max_attempts}: the previous extraction from the document \
             below failed validation. You are an expert information extractor; correct it.\n\n"
        );
        push_document(&mut prompt, document);
        if self.include_fields_in_repair {
            push_fields(&mut prompt, schema);
        }

        match prior {
            PriorOutput::Parsed(value) => {
                prompt.push_str("# Previous extraction\n\n");
                let rendered = serde_json::to_string_pretty(value)
                    .unwrap_or_else(|_| Value::Object(value.clone()).to_string());
                let _ = write!(prompt, "```{}\n{rendered}\n```\n\n", self.fence_tag);
            }
            PriorOutput::Unparsed(raw) => {
                let _ = write!(
                    prompt,
                    "# Previous reply (first {RAW_ECHO_LIMIT} chars)\n\n{}\n\n",
                    truncate_chars(raw, RAW_ECHO_LIMIT)
                );
            }
        }

        prompt.push_str("# Errors\n\n");
        for error in errors {
            let _ = writeln!(prompt, "- {}: {}", error.field, error.message);
        }

        prompt.push_str("\n# Corrected extraction\n\n");
        let _ = write!(
            prompt,
            "Fix all errors above and reply with the complete corrected JSON object, \
             every field included, not only the changed ones. Put it in exactly one \
             ```{tag} block at the end of your reply.",
            tag = self.fence_tag
        );
        prompt
    }

    /// Builds the prompt asking the model to judge `value` against `criteria`.
    #[must_use]
    pub fn build_verification_prompt(
        &self,
        field: &str,
        value: &Value,
        criteria: &[String],
    ) -> String {
        let tag = &self.fence_tag;
        let rendered = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());

        let mut prompt = format!(
            "Check the values of the field `{field}` against every criterion below.\n\n\
             # Values\n\n```{tag}\n{rendered}\n```\n\n# Criteria\n\n"
        );
        for criterion in criteria {
            let _ = writeln!(prompt, "- {criterion}");
        }
        let _ = write!(
            prompt,
            "\n# Errors\n\n\
             List every violation as one string in a single ```{tag} array, for example:\n\n\
             ```{tag}\n[\"not in English: Programación en Python\"]\n```\n\n\
             If every value satisfies every criterion, reply with an empty array \
             in the block: ```{tag}\n[]\n```"
        );
        prompt
    }
}

fn push_document(prompt: &mut String, document: &str) {
    let _ = write!(prompt, "# Document\n\n{}\n\n", document.trim_end());
}

fn push_fields(prompt: &mut String, schema: &Schema) {
    prompt.push_str("# Fields\n\n");
    for field in schema {
        let _ = writeln!(prompt, "- `{}`: {}", field.name(), field.description());
    }
    prompt.push('\n');
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new(vec![
            FieldSpec::new("title", "The talk's title"),
            FieldSpec::new("links", "Links mentioned in the talk"),
            FieldSpec::new("technologies", "Technologies mentioned in the talk"),
        ])
        .unwrap()
    }

    #[test]
    fn test_extract_prompt_is_deterministic_and_complete() {
        let builder = PromptBuilder::default();
        let first = builder.build_extract_prompt(&schema(), "A talk about RAG.");
        let second = builder.build_extract_prompt(&schema(), "A talk about RAG.");

        assert_eq!(first, second);
        assert!(first.contains("A talk about RAG."));
        assert!(first.contains("- `title`: The talk's title"));
        assert!(first.contains("- `technologies`: Technologies mentioned in the talk"));
        assert!(first.contains("exactly one ```json block"));
        let title = first.find("`title`").unwrap();
        let links = first.find("`links`").unwrap();
        assert!(title < links);
    }

    #[test]
    fn test_repair_prompt_lists_every_error() {
        let prior = json!({"title": "T", "links": [{"url": "http://x"}]});
        let errors = vec![
            ValidationError::new("links", "missing description"),
            ValidationError::new("technologies", "not in English"),
        ];

        let prompt = PromptBuilder::default().build_repair_prompt(
            &schema(),
            "doc",
            PriorOutput::Parsed(prior.as_object().unwrap()),
            &errors,
            1,
            3,
        );

        assert!(prompt.contains("Attempt 1/3"));
        assert!(prompt.contains("- links: missing description\n"));
        assert!(prompt.contains("- technologies: not in English\n"));
        assert!(prompt.contains("\"url\": \"http://x\""));
        assert!(prompt.contains("complete corrected JSON object"));
        assert!(prompt.contains("# Fields"));
    }

    #[test]
    fn test_repair_prompt_can_omit_fields() {
        let prompt = PromptBuilder::default()
            .with_fields_in_repair(false)
            .build_repair_prompt(
                &schema(),
                "doc",
                PriorOutput::Unparsed("oops"),
                &[ValidationError::new("_document", "no block")],
                2,
                3,
            );
        assert!(!prompt.contains("# Fields"));
        assert!(prompt.contains("# Previous reply"));
        assert!(prompt.contains("oops"));
    }

    #[test]
    fn test_unparsed_prior_is_truncated_on_char_boundary() {
        let raw = "é".repeat(1000);
        let prompt = PromptBuilder::default().build_repair_prompt(
            &schema(),
            "doc",
            PriorOutput::Unparsed(&raw),
            &[ValidationError::new("_document", "no block")],
            1,
            3,
        );

        let echoed = prompt
            .split("chars)\n\n")
            .nth(1)
            .unwrap()
            .split("\n\n# Errors")
            .next()
            .unwrap();
        assert_eq!(echoed, format!("{}...", "é".repeat(RAW_ECHO_LIMIT)));
    }

    #[test]
    fn test_verification_prompt() {
        let prompt = PromptBuilder::default().build_verification_prompt(
            "technologies",
            &json!(["RAG", "Programación"]),
            &["Abbreviations are expanded".to_string(), "Written in English".to_string()],
        );

        assert!(prompt.contains("`technologies`"));
        assert!(prompt.contains("\"Programación\""));
        assert!(prompt.contains("- Abbreviations are expanded\n"));
        assert!(prompt.contains("- Written in English\n"));
        assert!(prompt.contains("empty array"));
    }

    #[test]
    fn test_custom_fence_tag_is_requested() {
        let prompt = PromptBuilder::new("result").build_extract_prompt(&schema(), "doc");
        assert!(prompt.contains("```result block"));
    }
}
