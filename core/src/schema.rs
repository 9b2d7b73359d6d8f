//! Field declarations: what to extract and how each field is checked.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use schemars::JsonSchema;
use serde_json::Value;

use crate::error::SchemaError;

/// Boxed structural check: returns every violation message for a value.
pub type CheckFn = Arc<dyn Fn(&Value) -> Vec<String> + Send + Sync>;

#[derive(Clone)]
enum StructuralKind {
    Function(CheckFn),
    JsonSchema(Arc<jsonschema::Validator>),
}

/// A pure, deterministic check over one field's parsed value.
#[derive(Clone)]
pub struct StructuralCheck {
    kind: StructuralKind,
}

impl StructuralCheck {
    /// Wraps a closure returning the complete list of violations (empty when valid).
    pub fn from_fn<F>(check: F) -> Self
    where
        F: Fn(&Value) -> Vec<String> + Send + Sync + 'static,
    {
        Self {
            kind: StructuralKind::Function(Arc::new(check)),
        }
    }

    /// Compiles a JSON Schema document into a check.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::InvalidJsonSchema` if the schema does not compile.
    pub fn json_schema(schema: &Value) -> Result<Self, SchemaError> {
        let validator = jsonschema::Validator::new(schema)
            .map_err(|e| SchemaError::InvalidJsonSchema(e.to_string()))?;
        Ok(Self {
            kind: StructuralKind::JsonSchema(Arc::new(validator)),
        })
    }

    /// Builds a check from the JSON Schema derived for `T`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::InvalidJsonSchema` if the derived schema does not compile.
    pub fn schema_for<T: JsonSchema>() -> Result<Self, SchemaError> {
        let schema = serde_json::to_value(schemars::schema_for!(T))
            .map_err(|e| SchemaError::InvalidJsonSchema(e.to_string()))?;
        Self::json_schema(&schema)
    }

    /// Requires a list whose every element is a record with a non-empty
    /// string under each of `keys`.
    ///
    /// ```
    /// use rig_extract_core::StructuralCheck;
    /// use serde_json::json;
    ///
    /// let check = StructuralCheck::records_with_keys(&["url", "description"]);
    /// assert!(check.check(&json!([{"url": "u", "description": "d"}])).is_empty());
    /// assert_eq!(check.check(&json!([{"url": "u"}])).len(), 1);
    /// ```
    #[must_use]
    pub fn records_with_keys(keys: &[&str]) -> Self {
        let keys: Vec<String> = keys.iter().map(|k| (*k).to_string()).collect();
        Self::from_fn(move |value| {
            let Some(items) = value.as_array() else {
                return vec![format!("expected a list of records, found {}", kind_of(value))];
            };
            let mut violations = Vec::new();
            for item in items {
                let Some(record) = item.as_object() else {
                    violations.push(format!(
                        "entry must be a record with keys {} but found {item}",
                        keys.join(", ")
                    ));
                    continue;
                };
                for key in &keys {
                    let present = record
                        .get(key)
                        .and_then(Value::as_str)
                        .is_some_and(|s| !s.trim().is_empty());
                    if !present {
                        violations.push(format!("missing {key} in {item}"));
                    }
                }
            }
            violations
        })
    }

    /// Runs the check and returns every violation message.
    #[must_use]
    pub fn check(&self, value: &Value) -> Vec<String> {
        match &self.kind {
            StructuralKind::Function(check) => check(value),
            StructuralKind::JsonSchema(validator) => validator
                .iter_errors(value)
                .map(|error| {
                    let path = error.instance_path.to_string();
                    if path.is_empty() {
                        error.to_string()
                    } else {
                        format!("at '{path}': {error}")
                    }
                })
                .collect(),
        }
    }
}

impl fmt::Debug for StructuralCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            StructuralKind::Function(_) => "function",
            StructuralKind::JsonSchema(_) => "json_schema",
        };
        f.debug_struct("StructuralCheck").field("kind", &kind).finish()
    }
}

/// A natural-language check judged by a secondary model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticCheck {
    /// Criteria every value of the field must satisfy.
    pub criteria: Vec<String>,
    /// Model used for verification; falls back to the extraction model.
    pub model_id: Option<String>,
}

impl SemanticCheck {
    /// Creates a semantic check from a list of criteria.
    pub fn new<I, S>(criteria: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            criteria: criteria.into_iter().map(Into::into).collect(),
            model_id: None,
        }
    }

    /// Verifies with a different model than the one doing the extraction.
    #[must_use]
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }
}

/// The validation capability attached to a field.
#[derive(Debug, Clone)]
pub enum FieldValidator {
    /// Pure check over the parsed value.
    Structural(StructuralCheck),
    /// Check that needs the model client.
    Semantic(SemanticCheck),
}

impl FieldValidator {
    /// Whether running this validator issues a model call.
    #[must_use]
    pub const fn requires_model(&self) -> bool {
        matches!(self, Self::Semantic(_))
    }
}

/// Declaration of one field to extract.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    description: String,
    validator: Option<FieldValidator>,
}

impl FieldSpec {
    /// Declares a field with no validation.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            validator: None,
        }
    }

    /// Attaches a validator, replacing any previous one.
    #[must_use]
    pub fn with_validator(mut self, validator: FieldValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Attaches a structural check.
    #[must_use]
    pub fn structural(self, check: StructuralCheck) -> Self {
        self.with_validator(FieldValidator::Structural(check))
    }

    /// Attaches a semantic check.
    #[must_use]
    pub fn semantic(self, check: SemanticCheck) -> Self {
        self.with_validator(FieldValidator::Semantic(check))
    }

    /// The field's name (its key in the extracted object).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The human description shown to the model.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The attached validator, if any.
    #[must_use]
    pub const fn validator(&self) -> Option<&FieldValidator> {
        self.validator.as_ref()
    }
}

/// Ordered, immutable set of fields with unique names.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Builds a schema from fields in declaration order.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::DuplicateField` when two fields share a name and
    /// `SchemaError::EmptyFieldName` for a blank name.
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
        let mut seen = HashSet::new();
        for field in &fields {
            if field.name.trim().is_empty() {
                return Err(SchemaError::EmptyFieldName);
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
        }
        Ok(Self { fields })
    }

    /// Starts a fluent schema builder.
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Iterates fields in declared order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter()
    }

    /// Looks a field up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in declared order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema declares no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a FieldSpec;
    type IntoIter = std::slice::Iter<'a, FieldSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Fluent builder for [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<FieldSpec>,
}

impl SchemaBuilder {
    /// Appends a field.
    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Finishes the schema.
    ///
    /// # Errors
    ///
    /// See [`Schema::new`].
    pub fn build(self) -> Result<Schema, SchemaError> {
        Schema::new(self.fields)
    }
}

pub(crate) const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn links() -> StructuralCheck {
        StructuralCheck::records_with_keys(&["url", "description"])
    }

    #[test]
    fn test_schema_preserves_order_and_lookup() {
        let schema = Schema::builder()
            .field(FieldSpec::new("title", "The talk's title"))
            .field(FieldSpec::new("speaker", "The speaker's name"))
            .field(FieldSpec::new("links", "Links").structural(links()))
            .build()
            .unwrap();

        assert_eq!(schema.names().collect::<Vec<_>>(), ["title", "speaker", "links"]);
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.get("speaker").unwrap().description(), "The speaker's name");
        assert!(schema.get("links").unwrap().validator().is_some());
        assert!(schema.get("nope").is_none());
    }

    #[test]
    fn test_schema_rejects_duplicates() {
        let err = Schema::new(vec![FieldSpec::new("a", "x"), FieldSpec::new("a", "y")]).unwrap_err();
        assert_eq!(err, SchemaError::DuplicateField("a".to_string()));
    }

    #[test]
    fn test_schema_rejects_blank_names() {
        let err = Schema::new(vec![FieldSpec::new("  ", "x")]).unwrap_err();
        assert_eq!(err, SchemaError::EmptyFieldName);
    }

    #[test]
    fn test_records_with_keys_reports_every_violation() {
        let value = json!([
            {"url": "http://x"},
            "not a record",
            {"url": "", "description": "d"},
            {"url": "http://y", "description": "ok"}
        ]);
        let violations = links().check(&value);

        assert_eq!(violations.len(), 3);
        assert!(violations[0].starts_with("missing description"));
        assert!(violations[1].contains("must be a record"));
        assert!(violations[2].starts_with("missing url"));
    }

    #[test]
    fn test_records_with_keys_rejects_non_lists() {
        assert_eq!(
            links().check(&Value::Null),
            vec!["expected a list of records, found null".to_string()]
        );
        assert!(links().check(&json!([])).is_empty());
    }

    #[test]
    fn test_json_schema_check_collects_all_errors() {
        let check = StructuralCheck::json_schema(&json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "age": {"type": "integer", "minimum": 0}
            },
            "required": ["name", "age"]
        }))
        .unwrap();

        let errors = check.check(&json!({"age": -5}));
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("name")));
        assert!(errors.iter().any(|e| e.contains("/age")));
        assert!(check.check(&json!({"name": "n", "age": 3})).is_empty());
    }

    #[test]
    fn test_invalid_json_schema_is_rejected() {
        let err = StructuralCheck::json_schema(&json!({"type": 12})).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidJsonSchema(_)));
    }

    #[test]
    fn test_schema_for_derived_type() {
        #[derive(JsonSchema)]
        #[allow(dead_code)]
        struct Link {
            url: String,
            description: String,
        }

        let check = StructuralCheck::schema_for::<Vec<Link>>().unwrap();
        assert!(check.check(&json!([{"url": "u", "description": "d"}])).is_empty());
        assert!(!check.check(&json!([{"url": "u"}])).is_empty());
    }

    #[test]
    fn test_requires_model() {
        assert!(FieldValidator::Semantic(SemanticCheck::new(["in English"])).requires_model());
        assert!(!FieldValidator::Structural(links()).requires_model());
    }
}
