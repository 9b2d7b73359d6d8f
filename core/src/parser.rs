//! Locating and decoding the fenced structured block in a model reply.
//!
//! The model is asked to finish with a single block such as
//!
//! ````text
//! ```json
//! {"title": "..."}
//! ```
//! ````
//!
//! Anything before the block (preamble, reasoning) and after it is ignored.

use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::schema::kind_of;

const FENCE: &str = "```";

/// Finds the first fenced block carrying the configured tag and decodes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputParser {
    tag: String,
}

impl Default for OutputParser {
    fn default() -> Self {
        Self::new("json")
    }
}

impl OutputParser {
    /// Creates a parser for blocks opened with ```` ```{tag} ````.
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    /// The fence tag this parser looks for.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns the JSON text of the first matching block.
    ///
    /// The block ends where its JSON value ends, so fences quoted inside
    /// string values do not close it early.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MissingBlock` if there is no opening fence with the
    /// tag or the block is never closed, and `ParseError::Decode` if the block
    /// does not hold exactly one JSON value.
    pub fn find_block<'a>(&self, raw: &'a str) -> Result<&'a str, ParseError> {
        self.read_block(raw).map(|(_, text)| text)
    }

    /// Decodes the first matching block as any JSON value.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MissingBlock` or `ParseError::Decode`.
    pub fn parse(&self, raw: &str) -> Result<Value, ParseError> {
        self.read_block(raw).map(|(value, _)| value)
    }

    /// Decodes the first matching block as a JSON object (the extraction contract).
    ///
    /// # Errors
    ///
    /// As [`parse`](Self::parse), plus `ParseError::UnexpectedShape` for non-objects.
    pub fn parse_object(&self, raw: &str) -> Result<Map<String, Value>, ParseError> {
        match self.parse(raw)? {
            Value::Object(map) => Ok(map),
            other => Err(ParseError::UnexpectedShape {
                expected: "an object",
                found: kind_of(&other),
            }),
        }
    }

    /// Decodes the first matching block as a list of strings (the verification contract).
    ///
    /// # Errors
    ///
    /// As [`parse`](Self::parse), plus `ParseError::UnexpectedShape` when the
    /// block is not a list or holds non-string entries.
    pub fn parse_string_list(&self, raw: &str) -> Result<Vec<String>, ParseError> {
        let items = match self.parse(raw)? {
            Value::Array(items) => items,
            other => {
                return Err(ParseError::UnexpectedShape {
                    expected: "a list of strings",
                    found: kind_of(&other),
                })
            }
        };
        items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                other => Err(ParseError::UnexpectedShape {
                    expected: "a list of strings",
                    found: kind_of(&other),
                }),
            })
            .collect()
    }

    fn read_block<'a>(&self, raw: &'a str) -> Result<(Value, &'a str), ParseError> {
        let missing = || ParseError::MissingBlock {
            tag: self.tag.clone(),
        };
        let body = self.open_block(raw).ok_or_else(missing)?;

        let mut values = serde_json::Deserializer::from_str(body).into_iter::<Value>();
        match values.next() {
            Some(Ok(value)) => {
                let consumed = values.byte_offset();
                let rest = &body[consumed..];
                if rest.trim_start().starts_with(FENCE) {
                    Ok((value, body[..consumed].trim()))
                } else if rest.contains(FENCE) {
                    Err(ParseError::Decode(
                        "unexpected text between the JSON value and the closing fence"
                            .to_string(),
                    ))
                } else {
                    Err(missing())
                }
            }
            Some(Err(e)) if body.contains(FENCE) => Err(ParseError::Decode(e.to_string())),
            Some(Err(_)) => Err(missing()),
            None if body.contains(FENCE) => {
                Err(ParseError::Decode("the block is empty".to_string()))
            }
            None => Err(missing()),
        }
    }

    /// Everything after the first opening fence carrying this parser's tag.
    fn open_block<'a>(&self, raw: &'a str) -> Option<&'a str> {
        let mut cursor = 0;
        while let Some(offset) = raw[cursor..].find(FENCE) {
            let after_fence = cursor + offset + FENCE.len();
            if let Some(content_start) = self.match_tag(raw, after_fence) {
                return Some(&raw[content_start..]);
            }
            cursor = after_fence;
        }
        None
    }

    /// If the text right after a fence is this parser's tag followed by a
    /// separator, returns where the block content begins.
    fn match_tag(&self, raw: &str, after_fence: usize) -> Option<usize> {
        let tag_end = after_fence + self.tag.len();
        let candidate = raw.get(after_fence..tag_end)?;
        if !candidate.eq_ignore_ascii_case(&self.tag) {
            return None;
        }
        match raw[tag_end..].chars().next() {
            Some(c) if c.is_whitespace() => Some(tag_end),
            _ => None,
        }
    }
}
