//! Attempt history for one document.

use std::time::Duration;

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{ParseError, ValidationError};
use crate::prompt::PriorOutput;

/// Record of a single extraction attempt.
#[derive(Debug, Clone)]
pub struct Attempt {
    /// The attempt number (1-indexed).
    pub number: usize,
    /// Prompt sent to the model.
    pub prompt: String,
    /// Raw model reply.
    pub raw_output: String,
    /// Decoded object, or why decoding failed.
    pub parsed: Result<Map<String, Value>, ParseError>,
    /// Every validation failure of this attempt, in field order.
    pub errors: Vec<ValidationError>,
    /// Time since the session started when the attempt finished.
    pub elapsed: Duration,
}

impl Attempt {
    /// The view of this attempt a repair prompt is built from.
    #[must_use]
    pub fn prior_output(&self) -> PriorOutput<'_> {
        match &self.parsed {
            Ok(value) => PriorOutput::Parsed(value),
            Err(_) => PriorOutput::Unparsed(&self.raw_output),
        }
    }
}

/// Append-only, bounded sequence of attempts owned by one extraction.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    capacity: usize,
    attempts: Vec<Attempt>,
}

impl Session {
    /// Starts an empty session allowing `capacity` attempts.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            capacity,
            attempts: Vec::with_capacity(capacity),
        }
    }

    /// Identifier used to correlate log events.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Appends a finished attempt.
    pub fn record(&mut self, attempt: Attempt) {
        debug_assert!(self.attempts.len() < self.capacity, "session over capacity");
        self.attempts.push(attempt);
    }

    /// The most recent attempt, which is what repairs are built from.
    #[must_use]
    pub fn last(&self) -> Option<&Attempt> {
        self.attempts.last()
    }

    /// Number of recorded attempts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    /// Whether no attempt has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    /// Whether the attempt budget is spent.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.attempts.len() >= self.capacity
    }

    /// All attempts in order.
    #[must_use]
    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }
}
