//! # Value Coercion
//!
//! Filter values usually arrive as strings. When the target field stores
//! opaque identifiers, a literal string never matches, so the compiler asks a
//! `ValueCoercer` whether a string should be reinterpreted first.
//!
//! Sequence policy (shared by every coercer):
//!
//! 1. Probe only the first element. If it does not coerce, the literal
//!    sequence is kept and no other element is tried.
//! 2. Otherwise coerce every element, silently dropping the ones that fail.
//! 3. An empty result falls back to the literal sequence.
//!
//! A miss is never an error.

use bson::oid::ObjectId;
use bson::Bson;
use serde::{Deserialize, Serialize};

/// Strategy for reinterpreting string filter values
pub trait ValueCoercer: Send + Sync {
    /// Coerce a single string, or `None` to keep it literal
    fn coerce_scalar(&self, field: &str, value: &str) -> Option<Bson>;

    /// Coerce a sequence of strings using the probe-first policy
    fn coerce_sequence(&self, field: &str, values: &[&str]) -> Option<Vec<Bson>> {
        let first = values.first()?;
        self.coerce_scalar(field, first)?;

        let coerced: Vec<Bson> = values
            .iter()
            .filter_map(|value| self.coerce_scalar(field, value))
            .collect();

        if coerced.is_empty() {
            None
        } else {
            Some(coerced)
        }
    }
}

/// Never coerces; every string stays literal
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCoercer;

impl ValueCoercer for NoopCoercer {
    fn coerce_scalar(&self, _field: &str, _value: &str) -> Option<Bson> {
        None
    }
}

/// Reinterprets 24-hex-character strings as store object identifiers
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectIdCoercer;

impl ValueCoercer for ObjectIdCoercer {
    fn coerce_scalar(&self, _field: &str, value: &str) -> Option<Bson> {
        ObjectId::parse_str(value).ok().map(Bson::ObjectId)
    }
}

/// Named coercion strategy, selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoercionStrategy {
    /// Keep every string literal
    #[default]
    None,
    /// Probe strings for object identifiers
    ObjectId,
}

impl CoercionStrategy {
    /// Build the coercer for this strategy
    pub fn coercer(&self) -> Box<dyn ValueCoercer> {
        match self {
            CoercionStrategy::None => Box::new(NoopCoercer),
            CoercionStrategy::ObjectId => Box::new(ObjectIdCoercer),
        }
    }
}
