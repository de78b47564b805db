//! Filter operators
//!
//! The operator set is closed. Wire tokens that do not name one of these
//! variants are rejected when the token is parsed, so the compiler never
//! sees an operator it cannot translate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::compiler::CompileError;

/// Filter operators accepted in a filter clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equals
    Equal,
    /// Not equals
    NotEqual,
    /// Greater than
    GreaterThan,
    /// Greater than or equal
    GreaterThanOrEqual,
    /// Less than
    LessThan,
    /// Less than or equal
    LessThanOrEqual,
    /// Pattern match
    Like,
    /// Negated pattern match
    NotLike,
    /// Value in list
    In,
    /// Value not in list
    NotIn,
}

impl Operator {
    /// All operators, in wire-token order
    pub const ALL: [Operator; 10] = [
        Operator::Equal,
        Operator::NotEqual,
        Operator::GreaterThan,
        Operator::GreaterThanOrEqual,
        Operator::LessThan,
        Operator::LessThanOrEqual,
        Operator::Like,
        Operator::NotLike,
        Operator::In,
        Operator::NotIn,
    ];

    /// Get the wire token for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equal => "eq",
            Operator::NotEqual => "ne",
            Operator::GreaterThan => "gt",
            Operator::GreaterThanOrEqual => "gte",
            Operator::LessThan => "lt",
            Operator::LessThanOrEqual => "lte",
            Operator::Like => "like",
            Operator::NotLike => "notLike",
            Operator::In => "in",
            Operator::NotIn => "notIn",
        }
    }

    /// Returns true for the textual operators, which never coerce values
    pub fn is_textual(&self) -> bool {
        matches!(self, Operator::Like | Operator::NotLike)
    }

    /// Returns true for the membership operators
    pub fn is_membership(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }

    /// Human-readable name used in error messages
    pub fn describe(&self) -> &'static str {
        match self {
            Operator::Equal => "equal",
            Operator::NotEqual => "not equal",
            Operator::GreaterThan => "greater than",
            Operator::GreaterThanOrEqual => "greater than or equal",
            Operator::LessThan => "less than",
            Operator::LessThanOrEqual => "less than or equal",
            Operator::Like => "like",
            Operator::NotLike => "not like",
            Operator::In => "in",
            Operator::NotIn => "not in",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = CompileError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == token)
            .ok_or_else(|| CompileError::UnsupportedOperator(token.to_string()))
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        token.parse().map_err(serde::de::Error::custom)
    }
}
