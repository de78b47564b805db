//! Compiler error types
//!
//! Error codes:
//! - QC_UNSUPPORTED_OPERATOR (REJECT)
//! - QC_INVALID_SEQUENCE_FORMAT (REJECT)
//!
//! Configuration loading has its own `ConfigError`.
//! Coercion misses, empty filter lists and empty results are not errors.

use std::io;

use thiserror::Error;

use crate::pagination::Operator;

/// Result type for compile operations
pub type CompileResult<T> = Result<T, CompileError>;

/// Errors returned by the query compiler
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Operator token not in the supported set
    #[error("unsupported operator {0}")]
    UnsupportedOperator(String),

    /// `in` / `not in` value is neither a string nor a sequence
    #[error("invalid format for '{}' operator", .0.describe())]
    InvalidSequenceFormat(Operator),
}

impl CompileError {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::UnsupportedOperator(_) => "QC_UNSUPPORTED_OPERATOR",
            CompileError::InvalidSequenceFormat(_) => "QC_INVALID_SEQUENCE_FORMAT",
        }
    }
}

/// Errors raised while loading a `CompilerConfig`
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(#[from] io::Error),

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
