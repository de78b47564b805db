//! Request decoding errors
//!
//! Every decode error is a client error: the caller maps it to a 400-class
//! response, the compiler never sees the rejected input.

use thiserror::Error;

use crate::compiler::CompileError;

/// Result type for decoding operations
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors raised while turning transport input into a `PaginationRequest`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The encoded blob is not valid URL-safe base64
    #[error("invalid pagination format: {0}")]
    InvalidEncoding(String),

    /// The decoded payload is not a valid pagination object
    #[error("invalid pagination data: {0}")]
    InvalidData(String),

    /// Sort order is neither `asc` nor `desc`
    #[error("invalid order format")]
    InvalidOrder(String),

    /// A discrete query parameter could not be parsed
    #[error("invalid query parameter: {0}")]
    InvalidQueryParam(String),

    /// A filter clause names an operator outside the supported set
    #[error(transparent)]
    Operator(#[from] CompileError),
}

impl DecodeError {
    /// Get the machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            DecodeError::InvalidEncoding(_) => "QC_INVALID_ENCODING",
            DecodeError::InvalidData(_) => "QC_INVALID_DATA",
            DecodeError::InvalidOrder(_) => "QC_INVALID_ORDER",
            DecodeError::InvalidQueryParam(_) => "QC_INVALID_QUERY_PARAM",
            DecodeError::Operator(err) => err.code(),
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        400
    }
}
