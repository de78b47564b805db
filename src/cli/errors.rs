//! CLI-specific error types

use std::fmt;
use std::io;

use crate::compiler::{CompileError, ConfigError};
use crate::pagination::DecodeError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// The request was rejected; carries the library error code
    InvalidRequest(&'static str),
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "QC_CLI_CONFIG_ERROR",
            Self::IoError => "QC_CLI_IO_ERROR",
            Self::InvalidRequest(code) => code,
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Rejected requests are reported on stdout, not as process failures
    pub fn is_rejection(&self) -> bool {
        matches!(self.code, CliErrorCode::InvalidRequest(_))
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<DecodeError> for CliError {
    fn from(e: DecodeError) -> Self {
        Self::new(CliErrorCode::InvalidRequest(e.code()), e.to_string())
    }
}

impl From<CompileError> for CliError {
    fn from(e: CompileError) -> Self {
        Self::new(CliErrorCode::InvalidRequest(e.code()), e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_is_rejection() {
        let err = CliError::from(CompileError::UnsupportedOperator("xor".into()));
        assert!(err.is_rejection());
        assert_eq!(err.code_str(), "QC_UNSUPPORTED_OPERATOR");
        assert_eq!(err.message(), "unsupported operator xor");
    }

    #[test]
    fn test_io_error_is_not_rejection() {
        let err = CliError::from(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        assert!(!err.is_rejection());
        assert_eq!(err.code(), &CliErrorCode::IoError);
        assert_eq!(err.to_string(), "QC_CLI_IO_ERROR: closed");
    }
}
