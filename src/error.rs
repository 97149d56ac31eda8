//! Global error handling for teinline
//!
//! This module provides a centralized error type that can represent errors
//! from all modules in the project.

use std::io;
use thiserror::Error;

/// Global error type for teinline operations
#[derive(Error, Debug)]
pub enum TeinlineError {
    /// Input is not well-formed XML (fatal for the current file only)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Structural violation in an otherwise well-formed document
    #[error("Structure error: {0}")]
    Structure(String),

    /// File system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON report serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Specialized Result type for teinline operations
pub type Result<T> = std::result::Result<T, TeinlineError>;

/// Creates a TeinlineError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::TeinlineError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}

// Allow converting TeinlineError to io::Error for callers that speak io
impl From<TeinlineError> for io::Error {
    fn from(err: TeinlineError) -> Self {
        io::Error::new(io::ErrorKind::Other, err.to_string())
    }
}
