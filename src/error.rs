//! Error types and handling infrastructure for mless.
//!
//! Library code returns [`MlessError`] through the shared [`Result`] alias;
//! the binary boundary wraps these with `anyhow` for context. Errors that
//! reach the UI after startup are rendered as transient status messages and
//! never tear down the pager.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for mless operations.
#[derive(Error, Debug)]
pub enum MlessError {
    /// File system related errors (wraps the underlying io::Error)
    #[error("File operation failed: {message}")]
    FileError {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// File not found specifically (common case for user feedback)
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Permission denied accessing file
    #[error("Permission denied accessing file: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path exists but is not a regular file
    #[error("Path is not a regular file: {path}")]
    NotAFile { path: PathBuf },

    /// A range expression did not resolve to a non-empty line range
    #[error("Invalid range: {expr}")]
    InvalidRange { expr: String },

    /// Jump to a mark that has not been set
    #[error("Mark '{mark}' is not set")]
    MarkNotSet { mark: char },

    /// A time expression found no matching line
    #[error("No line found near {input}")]
    TimeUnresolved { input: String },

    /// Terminal setup or drawing errors
    #[error("Terminal operation failed: {message}")]
    TerminalError { message: String },

    /// Configuration file errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

/// Standard Result type for mless operations.
pub type Result<T> = std::result::Result<T, MlessError>;

impl MlessError {
    /// Create a FileError from an io::Error with additional context
    pub fn file_error(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::FileError {
            message: message.into(),
            source,
        }
    }

    /// Create an InvalidRange error from the offending expression
    pub fn invalid_range(expr: impl Into<String>) -> Self {
        Self::InvalidRange { expr: expr.into() }
    }

    /// Create a TimeUnresolved error from the user's input
    pub fn time_unresolved(input: impl Into<String>) -> Self {
        Self::TimeUnresolved {
            input: input.into(),
        }
    }

    /// Create a TerminalError with a descriptive message
    pub fn terminal(message: impl Into<String>) -> Self {
        Self::TerminalError {
            message: message.into(),
        }
    }

    /// Create a ConfigError with a descriptive message
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Attach a path to a raw io::Error, picking the most specific variant.
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound { path },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::FileError {
                message: format!("{}", path.display()),
                source: err,
            },
        }
    }
}

impl From<std::io::Error> for MlessError {
    fn from(err: std::io::Error) -> Self {
        Self::FileError {
            message: "IO operation failed".to_string(),
            source: err,
        }
    }
}
