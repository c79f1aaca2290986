//! Error types for the versepage library.

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for versepage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A position in the markup source, 1-indexed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Line number
    pub line: u32,
    /// Byte column within the line
    pub column: u32,
}

impl SourceLocation {
    /// Create a new source location.
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Errors that abort tokenizing or typesetting.
///
/// Page overflow is not an error: the pagination controller reports it as a
/// break signal with a penalty.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading the source.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The token stream grew past the configured capacity.
    #[error("{location}: too many tokens (limit is {limit})")]
    TooManyTokens {
        /// Configured token limit
        limit: usize,
        /// Where the limit was hit
        location: SourceLocation,
    },

    /// A single token grew past the configured byte length.
    #[error("{location}: token or line too long (limit is {limit} bytes)")]
    TokenTooLong {
        /// Configured byte limit
        limit: usize,
        /// Where the limit was hit
        location: SourceLocation,
    },

    /// Token bytes did not decode as UTF-8.
    #[error("{location}: invalid UTF-8 in token text")]
    InvalidUtf8 {
        /// Where the token was flushed
        location: SourceLocation,
    },

    /// A style or tag refers to a font nickname that was never registered.
    #[error("Unknown font: {0}")]
    UnknownFont(String),

    /// The layout configuration cannot produce a text column.
    #[error("Invalid layout configuration: {0}")]
    Config(String),

    /// Error while producing output (JSON, text).
    #[error("Rendering error: {0}")]
    Render(String),
}

impl Error {
    /// Source location for lexer errors, if any.
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            Error::TooManyTokens { location, .. }
            | Error::TokenTooLong { location, .. }
            | Error::InvalidUtf8 { location } => Some(*location),
            _ => None,
        }
    }
}
