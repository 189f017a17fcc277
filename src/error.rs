//! Error types for the s57rust library

use std::io;
use thiserror::Error;

/// Main error type for s57rust operations
#[derive(Debug, Error)]
pub enum S57Error {
    /// IO error occurred during file operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Stream ended before a fixed-length read could complete
    #[error("Truncated data: needed {needed} bytes, {remaining} remain")]
    TruncatedData { needed: usize, remaining: usize },

    /// A required field or unit terminator never appeared
    #[error("Missing terminator {terminator:#04X}")]
    MissingTerminator { terminator: u8 },

    /// Unknown letter in a field format list
    #[error("Unsupported format code: {0:?}")]
    UnsupportedFormatCode(String),

    /// Descriptor/arity mismatch, invalid usage indicator, or an
    /// unexpected duplicate
    #[error("Structural mismatch: {0}")]
    StructuralMismatch(String),

    /// Identifier absent from the current feature/geometry maps
    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),

    /// Text that should have been a number was not parsable as one
    #[error("Invalid number: {0:?}")]
    InvalidNumber(String),

    /// Path given for a base cell does not name one
    #[error("Not an S-57 base cell: {0}")]
    InvalidCellName(String),

    /// Text could not be encoded or decoded
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Generic error with custom message
    #[error("{0}")]
    Custom(String),
}

/// Result type alias for s57rust operations
pub type Result<T> = std::result::Result<T, S57Error>;

impl From<String> for S57Error {
    fn from(s: String) -> Self {
        S57Error::Custom(s)
    }
}

impl From<&str> for S57Error {
    fn from(s: &str) -> Self {
        S57Error::Custom(s.to_string())
    }
}
