//! Error types for the spread cropping library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the spread cropping library
#[derive(Error, Debug)]
pub enum Error {
    /// Input file missing or unreadable
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// Source could not be used as a paged document (corrupt, encrypted, empty)
    #[error("Unsupported document: {0}")]
    UnsupportedDocument(String),

    /// Bad user input: margin offset, page count parity, output name
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Output could not be created or written
    #[error("Failed to write {}: {reason}", .path.display())]
    WriteFailure { path: PathBuf, reason: String },
}

impl Error {
    /// Process exit status for this error category
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidArgument(_) => 2,
            Error::InputNotFound(_) => 3,
            Error::UnsupportedDocument(_) => 4,
            Error::WriteFailure { .. } => 5,
        }
    }
}

// Anything lopdf reports while reading the page tree means the source is not usable.
impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::UnsupportedDocument(err.to_string())
    }
}
