//! Centralized error types for mhtml-extract.
//!
//! Only conditions detected before any data is processed are fatal; everything
//! that can go wrong with an individual part or file is handled in place and
//! surfaces as a skip counter or a log line instead.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors produced by the mhtml-extract library.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The archive file does not exist.
    #[error("MHTML archive not found: {0}")]
    SourceNotFound(PathBuf),

    /// The source path exists but is not a regular file.
    #[error("Not a regular file: {0}")]
    SourceNotAFile(PathBuf),

    /// The output directory rejected a write at setup time.
    #[error("Output directory is not writable: {0}")]
    DestinationNotWritable(PathBuf),
}

/// Convenience alias for `Result<T, ExtractError>`.
pub type Result<T> = std::result::Result<T, ExtractError>;

impl ExtractError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Allow `?` on `std::io::Error` inside functions returning `ExtractError`
/// when no path context is available (rare — prefer `ExtractError::io`).
impl From<std::io::Error> for ExtractError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
