//! Error types shared across the import and query paths.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for gazetteer operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Main error type for the gazetteer
#[derive(Error, Debug)]
pub enum Error {
    /// A required file (input dump, database, archive) is absent.
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The archive host answered 403. Fatal, never retried.
    #[error("access forbidden: {0}")]
    RemoteAccessDenied(String),

    /// The downloaded archive is corrupt or contains no usable data file.
    #[error("invalid archive {}: {reason}", .path.display())]
    InvalidArchive { path: PathBuf, reason: String },

    /// A caller-supplied query argument is out of domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A second import was started while one is still running.
    #[error("an import is already in progress against this destination")]
    ImportInProgress,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
