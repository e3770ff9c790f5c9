//! Sync error types.

use overleaf_client::ClientError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that abort a sync run, or a single project within one.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Errors while materializing a project archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("cannot open archive: {0}")]
    Open(#[source] zip::result::ZipError),

    #[error("cannot read archive entry {index}: {source}")]
    Entry {
        index: usize,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("cannot read {name} from archive: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("archive entry escapes the target directory: {0}")]
    UnsafeEntry(String),

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("extraction task failed: {0}")]
    Task(String),
}

impl ArchiveError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArchiveError::Write {
            path: path.into(),
            source,
        }
    }
}
