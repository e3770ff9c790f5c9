//! Overleaf client error types.

use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while talking to an Overleaf instance.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("session was not logged in")]
    SessionRequired,

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("project download failed: {0}")]
    Download(String),

    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Returns the extraction failure kind, if this is an extraction error.
    pub fn extraction_kind(&self) -> Option<ExtractionFailure> {
        match self {
            ClientError::Extraction(e) => Some(e.kind),
            _ => None,
        }
    }
}

/// Why an embedded page payload could not be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractionFailure {
    /// The meta tag, or its `content` attribute, is absent or empty.
    MissingAttribute,
    /// The attribute content is not valid JSON.
    InvalidJson,
    /// The JSON does not have the expected structure.
    SchemaMismatch,
}

impl std::fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExtractionFailure::MissingAttribute => "missing attribute",
            ExtractionFailure::InvalidJson => "invalid JSON",
            ExtractionFailure::SchemaMismatch => "schema mismatch",
        };
        f.write_str(s)
    }
}

/// Failure to extract a named payload from a page.
#[derive(Debug, Error)]
#[error("failed to extract {key}: {kind}{}", detail_suffix(.detail))]
pub struct ExtractionError {
    /// Meta tag name, e.g. `ol-projects`.
    pub key: String,
    pub kind: ExtractionFailure,
    pub detail: Option<String>,
}

impl ExtractionError {
    pub fn new(key: &str, kind: ExtractionFailure) -> Self {
        Self {
            key: key.to_string(),
            kind,
            detail: None,
        }
    }

    pub fn with_detail(key: &str, kind: ExtractionFailure, detail: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            kind,
            detail: Some(detail.into()),
        }
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(" ({d})")).unwrap_or_default()
}
