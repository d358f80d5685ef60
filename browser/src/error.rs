//! Error types for the browser core.

/// Errors surfaced by the metadata cache, scan sessions and the schema sampler.
///
/// Errors are `Clone` so that a single failed metadata fetch can be handed to
/// every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// No cluster session is active.
    #[error("Not connected to the cluster")]
    NotConnected,

    /// A cursor token could not be decoded into a cursor.
    #[error("Malformed cursor: {0}")]
    MalformedCursor(String),

    /// The cluster driver reported a failure unrelated to scanning.
    #[error("Driver error: {0}")]
    Driver(String),

    /// A scan page fetch failed for a reason other than normal exhaustion.
    #[error("Scan error: {0}")]
    Scan(String),

    /// No summarizer is configured.
    #[error("Schema summarization is not configured on the server")]
    SummarizationUnavailable,

    /// The summarizer was called and failed.
    #[error("Schema summarization failed: {0}")]
    SummarizationFailed(String),

    /// A request parameter was missing or out of range.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns true if the error was caused by the caller rather than by a
    /// collaborator.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::NotConnected | Error::MalformedCursor(_) | Error::InvalidInput(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Internal(format!("JSON error: {}", err))
    }
}

/// Result type alias for browser operations.
pub type Result<T> = std::result::Result<T, Error>;
