//! Error types for roster-search.

/// Alias for Results returning [`SearchError`].
pub type Result<T> = std::result::Result<T, SearchError>;

/// Top-level error type.
///
/// An empty match set is not an error; see [`crate::search::SearchOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The request was malformed (missing or empty query).
    #[error("Validation error: {0}")]
    Validation(String),

    /// One of the named full-text indexes failed; the whole fanout fails.
    #[error("Index query failed on `{index}`: {message}")]
    IndexQuery { index: String, message: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failure reported by a non-SQLite graph backend.
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SearchError {
    /// True for failures of the index or graph-store collaborators.
    ///
    /// These are fatal for the request and are never retried.
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            Self::IndexQuery { .. } | Self::Database(_) | Self::Backend(_)
        )
    }

    /// True when the caller supplied an invalid request.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
