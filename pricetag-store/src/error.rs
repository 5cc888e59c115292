//! Store error taxonomy.
//!
//! Callers recover differently from each class: `NotAuthenticated` prompts a
//! login and falls back to local-only operation, storage failures are
//! retryable, parse failures exclude the offending record from result sets.

use pricetag_core::DesignError;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in local or remote store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A remote operation was attempted without a resolved principal.
    ///
    /// Not a storage failure; callers willing to operate local-only treat
    /// this as a soft condition.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Local storage read/write failed.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP layer failed (connection, timeout, TLS).
    #[error("remote request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("remote returned status {status}: {body}")]
    RemoteStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// A stored or remote payload could not be deserialized into a record.
    #[error("payload could not be parsed: {0}")]
    Parse(String),

    /// The configured backend URL is malformed.
    #[error("invalid remote URL: {0}")]
    InvalidUrl(String),

    /// The requested record does not exist.
    #[error("record not found: {0}")]
    NotFound(String),

    /// The record itself is invalid (for example a non-positive size).
    #[error("invalid record: {0}")]
    Model(#[from] DesignError),
}

impl StoreError {
    /// True for the recoverable missing-principal condition.
    #[must_use]
    pub const fn is_not_authenticated(&self) -> bool {
        matches!(self, Self::NotAuthenticated)
    }
}
