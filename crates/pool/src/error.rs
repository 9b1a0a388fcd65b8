//! Error types for pool operations
use std::time::Duration;

use thiserror::Error;

/// Result type for pool operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for pool operations.
///
/// Timeouts and closed-pool rejections are expected, recoverable conditions
/// and are kept distinct so callers can react to each. The pool never
/// retries internally.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The acquire deadline elapsed before a resource became available
    #[error("acquire timed out after {waited:?}")]
    Timeout {
        /// How long the caller waited
        waited: Duration,
    },

    /// The pool is closed and will not admit new acquires
    #[error("pool is closed")]
    Closed,

    /// `release` was called with a resource that is not checked out
    #[error("resource is not checked out from this pool")]
    NotCheckedOut,
}

impl Error {
    /// Check if this error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
