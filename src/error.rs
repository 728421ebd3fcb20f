//! Error types for the wait registry.

use std::time::Duration;
use thiserror::Error;

/// Main error type for wait operations.
///
/// Settlement errors are `Clone` because a single settlement may need to be
/// delivered twice: once to the suspended waiter and once to the dispatch
/// caller that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaitError {
    #[error("Wait timed out after {0:?}")]
    Timeout(Duration),

    #[error("Wait was cancelled")]
    Cancelled,

    #[error("Filter predicate failed: {0}")]
    Filter(String),

    #[error("Unknown subject: {0}")]
    UnknownSubject(String),
}

/// Result type for wait operations.
pub type Result<T> = std::result::Result<T, WaitError>;
