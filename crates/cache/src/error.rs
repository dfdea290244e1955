//! Cache Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. A loader's own error tree is kept as
//! the child of [`ErrorKind::Load`].

use derive_more::{Display, Error};

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The loader for this key failed; the key is absent again and the next
    /// call will retry.
    #[display("failed to load {_0:?}")]
    Load(#[error(not(source))] String),
    /// The loader panicked or its task was cancelled before finishing.
    #[display("load of {_0:?} was aborted")]
    Aborted(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        true
    }
}
