//! Catalog Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A catalog error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No catalog entry exists for the requested key.
    #[display("unknown handbook key: {_0}")]
    UnknownKey(#[error(not(source))] String),
    /// The catalog entry exists, but has no such department.
    #[display("unknown department '{department}' for handbook '{key}'")]
    UnknownDepartment { key: String, department: String },
    /// An entry was rejected while building the catalog.
    #[display("invalid catalog entry '{key}': {reason}")]
    InvalidEntry { key: String, reason: &'static str },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // The catalog never changes after startup.
        false
    }
}
