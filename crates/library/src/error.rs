//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Callers only need to tell the two
//! boundary kinds apart, [`UnknownKey`](ErrorKind::UnknownKey) and
//! [`Unavailable`](ErrorKind::Unavailable); everything else is detail in the
//! error tree below them.

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The key is not in the catalog. Nothing was attempted.
    #[display("unknown handbook: {_0}")]
    UnknownKey(#[error(not(source))] String),
    /// The handbook exists, but has no such department.
    #[display("unknown department '{department}' for handbook '{key}'")]
    UnknownDepartment { key: String, department: String },
    /// The handbook could not be produced right now; a later request will
    /// try again.
    #[display("handbook unavailable: {_0}")]
    Unavailable(#[error(not(source))] String),
    /// Text extraction of the source document failed.
    #[display("text extraction failed")]
    Extraction,
    /// The document store could not be queried.
    #[display("document store error")]
    Storage,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Extraction | Self::Storage)
    }
}
