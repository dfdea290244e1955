//! Extraction Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use crate::Tool;
use derive_more::{Display, Error};
use std::path::PathBuf;

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The source PDF does not exist.
    #[display("source document not found: {}", _0.display())]
    SourceNotFound(#[error(not(source))] PathBuf),
    /// The external tool is not installed (or not executable).
    #[display("{_0} not found; is Poppler installed?")]
    ToolNotFound(#[error(not(source))] Tool),
    /// The external tool ran, but reported failure.
    #[display("{tool} failed: {status}")]
    ToolFailed { tool: Tool, status: String },
    /// The page count of the document could not be determined.
    #[display("page count unavailable for {}", _0.display())]
    MetadataUnavailable(#[error(not(source))] PathBuf),
    /// A single page could not be extracted.
    #[display("text of page {_0} unavailable")]
    PageUnavailable(#[error(not(source))] u32),
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ToolFailed { .. } | Self::MetadataUnavailable(_) | Self::PageUnavailable(_) | Self::Io
        )
    }
}
