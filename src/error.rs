//! Command Line Error Types

use derive_more::{Display, Error};

/// A command error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for commands.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Configuration could not be loaded, or describes an invalid catalog.
    #[display("invalid configuration")]
    Config,
    /// External tools or the document store could not be set up.
    #[display("failed to initialize")]
    Setup,
    #[display("failed to show handbook")]
    Show,
    /// Some handbooks in a batch could not be converted.
    #[display("{_0} handbook(s) failed to convert")]
    Convert(#[error(not(source))] usize),
    #[display("failed to write output")]
    Output,
}
