//! Storage path validation.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Normalize a storage path and make sure it stays inside the storage root.
///
/// `.` components and repeated or trailing separators are dropped and `..`
/// is resolved lexically; a path that would climb above the root, contains
/// a null byte, carries a root/prefix component that cannot be made relative,
/// or normalizes to nothing is rejected with
/// [`InvalidPath`](crate::error::ErrorKind::InvalidPath).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use binran_storage::validate_path;
///
/// assert_eq!(validate_path("handbook_engineering.txt").unwrap(), Path::new("handbook_engineering.txt"));
/// assert_eq!(validate_path("./2024//handbook_letters.txt").unwrap(), Path::new("2024/handbook_letters.txt"));
/// assert!(validate_path("../handbook_letters.txt").is_err());
/// assert!(validate_path("").is_err());
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(original.to_path_buf());
    let mut normalized = Vec::new();
    for component in original.components() {
        match component {
            // Null bytes survive `components()` on unix but truncate paths
            // once they reach the C APIs underneath.
            Component::Normal(part) if part.as_encoded_bytes().contains(&0) => exn::bail!(invalid()),
            Component::Normal(part) => normalized.push(part),
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if normalized.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    if normalized.is_empty() {
        exn::bail!(invalid());
    }
    Ok(normalized.into_iter().collect())
}
