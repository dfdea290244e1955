//! Handbook document storage.
//!
//! Each handbook is kept as a single UTF-8 text file named after its catalog
//! key, directly under the storage root.

use exn::ResultExt;
use std::path::PathBuf;

use crate::BackendHandle;
use crate::error::{ErrorKind, Result};

const FILE_PREFIX: &str = "handbook_";
const FILE_EXTENSION: &str = "txt";

/// Durable home of materialized handbook text, keyed by catalog key.
#[derive(Clone)]
pub struct DocumentStore {
    backend: BackendHandle,
}

impl DocumentStore {
    pub fn new(backend: BackendHandle) -> Self {
        Self { backend }
    }

    /// Storage path for a handbook key, `handbook_<key>.txt`.
    ///
    /// Keys containing path separators, `..`, or null bytes are rejected with
    /// [`InvalidPath`](ErrorKind::InvalidPath) so a key can never address a
    /// file outside the storage root.
    ///
    /// # Examples
    ///
    /// ```
    /// use binran_storage::DocumentStore;
    /// use std::path::Path;
    ///
    /// assert_eq!(DocumentStore::path_for("engineering").unwrap(), Path::new("handbook_engineering.txt"));
    /// assert!(DocumentStore::path_for("../engineering").is_err());
    /// ```
    pub fn path_for(key: &str) -> Result<PathBuf> {
        let file = PathBuf::from(format!("{FILE_PREFIX}{key}.{FILE_EXTENSION}"));
        let well_formed = !key.is_empty()
            && !key.contains(['/', '\\', '\0'])
            && !key.contains("..")
            && file.components().count() == 1;
        if !well_formed {
            exn::bail!(ErrorKind::InvalidPath(file));
        }
        Ok(file)
    }

    /// Whether a document for this key has been stored.
    pub async fn has(&self, key: &str) -> Result<bool> {
        let path = Self::path_for(key)?;
        self.backend.exists(&path).await
    }

    /// Read the stored document for a key.
    ///
    /// # Errors
    ///
    /// [`NotFound`](ErrorKind::NotFound) if nothing is stored yet, and
    /// [`InvalidData`](ErrorKind::InvalidData) if the file is not UTF-8.
    pub async fn read(&self, key: &str) -> Result<String> {
        let path = Self::path_for(key)?;
        let data = self.backend.read(&path).await?;
        String::from_utf8(data).or_raise(|| ErrorKind::InvalidData(path))
    }

    /// Store the document for a key, replacing any previous version.
    #[tracing::instrument(level = "debug", skip(self, text), fields(backend = self.backend.name(), bytes = text.len()))]
    pub async fn write(&self, key: &str, text: &str) -> Result<()> {
        let path = Self::path_for(key)?;
        self.backend.write(&path, text.as_bytes()).await?;
        tracing::debug!(path = %path.display(), "Stored handbook document");
        Ok(())
    }

    /// Remove the stored document for a key.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let path = Self::path_for(key)?;
        self.backend.delete(&path).await
    }
}
