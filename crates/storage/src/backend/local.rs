//! Filesystem backend rooted at a single directory.

use crate::error::{ErrorKind, Result};
use crate::{StorageBackend, path::validate as validate_path};
use async_trait::async_trait;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Stores documents as plain files below `root`.
///
/// Writes land in a hidden `.partial` sibling first and are renamed into
/// place, so a reader sees either the previous document or the complete new
/// one.
///
/// # Examples
///
/// ```no_run
/// use binran_storage::backend::LocalBackend;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let handbooks = LocalBackend::new("handbooks", "/var/lib/binran/handbooks")?;
/// assert!(handbooks.root().is_dir());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalBackend {
    name: String,
    root: PathBuf,
}

impl LocalBackend {
    /// Open (creating if needed) the directory at `root`.
    ///
    /// # Errors
    ///
    /// [`InvalidPath`](ErrorKind::InvalidPath) unless `root` is absolute and
    /// names a directory, or nothing yet.
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let usable = root.is_absolute() && (root.is_dir() || !root.exists());
        if !usable {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        // Startup only, so the blocking call is fine here.
        std::fs::create_dir_all(&root).map_err(io_error(&root))?;
        Ok(Self { name: name.into(), root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        Ok(self.root.join(validate_path(path)?))
    }

    fn partial_path(path: &Path) -> PathBuf {
        let mut name = OsString::from(".");
        name.push(path.file_name().unwrap_or_default());
        name.push(".partial");
        path.with_file_name(name)
    }
}

/// Map an I/O failure on `path` (as the caller named it, not the resolved
/// location) to the storage error kinds callers act on.
fn io_error(path: &Path) -> impl FnOnce(io::Error) -> ErrorKind + '_ {
    move |err| match err.kind() {
        io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
        _ => ErrorKind::Io(err),
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let target = self.resolve(path)?;
        Ok(fs::try_exists(&target).await.map_err(io_error(path))?)
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let target = self.resolve(path)?;
        Ok(fs::read(&target).await.map_err(io_error(path))?)
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let target = self.resolve(path)?;
        if let Some(dir) = target.parent() {
            fs::create_dir_all(dir).await.map_err(io_error(path))?;
        }
        let partial = Self::partial_path(&target);
        fs::write(&partial, data).await.map_err(io_error(path))?;
        if let Err(err) = fs::rename(&partial, &target).await {
            _ = fs::remove_file(&partial).await;
            exn::bail!(io_error(path)(err));
        }
        tracing::trace!(path = %target.display(), bytes = data.len(), "Wrote file");
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let target = self.resolve(path)?;
        Ok(fs::remove_file(&target).await.map_err(io_error(path))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn handbooks() -> (TempDir, LocalBackend) {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("handbooks", dir.path()).unwrap();
        (dir, backend)
    }

    #[rstest]
    #[case("handbooks")]
    #[case("./handbooks")]
    fn test_relative_root_rejected(#[case] root: &str) {
        let err = LocalBackend::new("handbooks", root).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[test]
    fn test_root_created() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("binran/handbooks");
        let backend = LocalBackend::new("handbooks", &root).unwrap();
        assert!(root.is_dir());
        assert_eq!(backend.root(), root);
    }

    #[test]
    fn test_file_as_root_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("handbook_science.txt");
        std::fs::write(&file, "理学部").unwrap();
        let err = LocalBackend::new("handbooks", &file).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[test]
    fn test_partial_path() {
        let partial = LocalBackend::partial_path(Path::new("/srv/handbook_letters.txt"));
        assert_eq!(partial, Path::new("/srv/.handbook_letters.txt.partial"));
    }

    #[rstest]
    #[tokio::test]
    async fn test_write_is_atomic_rename(handbooks: (TempDir, LocalBackend)) {
        let (dir, backend) = handbooks;
        let path = Path::new("handbook_engineering.txt");
        backend.write(path, "--- PAGE 1 (表紙/目次など) ---\n".as_bytes()).await.unwrap();
        backend.write(path, "--- PAGE 1 ---\n".as_bytes()).await.unwrap();
        assert_eq!(backend.read(path).await.unwrap(), b"--- PAGE 1 ---\n");
        assert!(!dir.path().join(".handbook_engineering.txt.partial").exists());
    }

    #[rstest]
    #[tokio::test]
    async fn test_nested_write(handbooks: (TempDir, LocalBackend)) {
        let (_dir, backend) = handbooks;
        let path = Path::new("2024/handbook_letters.txt");
        backend.write(path, b"letters").await.unwrap();
        assert!(backend.exists(path).await.unwrap());
    }

    #[rstest]
    #[tokio::test]
    async fn test_missing_file(handbooks: (TempDir, LocalBackend)) {
        let (_dir, backend) = handbooks;
        let path = Path::new("handbook_medicine.txt");
        assert!(!backend.exists(path).await.unwrap());
        assert!(backend.read(path).await.unwrap_err().is_not_found());
        assert!(backend.delete(path).await.unwrap_err().is_not_found());
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete_then_gone(handbooks: (TempDir, LocalBackend)) {
        let (_dir, backend) = handbooks;
        let path = Path::new("handbook_agriculture.txt");
        backend.write(path, b"agriculture").await.unwrap();
        backend.delete(path).await.unwrap();
        assert!(!backend.exists(path).await.unwrap());
    }

    #[rstest]
    #[case("../handbook_science.txt")]
    #[case("2024/../../handbook_science.txt")]
    #[tokio::test]
    async fn test_escape_rejected(handbooks: (TempDir, LocalBackend), #[case] path: &str) {
        let (_dir, backend) = handbooks;
        let path = Path::new(path);
        assert!(backend.read(path).await.is_err());
        assert!(backend.write(path, b"escape").await.is_err());
        assert!(backend.delete(path).await.is_err());
    }
}
