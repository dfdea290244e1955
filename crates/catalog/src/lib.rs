//! Catalog of handbooks known to the system.
//!
//! The catalog is built once at startup, either from the built-in table or
//! from configuration, and never changes afterwards. Share it behind an
//! [`Arc`](std::sync::Arc); no synchronisation is needed to read it.
//!
//! Every other component resolves a handbook key through
//! [`Catalog::lookup`], which makes it the single validation gate for
//! incoming keys.

pub mod builtin;
mod entry;
pub mod error;

pub use crate::entry::{CatalogEntry, EntrySpec};
use crate::error::{ErrorKind, Result};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl Catalog {
    /// Build a catalog from raw entries.
    ///
    /// Relative source paths are joined onto `source_dir` when one is
    /// given. Duplicate or empty keys, keys that cannot name a single file
    /// (path separators, `..`, NUL) and negative page offsets are rejected
    /// with [`InvalidEntry`](ErrorKind::InvalidEntry).
    pub fn new<I, K>(specs: I, source_dir: Option<&Path>) -> Result<Self>
    where
        I: IntoIterator<Item = (K, EntrySpec)>,
        K: Into<String>,
    {
        let mut entries = BTreeMap::new();
        for (key, spec) in specs {
            let key = key.into();
            if key.trim().is_empty() {
                exn::bail!(ErrorKind::InvalidEntry { key, reason: "key must not be empty" });
            }
            if key.contains(['/', '\\', '\0']) || key.contains("..") {
                exn::bail!(ErrorKind::InvalidEntry { key, reason: "key must be usable as a file name" });
            }
            if entries.contains_key(&key) {
                exn::bail!(ErrorKind::InvalidEntry { key, reason: "duplicate key" });
            }
            let Ok(page_offset) = u32::try_from(spec.page_offset) else {
                exn::bail!(ErrorKind::InvalidEntry { key, reason: "page offset must not be negative" });
            };
            let source = match source_dir {
                Some(dir) if spec.source.is_relative() => dir.join(&spec.source),
                _ => spec.source,
            };
            let entry = CatalogEntry::new(key.clone(), spec.name, source, page_offset, spec.departments);
            entries.insert(key, entry);
        }
        tracing::debug!(entries = entries.len(), "Handbook catalog built");
        Ok(Self { entries })
    }

    /// The built-in table of faculties.
    pub fn builtin(source_dir: Option<&Path>) -> Result<Self> {
        Self::new(builtin::entries(), source_dir)
    }

    /// Resolve a key to its entry.
    pub fn lookup(&self, key: &str) -> Result<&CatalogEntry> {
        match self.entries.get(key) {
            Some(entry) => Ok(entry),
            None => exn::bail!(ErrorKind::UnknownKey(key.to_string())),
        }
    }

    /// Resolve a key and one of its departments, returning the entry and
    /// the department's human-readable name.
    pub fn department(&self, key: &str, department: &str) -> Result<(&CatalogEntry, &str)> {
        let entry = self.lookup(key)?;
        match entry.department(department) {
            Some(name) => Ok((entry, name)),
            None => exn::bail!(ErrorKind::UnknownDepartment {
                key: key.to_string(),
                department: department.to_string(),
            }),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
