use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Raw description of a handbook, as written in configuration or in the
/// built-in table.
///
/// `page_offset` is signed so that a negative value can be reported as a
/// configuration error instead of failing deserialization with a less
/// helpful message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct EntrySpec {
    pub name: String,
    pub source: PathBuf,
    #[cfg_attr(feature = "serde", serde(default = "default_offset"))]
    pub page_offset: i64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub departments: BTreeMap<String, String>,
}

#[cfg(feature = "serde")]
fn default_offset() -> i64 {
    1
}

/// A validated, immutable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    key: String,
    name: String,
    source: PathBuf,
    page_offset: u32,
    departments: BTreeMap<String, String>,
}

impl CatalogEntry {
    pub(crate) fn new(
        key: String,
        name: String,
        source: PathBuf,
        page_offset: u32,
        departments: BTreeMap<String, String>,
    ) -> Self {
        Self { key, name, source, page_offset, departments }
    }

    /// Unique identifier, also used to name the persisted document.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Human-readable name of the handbook's faculty.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Location of the source PDF.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Physical page number on which logical page 1 starts.
    pub fn page_offset(&self) -> u32 {
        self.page_offset
    }

    /// Department key to human-readable name.
    pub fn departments(&self) -> &BTreeMap<String, String> {
        &self.departments
    }

    pub fn department(&self, key: &str) -> Option<&str> {
        self.departments.get(key).map(String::as_str)
    }
}
