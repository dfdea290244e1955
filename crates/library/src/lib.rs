//! Handbook library: the catalog, the document store, the extractor and the
//! in-memory cache, wired together.
//!
//! A request for a handbook is validated against the catalog first. The
//! cache then makes sure that, however many requests arrive at once, the
//! handbook is loaded from the store or extracted from its PDF exactly once
//! per process; the extracted text is written back to the store so the next
//! process can skip extraction.

mod convert;
pub mod error;
mod materialize;

pub use crate::convert::ConvertEvent;
use crate::error::{ErrorKind, Result};
use binran_cache::{CacheState, DocumentCache};
use binran_catalog::{Catalog, CatalogEntry, error::ErrorKind as CatalogErrorKind};
use binran_extract::{PageExtractor, PdfTools};
use binran_storage::DocumentStore;
use exn::ResultExt;
use std::sync::Arc;

/// Fully labelled text of one handbook.
pub type Handbook = Arc<str>;
/// Shared, type-erased PDF tooling.
pub type Tools = Arc<dyn PdfTools>;

/// Maximum number of handbooks converted at once by [`Library::convert`].
pub const MAX_CONVERT_CONCURRENCY: usize = 4;

pub struct Library {
    catalog: Arc<Catalog>,
    store: DocumentStore,
    extractor: Arc<PageExtractor<Tools>>,
    cache: DocumentCache<Handbook>,
}

impl Library {
    pub fn new(catalog: impl Into<Arc<Catalog>>, store: DocumentStore, extractor: PageExtractor<Tools>) -> Self {
        Self {
            catalog: catalog.into(),
            store,
            extractor: Arc::new(extractor),
            cache: DocumentCache::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Where a handbook stands in the in-memory cache.
    pub fn cache_state(&self, key: &str) -> CacheState {
        self.cache.state(key)
    }

    /// Resolve a handbook key against the catalog.
    pub fn entry(&self, key: &str) -> Result<&CatalogEntry> {
        self.catalog.lookup(key).or_raise(|| ErrorKind::UnknownKey(key.to_string()))
    }

    /// Resolve a handbook key and one of its departments, returning the
    /// department's display name alongside the entry.
    pub fn department(&self, key: &str, department: &str) -> Result<(&CatalogEntry, &str)> {
        self.catalog.department(key, department).map_err(|err| {
            let kind = match &*err {
                CatalogErrorKind::UnknownDepartment { .. } => ErrorKind::UnknownDepartment {
                    key: key.to_string(),
                    department: department.to_string(),
                },
                _ => ErrorKind::UnknownKey(key.to_string()),
            };
            err.raise(kind)
        })
    }

    /// Return the labelled text of a handbook, materializing it on first
    /// use.
    ///
    /// # Errors
    ///
    /// [`UnknownKey`](ErrorKind::UnknownKey) before anything else is
    /// touched, or [`Unavailable`](ErrorKind::Unavailable) when the handbook
    /// could neither be loaded nor extracted. Failures are not cached.
    #[tracing::instrument(skip(self))]
    pub async fn handbook(&self, key: &str) -> Result<Handbook> {
        let entry = self.entry(key)?;
        let job = materialize::Job {
            key: key.to_string(),
            source: entry.source().to_path_buf(),
            page_offset: entry.page_offset(),
            store: self.store.clone(),
            extractor: Arc::clone(&self.extractor),
        };
        self.cache
            .get_or_load(key, move || job.run())
            .await
            .or_raise(|| ErrorKind::Unavailable(key.to_string()))
    }
}
