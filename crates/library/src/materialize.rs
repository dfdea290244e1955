//! Loading a handbook on a cache miss.

use crate::error::{ErrorKind, Result};
use crate::{Handbook, Tools};
use binran_extract::PageExtractor;
use binran_storage::DocumentStore;
use exn::ResultExt;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything needed to produce one handbook, owned so that it can outlive
/// the request that started it.
pub(crate) struct Job {
    pub key: String,
    pub source: PathBuf,
    pub page_offset: u32,
    pub store: DocumentStore,
    pub extractor: Arc<PageExtractor<Tools>>,
}

impl Job {
    /// Serve the persisted copy if there is one, otherwise extract, label
    /// and persist.
    #[tracing::instrument(name = "materialize", skip_all, fields(key = %self.key))]
    pub async fn run(self) -> Result<Handbook> {
        if let Some(text) = self.load_stored().await {
            return Ok(text);
        }

        tracing::info!(source = %self.source.display(), page_offset = self.page_offset, "Extracting handbook");
        let Self { key, source, page_offset, store, extractor } = self;
        let text = tokio::task::spawn_blocking(move || extractor.extract(&source).map(|pages| pages.label(page_offset)))
            .await
            .or_raise(|| ErrorKind::Extraction)?
            .or_raise(|| ErrorKind::Extraction)?;

        // The text is still good without a durable copy; the next process
        // just has to extract it again.
        match store.write(&key, &text).await {
            Ok(()) => tracing::info!(chars = text.chars().count(), "Handbook materialized"),
            Err(err) => tracing::warn!(error = ?err, "Failed to persist handbook"),
        }
        Ok(Handbook::from(text))
    }

    /// A stored copy that cannot be read is treated as missing.
    async fn load_stored(&self) -> Option<Handbook> {
        match self.store.has(&self.key).await {
            Ok(true) => {},
            Ok(false) => return None,
            Err(err) => {
                tracing::warn!(error = ?err, "Could not check document store");
                return None;
            },
        }
        match self.store.read(&self.key).await {
            Ok(text) => {
                tracing::info!(chars = text.chars().count(), "Loaded handbook from store");
                Some(Handbook::from(text))
            },
            Err(err) => {
                tracing::warn!(error = ?err, "Stored handbook unreadable; extracting again");
                None
            },
        }
    }
}
