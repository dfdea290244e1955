use crate::PdfTools;
use crate::error::{ErrorKind, Result};
use crate::label::label;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::instrument;

/// Text of a single physical page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-indexed physical page number.
    pub number: u32,
    pub text: String,
}

/// All pages of a document, in physical page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub pages: Vec<Page>,
    pub total_pages: u32,
    /// Pages whose extraction failed and were replaced with empty text.
    pub failed_pages: Vec<u32>,
}
impl Extraction {
    /// Render the labelled text of the document.
    pub fn label(&self, page_offset: u32) -> String {
        label(&self.pages, page_offset)
    }
}

/// Extracts every page of a PDF through a [`PdfTools`] implementation.
///
/// Pages are extracted one process at a time by default. With more than one
/// worker, pages are distributed across scoped threads; output order is
/// always physical page order.
pub struct PageExtractor<T> {
    tools: T,
    workers: NonZeroUsize,
}
impl<T: PdfTools> PageExtractor<T> {
    pub fn new(tools: T) -> Self {
        Self { tools, workers: NonZeroUsize::MIN }
    }

    pub fn with_workers(mut self, workers: NonZeroUsize) -> Self {
        self.workers = workers;
        self
    }

    pub fn tools(&self) -> &T {
        &self.tools
    }

    /// Extract the text of every page in `source`.
    ///
    /// Fails with [`MetadataUnavailable`](ErrorKind::MetadataUnavailable)
    /// when the page count cannot be determined (zero pages included). A
    /// failure on an individual page is logged and the page is kept with
    /// empty text: one malformed page should not make the rest of a
    /// handbook unavailable.
    #[instrument(skip(self), fields(source = %source.display()))]
    pub fn extract(&self, source: &Path) -> Result<Extraction> {
        let total_pages = self.tools.page_count(source)?;
        if total_pages == 0 {
            exn::bail!(ErrorKind::MetadataUnavailable(source.to_path_buf()));
        }
        let workers = self.workers.get().min(total_pages as usize);
        let results: Vec<(Page, bool)> = match workers {
            1 => (1..=total_pages).map(|number| self.extract_page(source, number)).collect(),
            _ => self.extract_parallel(source, total_pages, workers),
        };
        let mut pages = Vec::with_capacity(results.len());
        let mut failed_pages = Vec::new();
        for (page, ok) in results {
            if !ok {
                failed_pages.push(page.number);
            }
            pages.push(page);
        }
        tracing::info!(total_pages, failed = failed_pages.len(), "Extracted document text");
        Ok(Extraction { pages, total_pages, failed_pages })
    }

    fn extract_page(&self, source: &Path, number: u32) -> (Page, bool) {
        match self.tools.extract_range(source, number, number) {
            Ok(text) => (Page { number, text }, true),
            Err(e) => {
                let e = e.raise(ErrorKind::PageUnavailable(number));
                tracing::warn!(page = number, error = ?e, "Page extraction failed; continuing with empty text");
                (Page { number, text: String::new() }, false)
            },
        }
    }

    fn extract_parallel(&self, source: &Path, total_pages: u32, workers: usize) -> Vec<(Page, bool)> {
        let next = AtomicU32::new(1);
        let results = Mutex::new(Vec::with_capacity(total_pages as usize));
        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| {
                    loop {
                        let number = next.fetch_add(1, Ordering::Relaxed);
                        if number > total_pages {
                            break;
                        }
                        let result = self.extract_page(source, number);
                        results.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).push(result);
                    }
                });
            }
        });
        let mut results = results.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
        results.sort_unstable_by_key(|(page, _)| page.number);
        results
    }
}
