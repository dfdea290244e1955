use crate::error::Result;
use std::path::Path;
use std::sync::Arc;

/// External capabilities needed to turn a PDF into per-page text.
///
/// [`Poppler`](crate::Poppler) is the production implementation; tests
/// substitute deterministic fakes so that no binaries need to be installed.
pub trait PdfTools: Send + Sync {
    /// Total number of physical pages in `source`.
    fn page_count(&self, source: &Path) -> Result<u32>;

    /// Plain text of the 1-indexed, inclusive physical page range
    /// `first..=last`.
    fn extract_range(&self, source: &Path, first: u32, last: u32) -> Result<String>;
}

impl<T: PdfTools + ?Sized> PdfTools for Arc<T> {
    fn page_count(&self, source: &Path) -> Result<u32> {
        (**self).page_count(source)
    }

    fn extract_range(&self, source: &Path, first: u32, last: u32) -> Result<String> {
        (**self).extract_range(source, first, last)
    }
}

impl<T: PdfTools + ?Sized> PdfTools for Box<T> {
    fn page_count(&self, source: &Path) -> Result<u32> {
        (**self).page_count(source)
    }

    fn extract_range(&self, source: &Path, first: u32, last: u32) -> Result<String> {
        (**self).extract_range(source, first, last)
    }
}
