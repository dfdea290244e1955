#![allow(dead_code)]

use binran_catalog::{Catalog, EntrySpec};
use binran_extract::error::{ErrorKind as ExtractErrorKind, Result as ExtractResult};
use binran_extract::{PageExtractor, PdfTools};
use binran_library::{Library, Tools};
use binran_storage::DocumentStore;
use binran_storage::backend::MockBackend;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

/// Serves `page N of <file>` for every page of the PDFs it knows about.
#[derive(Default)]
pub struct FakeTools {
    pages: HashMap<PathBuf, AtomicU32>,
    broken: HashSet<u32>,
    delay: Option<Duration>,
    pub page_counts: AtomicUsize,
    pub page_extractions: AtomicUsize,
}

impl FakeTools {
    pub fn new(documents: impl IntoIterator<Item = (&'static str, u32)>) -> Self {
        Self {
            pages: documents.into_iter().map(|(path, pages)| (PathBuf::from(path), AtomicU32::new(pages))).collect(),
            ..Self::default()
        }
    }

    pub fn with_broken(mut self, pages: impl IntoIterator<Item = u32>) -> Self {
        self.broken = pages.into_iter().collect();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Change the reported page count, as if the PDF had been replaced.
    pub fn set_pages(&self, path: &str, pages: u32) {
        if let Some(count) = self.pages.get(Path::new(path)) {
            count.store(pages, Ordering::SeqCst);
        }
    }

    pub fn page_counts(&self) -> usize {
        self.page_counts.load(Ordering::SeqCst)
    }
}

impl PdfTools for FakeTools {
    fn page_count(&self, source: &Path) -> ExtractResult<u32> {
        self.page_counts.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        match self.pages.get(source) {
            Some(pages) => Ok(pages.load(Ordering::SeqCst)),
            None => exn::bail!(ExtractErrorKind::SourceNotFound(source.to_path_buf())),
        }
    }

    fn extract_range(&self, source: &Path, first: u32, _last: u32) -> ExtractResult<String> {
        self.page_extractions.fetch_add(1, Ordering::SeqCst);
        if self.broken.contains(&first) {
            exn::bail!(ExtractErrorKind::PageUnavailable(first));
        }
        let name = source.file_stem().and_then(|stem| stem.to_str()).unwrap_or_default();
        Ok(format!("page {first} of {name}"))
    }
}

fn entry(name: &str, source: &str, page_offset: i64) -> EntrySpec {
    EntrySpec {
        name: name.to_string(),
        source: PathBuf::from(source),
        page_offset,
        departments: BTreeMap::new(),
    }
}

pub fn catalog() -> Catalog {
    let mut engineering = entry("工学部", "kougaku.pdf", 6);
    engineering.departments.insert("architecture".to_string(), "建築学科".to_string());
    Catalog::new(
        [
            ("engineering", engineering),
            ("letters", entry("文学部", "bungaku.pdf", 17)),
            ("science", entry("理学部", "rigaku.pdf", 1)),
        ],
        Some(Path::new("/srv/pdf")),
    )
    .unwrap()
}

pub fn engineering_tools() -> FakeTools {
    FakeTools::new([("/srv/pdf/kougaku.pdf", 8), ("/srv/pdf/bungaku.pdf", 20), ("/srv/pdf/rigaku.pdf", 3)])
}

pub struct Fixture {
    pub library: Library,
    pub tools: Arc<FakeTools>,
    pub backend: Arc<MockBackend>,
}

pub fn fixture(tools: FakeTools, backend: MockBackend) -> Fixture {
    let tools = Arc::new(tools);
    let backend = Arc::new(backend);
    let extractor = PageExtractor::new(Arc::clone(&tools) as Tools);
    let library = Library::new(catalog(), DocumentStore::new(backend.clone()), extractor);
    Fixture { library, tools, backend }
}
