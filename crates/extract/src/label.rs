//! Physical to logical page numbering.
//!
//! Handbooks open with covers and tables of contents that carry no printed
//! page number. The page offset of a handbook is the physical page on which
//! printed page 1 appears; everything before it is front matter.

use crate::Page;
use std::fmt::{self, Write};

/// Label given to pages before the offset (covers, tables of contents...).
pub const FRONT_MATTER: &str = "表紙/目次など";

/// The marker line introducing each page block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMarker {
    /// A content page, numbered as printed in the handbook.
    Content(u32),
    /// A front matter page, numbered by its physical position.
    FrontMatter(u32),
}
impl PageMarker {
    /// Marker for the 1-indexed `physical` page.
    ///
    /// An offset of 0 is treated like 1: the document has no front matter.
    pub fn for_page(physical: u32, page_offset: u32) -> Self {
        let page_offset = page_offset.max(1);
        match physical >= page_offset {
            true => Self::Content(physical - page_offset + 1),
            false => Self::FrontMatter(physical),
        }
    }
}
impl fmt::Display for PageMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content(n) => write!(f, "--- PAGE {n} ---"),
            Self::FrontMatter(n) => write!(f, "--- PAGE {n} ({FRONT_MATTER}) ---"),
        }
    }
}

/// Render pages into a single text, each page introduced by its
/// [`PageMarker`] and followed by a blank line.
///
/// Pages are written in the order given, which callers keep as physical
/// page order.
pub fn label<'a>(pages: impl IntoIterator<Item = &'a Page>, page_offset: u32) -> String {
    let mut out = String::new();
    for page in pages {
        // Writing to a String cannot fail.
        _ = write!(out, "{}\n{}\n\n", PageMarker::for_page(page.number, page_offset), page.text);
    }
    out
}
