//! Handbook text extraction.
//!
//! Turns a source PDF into page-numbered plain text in two steps:
//!
//! 1. [`PageExtractor`] asks a [`PdfTools`] implementation (normally
//!    [`Poppler`]) for the page count, then for the text of each physical
//!    page.
//! 2. [`label`] renders those pages into a single text, introducing each
//!    one with a [`PageMarker`] that uses the handbook's own page numbers.

pub mod error;
mod extractor;
mod label;
mod poppler;
mod tools;

pub use crate::extractor::{Extraction, Page, PageExtractor};
pub use crate::label::{FRONT_MATTER, PageMarker, label};
pub use crate::poppler::{Poppler, Tool, parse_page_count};
pub use crate::tools::PdfTools;

