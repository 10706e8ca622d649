//! PDF extraction collaborators.
//!
//! A [`PageSource`] answers three questions about a page: which text
//! runs it carries, which tables it holds and which images it draws.
//! [`PdfSource`] answers them from the page's content stream.

mod backend;
mod content;
mod lattice;
mod stream;
mod text;
mod xobject;

pub use backend::{decode_content, decode_text_simple, ContentOp, FontLookup, PdfBackend, PdfValue};
pub use content::{interpret, ImagePlacement, PageScan, Segment, TextSpan};
pub use stream::{StreamConfig, StreamDetector};
pub use text::group_runs;
pub use xobject::extract_images;

use std::path::Path;

use crate::config::TableMode;
use crate::error::{Error, Result};
use crate::model::{ExtractedImage, TableRegion, TextRun};

/// Per-page access to extracted content.
///
/// Pages are 1-indexed. Implementations must be shareable across threads
/// because the driver may query pages in parallel.
pub trait PageSource: Sync {
    /// Number of pages.
    fn page_count(&self) -> u32;

    /// Horizontal text boxes, each carrying its text, bbox and size.
    fn text_runs(&self, page: u32) -> Result<Vec<TextRun>>;

    /// Table regions found with the given strategy.
    fn tables(&self, page: u32, mode: TableMode) -> Result<Vec<TableRegion>>;

    /// Embedded images with their placement.
    fn images(&self, page: u32) -> Result<Vec<ExtractedImage>>;
}

/// A [`PageSource`] backed by a parsed PDF.
pub struct PdfSource {
    backend: PdfBackend,
    stream: StreamDetector,
}

impl PdfSource {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let backend = PdfBackend::load_file(path)?;
        Ok(Self::new(backend))
    }

    /// Parse a PDF held in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if !data.starts_with(b"%PDF-") {
            return Err(Error::UnknownFormat);
        }
        let backend = PdfBackend::load_bytes(data)?;
        Ok(Self::new(backend))
    }

    fn new(backend: PdfBackend) -> Self {
        log::debug!("Opened PDF with {} pages", backend.page_count());
        Self {
            backend,
            stream: StreamDetector::new(),
        }
    }

    /// Use custom thresholds for whitespace-aligned tables.
    pub fn with_stream_config(mut self, config: StreamConfig) -> Self {
        self.stream = StreamDetector::with_config(config);
        self
    }

    /// The underlying document.
    pub fn backend(&self) -> &PdfBackend {
        &self.backend
    }

    fn scan(&self, page: u32) -> Result<PageScan> {
        let id = self.backend.page_id(page)?;
        let data = self.backend.page_content(id)?;
        let ops = decode_content(&data)?;
        let fonts = self.backend.page_fonts(id)?;
        Ok(interpret(&ops, &fonts))
    }
}

impl PageSource for PdfSource {
    fn page_count(&self) -> u32 {
        self.backend.page_count()
    }

    fn text_runs(&self, page: u32) -> Result<Vec<TextRun>> {
        let scan = self.scan(page).map_err(|e| stage_error(e, page, Error::TextExtract))?;
        Ok(group_runs(scan.spans))
    }

    fn tables(&self, page: u32, mode: TableMode) -> Result<Vec<TableRegion>> {
        let scan = self.scan(page).map_err(|e| stage_error(e, page, Error::TableExtract))?;
        Ok(match mode {
            TableMode::Lattice => lattice::detect(&scan.segments, &scan.spans),
            TableMode::Stream => self.stream.detect(&scan.spans),
        })
    }

    fn images(&self, page: u32) -> Result<Vec<ExtractedImage>> {
        let scan = self.scan(page).map_err(|e| stage_error(e, page, Error::ImageExtract))?;
        let id = self.backend.page_id(page)?;
        Ok(extract_images(&self.backend, id, &scan.placements))
    }
}

/// Tag a scan failure with the stage and page it broke.
fn stage_error(err: Error, page: u32, stage: fn(String) -> Error) -> Error {
    match err {
        Error::PageOutOfRange(..) | Error::Encrypted => err,
        other => stage(format!("page {}: {}", page, other)),
    }
}
