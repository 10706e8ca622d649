//! # pagemark
//!
//! Layout-aware conversion of PDF pages into Markdown for text embedding
//! and retrieval.
//!
//! Text boxes, table regions and images are extracted independently per
//! page, then reconciled: text that duplicates a table is dropped, headings
//! are inferred from font-size statistics, and everything is sequenced top
//! to bottom, left to right.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pagemark::{convert_file, ConvertConfig, TableMode};
//! use std::path::Path;
//!
//! fn main() -> pagemark::Result<()> {
//!     let config = ConvertConfig::new()
//!         .with_table_mode(TableMode::Stream)
//!         .with_image_dir("images");
//!
//!     let doc = convert_file(Path::new("report.pdf"), Path::new("raw.md"), &config)?;
//!     println!("{} pages, {} tables", doc.page_count(), doc.stats.table_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Reading order**: `(−top, left)` ordering across text, tables and images
//! - **Heading inference**: body size by frequency, larger sizes ranked into levels
//! - **Two table strategies**: ruling lines (lattice) or whitespace alignment (stream)
//! - **Image captioning**: OpenAI-compatible vision models (feature `caption`)
//! - **Parallel pages**: Rayon, with page order preserved

pub mod caption;
pub mod config;
pub mod convert;
pub mod driver;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod layout;
pub mod model;
pub mod repair;

pub use caption::{parse_tagged, Caption, CaptionConfig, Captioner, ImageInfo};
#[cfg(feature = "caption")]
pub use caption::OpenAiCaptioner;
pub use config::{ConvertConfig, TableMode, DEFAULT_MAX_HEADING_LEVEL};
pub use convert::{
    ConvertResult, ConverterRegistry, DocumentConverter, DocxConverter, ImageConverter,
    PdfConverter,
};
pub use driver::PageDriver;
pub use enrich::{enrich_file, enrich_markdown, EnrichReport, Enricher};
pub use error::{Error, Result};
pub use extract::{PageSource, PdfSource};
pub use layout::{clean, HeadingClassifier};
pub use model::{
    BBox, ConversionStats, Document, Element, ElementKind, ExtractedImage, ImageFormat, Page,
    TableRegion, TextRun,
};
pub use repair::MarkdownRepair;

use std::path::Path;

/// Convert a PDF file and write the Markdown to `output`.
///
/// Nothing is written when the PDF cannot be opened.
pub fn convert_file(pdf: &Path, output: &Path, config: &ConvertConfig) -> Result<Document> {
    PageDriver::new(config).convert_file(pdf, output)
}

/// Convert a PDF file with default settings and return the Markdown.
///
/// Images are written to the current directory.
///
/// ```no_run
/// let markdown = pagemark::to_markdown("report.pdf").unwrap();
/// std::fs::write("raw.md", markdown).unwrap();
/// ```
pub fn to_markdown<P: AsRef<Path>>(path: P) -> Result<String> {
    let source = PdfSource::open(path)?;
    let config = ConvertConfig::default();
    Ok(PageDriver::new(&config).convert(&source).to_markdown())
}

/// Convert a PDF held in memory.
pub fn convert_bytes(data: &[u8], config: &ConvertConfig) -> Result<Document> {
    let source = PdfSource::from_bytes(data)?;
    std::fs::create_dir_all(&config.image_dir)?;
    Ok(PageDriver::new(config).convert(&source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_bytes_empty_data() {
        let result = convert_bytes(&[], &ConvertConfig::default());
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_convert_bytes_truncated_pdf() {
        let result = convert_bytes(b"%PDF-1.7\n%garbage", &ConvertConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_convert_file_missing_source() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("raw.md");
        let config = ConvertConfig::new().with_image_dir(dir.path());
        let result = convert_file(&dir.path().join("absent.pdf"), &out, &config);
        assert!(result.is_err());
        assert!(!out.exists());
    }

    #[test]
    fn test_to_markdown_missing_file() {
        assert!(to_markdown("definitely/not/here.pdf").is_err());
    }
}
