//! PDF converter: layout reconstruction through the page driver.

use std::fs;
use std::path::Path;

use crate::config::ConvertConfig;
use crate::driver::PageDriver;
use crate::error::Result;
use crate::extract::PdfSource;
use crate::model::Document;

use super::{ConvertResult, DocumentConverter};

/// Converts PDF documents to page-sectioned Markdown.
#[derive(Debug, Clone, Default)]
pub struct PdfConverter {
    _private: (),
}

impl PdfConverter {
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Convert a PDF held in memory.
    pub fn convert_bytes(&self, bytes: &[u8], config: &ConvertConfig) -> Result<ConvertResult> {
        let source = PdfSource::from_bytes(bytes)?;
        fs::create_dir_all(&config.image_dir)?;
        Ok(into_result(PageDriver::new(config).convert(&source)))
    }
}

fn into_result(document: Document) -> ConvertResult {
    ConvertResult::markdown(document.to_markdown()).with_stats(document.stats)
}

impl DocumentConverter for PdfConverter {
    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }

    fn name(&self) -> &str {
        "pdf"
    }

    fn convert(&self, path: &Path, config: &ConvertConfig) -> Result<ConvertResult> {
        let source = PdfSource::open(path)?;
        fs::create_dir_all(&config.image_dir)?;
        Ok(into_result(PageDriver::new(config).convert(&source)))
    }
}
