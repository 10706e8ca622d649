//! Document-level types.

use serde::{Deserialize, Serialize};

use super::{ElementKind, Page};

/// A converted document: its pages in order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    /// Pages in document order
    pub pages: Vec<Page>,

    /// Counters collected while converting
    pub stats: ConversionStats,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page and fold its counts into the statistics.
    pub fn add_page(&mut self, page: Page) {
        self.stats.record_page(&page);
        self.pages.push(page);
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Serialize every page section in order.
    pub fn to_markdown(&self) -> String {
        self.pages.iter().map(Page::to_markdown).collect()
    }
}

/// Statistics collected during conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages processed
    pub page_count: u32,

    /// Plain text elements emitted
    pub text_count: u32,

    /// Headings emitted
    pub heading_count: u32,

    /// Tables emitted
    pub table_count: u32,

    /// Images emitted
    pub image_count: u32,

    /// Text elements suppressed because they overlapped a table
    pub overlapped_text_count: u32,

    /// Tables skipped because every cell was blank
    pub blank_table_count: u32,

    /// Recoverable warnings across all pages
    pub warning_count: u32,
}

impl ConversionStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the element counts of one page.
    pub fn record_page(&mut self, page: &Page) {
        self.page_count += 1;
        self.text_count += page.count(ElementKind::Text) as u32;
        self.heading_count += page.count(ElementKind::Heading(0)) as u32;
        self.table_count += page.count(ElementKind::Table) as u32;
        self.image_count += page.count(ElementKind::Image) as u32;
        self.overlapped_text_count += page.overlapped_text;
        self.blank_table_count += page.blank_tables;
        self.warning_count += page.warnings.len() as u32;
    }
}
