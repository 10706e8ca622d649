//! Layout reconstruction: cleaning, heading inference, table/text
//! deduplication and reading order.
//!
//! Every function here is pure and page-local; the [`crate::driver`] feeds
//! it extraction results and owns all I/O.

mod cleaner;
mod heading;
mod overlap;
mod sequence;

pub use cleaner::{clean, clean_bytes};
pub use heading::{Classification, HeadingClassifier};
pub use overlap::{filter_overlapping, overlaps_any, OVERLAP_MARGIN};
pub use sequence::{image_reference, reading_order, render, render_table, sequence};

use crate::config::ConvertConfig;
use crate::model::{BBox, Element, Page};

/// The elements built for one page, grouped by source.
#[derive(Debug, Clone, Default)]
pub struct PageElements {
    /// Cleaned, non-empty text elements
    pub texts: Vec<Element>,
    /// Serialized, non-blank tables
    pub tables: Vec<Element>,
    /// Image references whose files have been written
    pub images: Vec<Element>,
}

/// Run overlap filtering, heading classification and sequencing for one page.
pub fn reconstruct(number: u32, parts: PageElements, config: &ConvertConfig) -> Page {
    let PageElements {
        texts,
        tables,
        images,
    } = parts;

    let table_boxes: Vec<BBox> = tables.iter().map(|t| t.bbox).collect();
    let text_count = texts.len();
    let texts = filter_overlapping(texts, &table_boxes, config.overlap_margin);
    let overlapped = text_count - texts.len();

    let classification = HeadingClassifier::new(config.max_heading_level)
        .classify(texts.iter().filter_map(|t| t.font_size));
    let texts = classification.apply(texts);

    let mut elements = Vec::with_capacity(tables.len() + texts.len() + images.len());
    elements.extend(tables);
    elements.extend(texts);
    elements.extend(images);

    let mut page = Page::new(number);
    page.elements = sequence(elements);
    page.body_font_size = classification.body_size();
    page.heading_levels = classification.levels().to_vec();
    page.overlapped_text = overlapped as u32;
    page
}
