//! Page elements: the unit of layout reconstruction.

use serde::{Deserialize, Serialize};

use super::BBox;

/// Kind of a page element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "level", rename_all = "lowercase")]
pub enum ElementKind {
    /// Plain prose
    Text,
    /// Text promoted to a heading of the given level (1 = most prominent)
    Heading(u8),
    /// A serialized Markdown table block
    Table,
    /// A Markdown image reference
    Image,
}

/// A typed, positioned unit of page content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Element kind
    pub kind: ElementKind,

    /// Finalized Markdown payload
    pub content: String,

    /// Position on the page
    pub bbox: BBox,

    /// Largest glyph size (text only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,

    /// Whether any glyph uses a bold face (text only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_bold: Option<bool>,
}

impl Element {
    /// Create a text element.
    pub fn text(content: impl Into<String>, bbox: BBox, font_size: f32, is_bold: bool) -> Self {
        Self {
            kind: ElementKind::Text,
            content: content.into(),
            bbox,
            font_size: Some(font_size),
            is_bold: Some(is_bold),
        }
    }

    /// Create a table element from an already serialized block.
    pub fn table(content: impl Into<String>, bbox: BBox) -> Self {
        Self {
            kind: ElementKind::Table,
            content: content.into(),
            bbox,
            font_size: None,
            is_bold: None,
        }
    }

    /// Create an image element from an already serialized reference.
    pub fn image(content: impl Into<String>, bbox: BBox) -> Self {
        Self {
            kind: ElementKind::Image,
            content: content.into(),
            bbox,
            font_size: None,
            is_bold: None,
        }
    }

    /// Reading-order key: top to bottom, then left to right.
    pub fn sort_key(&self) -> (f32, f32) {
        (-self.bbox.y1, self.bbox.x0)
    }

    /// Whether this element is (unclassified) prose.
    pub fn is_text(&self) -> bool {
        self.kind == ElementKind::Text
    }

    /// Heading level, if this element is a heading.
    pub fn heading_level(&self) -> Option<u8> {
        match self.kind {
            ElementKind::Heading(level) => Some(level),
            _ => None,
        }
    }

    /// Promote a text element to a heading, prefixing `level + 1` hashes.
    ///
    /// Level 1 renders as `##`; a single `#` is reserved for page titles.
    pub fn into_heading(mut self, level: u8) -> Self {
        let hashes = "#".repeat(level as usize + 1);
        self.content = format!("{} {}", hashes, self.content);
        self.kind = ElementKind::Heading(level);
        self
    }
}
