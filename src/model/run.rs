//! Text runs reported by text extraction.

use serde::{Deserialize, Serialize};

use super::BBox;

/// A box of text with its position and font metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// Raw (uncleaned) text
    pub text: String,

    /// Bounding box on the page
    pub bbox: BBox,

    /// Largest glyph size in the box, in points
    pub font_size: f32,

    /// Whether any glyph uses a bold face
    pub is_bold: bool,
}

impl TextRun {
    /// Create a text run.
    pub fn new(text: impl Into<String>, bbox: BBox, font_size: f32, is_bold: bool) -> Self {
        Self {
            text: text.into(),
            bbox,
            font_size,
            is_bold,
        }
    }
}

/// Whether a font name denotes a bold face.
pub fn is_bold_font_name(font_name: &str) -> bool {
    font_name.to_lowercase().contains("bold")
}
