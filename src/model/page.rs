//! Page-level types.

use serde::{Deserialize, Serialize};

use super::{Element, ElementKind};

/// One reconstructed page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Surviving elements in reading order
    pub elements: Vec<Element>,

    /// Most frequent text size on the page
    pub body_font_size: Option<f32>,

    /// Heading sizes, largest first, with their assigned level
    pub heading_levels: Vec<(f32, u8)>,

    /// Text elements dropped because they overlapped a table
    pub overlapped_text: u32,

    /// Tables skipped because every cell was blank
    pub blank_tables: u32,

    /// Recoverable problems hit while building this page
    pub warnings: Vec<String>,
}

impl Page {
    /// Create an empty page.
    pub fn new(number: u32) -> Self {
        Self {
            number,
            ..Default::default()
        }
    }

    /// Render the page section: `# Page N` followed by every element.
    pub fn to_markdown(&self) -> String {
        let mut out = format!("# Page {}\n\n", self.number);
        out.push_str(&crate::layout::render(&self.elements));
        out
    }

    /// Count elements of a given kind (any heading level matches `Heading(_)`).
    pub fn count(&self, kind: ElementKind) -> usize {
        self.elements
            .iter()
            .filter(|e| match (e.kind, kind) {
                (ElementKind::Heading(_), ElementKind::Heading(_)) => true,
                (a, b) => a == b,
            })
            .count()
    }

    /// Check if the page has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BBox;

    #[test]
    fn test_empty_page_markdown() {
        let page = Page::new(3);
        assert_eq!(page.to_markdown(), "# Page 3\n\n");
        assert!(page.is_empty());
    }

    #[test]
    fn test_page_markdown_concatenates_elements() {
        let mut page = Page::new(1);
        page.elements.push(
            Element::text("Title", BBox::new(0.0, 700.0, 100.0, 720.0), 18.0, false)
                .into_heading(1),
        );
        page.elements
            .push(Element::text("Body", BBox::new(0.0, 600.0, 100.0, 620.0), 12.0, false));
        assert_eq!(page.to_markdown(), "# Page 1\n\n## Title\n\nBody\n\n");
        assert_eq!(page.count(ElementKind::Heading(0)), 1);
        assert_eq!(page.count(ElementKind::Text), 1);
    }
}
