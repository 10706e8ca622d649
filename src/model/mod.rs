//! Document model: page elements and extraction records.

mod bbox;
mod document;
mod element;
mod page;
mod resource;
mod run;
mod table;

pub use bbox::BBox;
pub use document::{ConversionStats, Document};
pub use element::{Element, ElementKind};
pub use page::Page;
pub use resource::{ExtractedImage, ImageFormat};
pub use run::{is_bold_font_name, TextRun};
pub use table::TableRegion;
