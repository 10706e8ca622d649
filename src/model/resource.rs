//! Embedded images pulled out of a page.

use serde::{Deserialize, Serialize};

use super::BBox;

/// Encoded image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// JPEG (DCTDecode)
    Jpeg,
    /// PNG, re-encoded from raw samples
    Png,
    /// JPEG 2000 (JPXDecode)
    Jp2,
}

impl ImageFormat {
    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Jp2 => "jp2",
        }
    }

    /// Detect the format from magic bytes.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(ImageFormat::Png);
        }

        // JP2 signature box, or a raw J2K codestream
        if data.starts_with(&[0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20])
            || data.starts_with(&[0xFF, 0x4F, 0xFF, 0x51])
        {
            return Some(ImageFormat::Jp2);
        }

        None
    }
}

/// An image placed on a page, with its encoded bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedImage {
    /// Zero-based index among the page's images
    pub index: usize,

    /// Encoded image data
    #[serde(skip_serializing)]
    pub bytes: Vec<u8>,

    /// Encoding of `bytes`
    pub format: ImageFormat,

    /// Placement on the page (y grows upward)
    pub bbox: BBox,
}

impl ExtractedImage {
    /// Create an extracted image.
    pub fn new(index: usize, bytes: Vec<u8>, format: ImageFormat, bbox: BBox) -> Self {
        Self {
            index,
            bytes,
            format,
            bbox,
        }
    }

    /// File name for this image on a zero-based page: `image_{page}_{index}.{ext}`.
    pub fn file_name(&self, page_index: usize) -> String {
        format!(
            "image_{}_{}.{}",
            page_index,
            self.index,
            self.format.extension()
        )
    }
}
