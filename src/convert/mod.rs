//! Document converters keyed by file extension.
//!
//! # Example
//!
//! ```no_run
//! use pagemark::convert::ConverterRegistry;
//! use pagemark::ConvertConfig;
//! use std::path::Path;
//!
//! fn main() -> pagemark::Result<()> {
//!     let registry = ConverterRegistry::with_defaults();
//!     let config = ConvertConfig::new().with_image_dir("images");
//!
//!     let result = registry.convert(Path::new("report.pdf"), &config)?;
//!     println!("{}", result.content);
//!     Ok(())
//! }
//! ```

mod docx;
mod image;
mod pdf;

pub use self::docx::DocxConverter;
pub use self::image::{ImageConverter, IMAGE_EXTENSIONS};
pub use self::pdf::PdfConverter;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::config::ConvertConfig;
use crate::error::{Error, Result};
use crate::model::ConversionStats;

/// Output of a conversion.
#[derive(Debug, Clone)]
pub struct ConvertResult {
    /// Markdown text
    pub content: String,

    /// Page statistics, for converters that reconstruct page layout
    pub stats: Option<ConversionStats>,

    /// MIME type of `content`
    pub mime_type: &'static str,
}

impl ConvertResult {
    /// Markdown content without statistics.
    pub fn markdown(content: String) -> Self {
        Self {
            content,
            stats: None,
            mime_type: "text/markdown",
        }
    }

    pub fn with_stats(mut self, stats: ConversionStats) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Content length in bytes.
    pub fn content_len(&self) -> usize {
        self.content.len()
    }
}

/// A converter from some document format to Markdown.
pub trait DocumentConverter: Send + Sync {
    /// Lowercase extensions without the leading dot, e.g. `["pdf"]`.
    fn supported_extensions(&self) -> &[&str];

    /// Converter name.
    fn name(&self) -> &str;

    /// Convert the file at `path`.
    fn convert(&self, path: &Path, config: &ConvertConfig) -> Result<ConvertResult>;

    fn supports_extension(&self, ext: &str) -> bool {
        let ext = ext.to_lowercase();
        self.supported_extensions().iter().any(|e| *e == ext)
    }
}

/// Maps file extensions and names to converters.
pub struct ConverterRegistry {
    converters: HashMap<String, Arc<dyn DocumentConverter>>,
    by_name: HashMap<String, Arc<dyn DocumentConverter>>,
}

impl ConverterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            converters: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Registry with the PDF, Word and image converters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PdfConverter::new()));
        registry.register(Arc::new(DocxConverter::new()));
        registry.register(Arc::new(ImageConverter::new()));
        registry
    }

    /// Register a converter for all its extensions. Later registrations
    /// replace earlier ones for the same extension.
    pub fn register(&mut self, converter: Arc<dyn DocumentConverter>) {
        for ext in converter.supported_extensions() {
            self.converters.insert(ext.to_lowercase(), converter.clone());
        }
        self.by_name.insert(converter.name().to_lowercase(), converter);
    }

    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn DocumentConverter>> {
        self.converters.get(&ext.to_lowercase()).cloned()
    }

    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn DocumentConverter>> {
        self.by_name.get(&name.to_lowercase()).cloned()
    }

    pub fn supports(&self, ext: &str) -> bool {
        self.converters.contains_key(&ext.to_lowercase())
    }

    /// All registered extensions, sorted.
    pub fn supported_extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.converters.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }

    /// Convert a file with the converter registered for its extension.
    pub fn convert(&self, path: &Path, config: &ConvertConfig) -> Result<ConvertResult> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::UnsupportedExtension(String::new()))?;

        let converter = self
            .get_by_extension(ext)
            .ok_or_else(|| Error::UnsupportedExtension(ext.to_string()))?;

        log::debug!("Converting {} with the {} converter", path.display(), converter.name());
        converter.convert(path, config)
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
