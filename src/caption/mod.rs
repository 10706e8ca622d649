//! Image captioning.
//!
//! A [`Captioner`] turns an image file into a [`Caption`]: the text it
//! contains, a description and its contextual meaning. Vision models are
//! asked to wrap each part in `<OCR>`, `<DESC>` and `<CONTEXT>` tags,
//! which [`parse_tagged`] pulls back out.

#[cfg(feature = "caption")]
mod http;

#[cfg(feature = "caption")]
pub use http::OpenAiCaptioner;

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default vision model.
pub const DEFAULT_MODEL: &str = "gpt-4-vision-preview";

/// Line breaks in a response are replaced by this marker before parsing,
/// keeping every caption field on one Markdown line.
pub const LINE_MARKER: &str = "|+|";

/// What a vision model reported about one image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caption {
    /// Text visible in the image
    pub ocr: String,
    /// Description of the image content
    pub desc: String,
    /// Meaning of the image in its document
    pub context: String,
}

/// Produces captions for image files.
pub trait Captioner: Send + Sync {
    /// Caption the image at `image`. `context` carries surrounding text,
    /// typically the Markdown alt text.
    fn caption(&self, image: &Path, context: Option<&str>) -> Result<Caption>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Ocr,
    Desc,
    Context,
}

impl Tag {
    const ALL: [Tag; 3] = [Tag::Ocr, Tag::Desc, Tag::Context];

    fn open(self) -> &'static str {
        match self {
            Tag::Ocr => "<OCR>",
            Tag::Desc => "<DESC>",
            Tag::Context => "<CONTEXT>",
        }
    }

    fn close(self) -> &'static str {
        match self {
            Tag::Ocr => "</OCR>",
            Tag::Desc => "</DESC>",
            Tag::Context => "</CONTEXT>",
        }
    }
}

/// Extract the tagged sections of a model response.
///
/// Newlines and `<br>` become [`LINE_MARKER`]. Each tag is searched on its
/// own from the start of the response, so one tag may sit inside another.
/// A closed tag captures up to its closing tag; a tag left open captures up
/// to the next opening tag or the end of the response. Only the first
/// occurrence of each tag counts and missing tags leave their field empty.
pub fn parse_tagged(response: &str) -> Caption {
    let text = response
        .replace("\r\n", "\n")
        .replace('\n', LINE_MARKER)
        .replace("<br>", LINE_MARKER);

    let section = |tag: Tag| -> String {
        let Some(open) = text.find(tag.open()) else {
            return String::new();
        };
        let start = open + tag.open().len();
        let rest = &text[start..];
        let end = rest
            .find(tag.close())
            .or_else(|| next_open(&text, start).map(|(at, _)| at - start))
            .unwrap_or(rest.len());
        rest[..end].to_string()
    };

    Caption {
        ocr: section(Tag::Ocr),
        desc: section(Tag::Desc),
        context: section(Tag::Context),
    }
}

/// Earliest opening tag at or after `from`.
fn next_open(text: &str, from: usize) -> Option<(usize, Tag)> {
    Tag::ALL
        .iter()
        .filter_map(|&tag| text[from..].find(tag.open()).map(|i| (from + i, tag)))
        .min_by_key(|(at, _)| *at)
}

/// Settings for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct CaptionConfig {
    /// API base URL, without the trailing `/chat/completions`
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Bearer token
    pub api_key: Option<String>,
    /// Completion length cap
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            max_tokens: 1024,
            temperature: 0.7,
            timeout: Duration::from_secs(120),
        }
    }
}

impl CaptionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with `OPENAI_API_KEY`, `BASE_URL`, `MODEL`,
    /// `TEMPERATURE` and `MAX_TOKENS` from the environment.
    pub fn from_env() -> Result<Self> {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Apply values found by `lookup`; empty values are ignored.
    pub fn overlay<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(url) = get("BASE_URL") {
            self = self.with_base_url(url);
        }
        if let Some(model) = get("MODEL") {
            self.model = model;
        }
        if let Some(value) = get("TEMPERATURE") {
            let temperature = value
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("TEMPERATURE is not a number: {}", value)))?;
            self.temperature = temperature;
        }
        if let Some(value) = get("MAX_TOKENS") {
            let max_tokens = value
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("MAX_TOKENS is not an integer: {}", value)))?;
            self.max_tokens = max_tokens;
        }
        Ok(self)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `{base_url}/chat/completions`
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Format and pixel size of an image file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Lowercase format name (`png`, `jpeg`, ...), or `unknown`
    pub format: String,
    pub width: u32,
    pub height: u32,
}

impl ImageInfo {
    /// Read the header of an image file. Unreadable files report
    /// `unknown` and `0x0`.
    pub fn probe(path: &Path) -> Self {
        match Self::try_probe(path) {
            Ok(info) => info,
            Err(e) => {
                log::warn!("Could not read image info for {}: {}", path.display(), e);
                Self::unknown()
            }
        }
    }

    fn try_probe(path: &Path) -> Result<Self> {
        let reader = image::ImageReader::open(path)?.with_guessed_format()?;
        let format = reader.format().map(format_name).unwrap_or("unknown");
        let (width, height) = reader.into_dimensions()?;
        Ok(Self {
            format: format.to_string(),
            width,
            height,
        })
    }

    fn unknown() -> Self {
        Self {
            format: "unknown".to_string(),
            width: 0,
            height: 0,
        }
    }

    /// `{width}x{height}`
    pub fn size(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

fn format_name(format: image::ImageFormat) -> &'static str {
    match format {
        image::ImageFormat::Jpeg => "jpeg",
        image::ImageFormat::Png => "png",
        image::ImageFormat::Gif => "gif",
        image::ImageFormat::Bmp => "bmp",
        other => other.extensions_str().first().copied().unwrap_or("unknown"),
    }
}
