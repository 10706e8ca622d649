//! Error types for pagemark.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pagemark operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while converting documents.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not a PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Error extracting text runs from a page.
    #[error("Text extraction error: {0}")]
    TextExtract(String),

    /// Error extracting table regions from a page.
    #[error("Table extraction error: {0}")]
    TableExtract(String),

    /// Error extracting or decoding an embedded image.
    #[error("Image extraction error: {0}")]
    ImageExtract(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// The captioning service failed or returned an unusable answer.
    #[error("Captioning error: {0}")]
    Caption(String),

    /// Captioning was requested without an API key.
    #[error("Captioning API key is not set (use OPENAI_API_KEY or --api-key)")]
    MissingApiKey,

    /// An external program (e.g. pandoc) failed or is not installed.
    #[error("External tool `{tool}` failed: {message}")]
    ExternalTool {
        /// Program name
        tool: String,
        /// Failure description
        message: String,
    },

    /// An input Markdown file was empty or missing.
    #[error("Input is empty: {}", .0.display())]
    EmptyInput(PathBuf),

    /// No converter is registered for a file.
    #[error("No converter for extension: {0}")]
    UnsupportedExtension(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => Error::Io(e),
            _ => Error::ImageExtract(err.to_string()),
        }
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Other(format!("regex: {}", err))
    }
}

#[cfg(feature = "caption")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Caption(err.to_string())
    }
}
