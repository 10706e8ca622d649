//! Conversion configuration.
//!
//! A [`ConvertConfig`] is built once (usually from CLI flags) and then
//! handed by reference to every stage of the pipeline.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;
use crate::layout::OVERLAP_MARGIN;

/// Default cap on heading levels.
pub const DEFAULT_MAX_HEADING_LEVEL: u8 = 4;

/// Options for converting a document to Markdown.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Deepest heading level the classifier assigns (level 1 renders as `##`)
    pub max_heading_level: u8,

    /// Table extraction strategy
    pub table_mode: TableMode,

    /// Directory extracted images are written to
    pub image_dir: PathBuf,

    /// Tolerance added to every side of a table bbox before overlap tests
    pub overlap_margin: f32,

    /// Whether pages are processed in parallel
    pub parallel: bool,
}

impl ConvertConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum heading level, clamped to 1..=5.
    pub fn with_max_heading_level(mut self, level: u8) -> Self {
        self.max_heading_level = level.clamp(1, 5);
        self
    }

    /// Set the table extraction mode.
    pub fn with_table_mode(mut self, mode: TableMode) -> Self {
        self.table_mode = mode;
        self
    }

    /// Set the image output directory.
    pub fn with_image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.image_dir = dir.into();
        self
    }

    /// Set the overlap margin.
    pub fn with_overlap_margin(mut self, margin: f32) -> Self {
        self.overlap_margin = margin.max(0.0);
        self
    }

    /// Enable or disable parallel page processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Process pages one at a time.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            max_heading_level: DEFAULT_MAX_HEADING_LEVEL,
            table_mode: TableMode::Lattice,
            image_dir: PathBuf::from("."),
            overlap_margin: OVERLAP_MARGIN,
            parallel: true,
        }
    }
}

/// Table extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableMode {
    /// Tables delimited by ruling lines
    #[default]
    Lattice,
    /// Tables inferred from whitespace alignment
    Stream,
}

impl TableMode {
    /// Lowercase name used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            TableMode::Lattice => "lattice",
            TableMode::Stream => "stream",
        }
    }
}

impl fmt::Display for TableMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lattice" => Ok(TableMode::Lattice),
            "stream" => Ok(TableMode::Stream),
            other => Err(Error::Config(format!("unknown table mode: {}", other))),
        }
    }
}
