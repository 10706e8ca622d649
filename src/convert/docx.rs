//! Word documents through pandoc.

use std::io;
use std::path::Path;
use std::process::Command;

use crate::config::ConvertConfig;
use crate::error::{Error, Result};
use crate::repair::MarkdownRepair;

use super::{ConvertResult, DocumentConverter};

const PANDOC: &str = "pandoc";

/// Converts `.docx` files by running pandoc and repairing its output.
///
/// Embedded media is extracted into the configured image directory.
#[derive(Debug, Clone)]
pub struct DocxConverter {
    program: String,
}

impl DocxConverter {
    pub fn new() -> Self {
        Self {
            program: PANDOC.to_string(),
        }
    }

    /// Use a different pandoc executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn run_pandoc(&self, path: &Path, media_dir: &Path) -> Result<String> {
        let output = Command::new(&self.program)
            .arg(path)
            .args(["-t", "markdown"])
            .arg(format!("--extract-media={}", media_dir.display()))
            .args(["--wrap=none", "--standalone"])
            .output()
            .map_err(|e| {
                let message = if e.kind() == io::ErrorKind::NotFound {
                    "not installed or not on PATH".to_string()
                } else {
                    e.to_string()
                };
                self.tool_error(message)
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.tool_error(format!("{}: {}", output.status, stderr.trim())));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn tool_error(&self, message: String) -> Error {
        Error::ExternalTool {
            tool: self.program.clone(),
            message,
        }
    }
}

impl Default for DocxConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentConverter for DocxConverter {
    fn supported_extensions(&self) -> &[&str] {
        &["docx"]
    }

    fn name(&self) -> &str {
        "docx"
    }

    fn convert(&self, path: &Path, config: &ConvertConfig) -> Result<ConvertResult> {
        if !path.is_file() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }

        std::fs::create_dir_all(&config.image_dir)?;
        log::info!("Running {} on {}", self.program, path.display());
        let markdown = self.run_pandoc(path, &config.image_dir)?;

        let repaired = MarkdownRepair::new()?.repair(&markdown);
        Ok(ConvertResult::markdown(repaired))
    }
}
