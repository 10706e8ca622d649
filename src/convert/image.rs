//! Image files and directories as Markdown image references.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ConvertConfig;
use crate::error::{Error, Result};

use super::{ConvertResult, DocumentConverter};

/// Extensions treated as images.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "bmp"];

/// Renders an image, or every image under a directory, as Markdown
/// ready for caption enrichment.
#[derive(Debug, Clone, Default)]
pub struct ImageConverter {
    _private: (),
}

impl ImageConverter {
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Markdown for a single image file.
    pub fn render_file(&self, path: &Path) -> Result<String> {
        if !path.is_file() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }
        Ok(format!(
            "### Image Analysis\n\n{}\n\n",
            reference(path)
        ))
    }

    /// Markdown for every image under `dir`, searched recursively in
    /// path order.
    pub fn render_dir(&self, dir: &Path) -> Result<String> {
        if !dir.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a directory", dir.display()),
            )));
        }

        let mut images = Vec::new();
        collect_images(dir, &mut images)?;
        if images.is_empty() {
            return Err(Error::Other(format!(
                "no supported images found in {}",
                dir.display()
            )));
        }
        log::info!("Found {} images under {}", images.len(), dir.display());

        let mut out = format!("### Image Collection\n\n{} images\n\n", images.len());
        for (i, path) in images.iter().enumerate() {
            out.push_str(&format!(
                "#### Image {}: {}\n\n{}\n\n\n---\n\n",
                i + 1,
                file_name(path),
                reference(path)
            ));
        }
        Ok(out)
    }
}

impl DocumentConverter for ImageConverter {
    fn supported_extensions(&self) -> &[&str] {
        &IMAGE_EXTENSIONS
    }

    fn name(&self) -> &str {
        "image"
    }

    fn convert(&self, path: &Path, _config: &ConvertConfig) -> Result<ConvertResult> {
        let content = if path.is_dir() {
            self.render_dir(path)?
        } else {
            self.render_file(path)?
        };
        Ok(ConvertResult::markdown(content))
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
}

fn collect_images(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_images(&path, out)?;
        } else if is_image(&path) {
            out.push(path);
        }
    }
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn reference(path: &Path) -> String {
    format!("![{}]({})", file_name(path), path.display())
}
