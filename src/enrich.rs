//! Embedding-friendly Markdown: every image reference is followed by a
//! quoted block holding its caption and file details.

use std::fs;
use std::path::{Path, PathBuf};

use regex::{Captures, Regex};

use crate::caption::{Caption, Captioner, ImageInfo};
use crate::error::{Error, Result};

const IMAGE_PATTERN: &str = r"!\[(.*?)\]\((.*?)\)";

/// Counts from one enrichment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichReport {
    /// Image references found
    pub images: usize,
    /// References followed by a caption block
    pub captioned: usize,
    /// References followed by an error line
    pub failed: usize,
    /// References left alone because the file does not exist
    pub missing: usize,
}

/// Rewrites Markdown image references using a [`Captioner`].
pub struct Enricher<'a> {
    captioner: &'a dyn Captioner,
    base_dir: PathBuf,
    pattern: Regex,
}

impl<'a> Enricher<'a> {
    /// Relative image paths are tried as given, then under `base_dir`.
    pub fn new(captioner: &'a dyn Captioner, base_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            captioner,
            base_dir: base_dir.into(),
            pattern: Regex::new(IMAGE_PATTERN)?,
        })
    }

    /// Enrich `content`, returning the new Markdown and what happened.
    pub fn enrich(&self, content: &str) -> (String, EnrichReport) {
        let mut report = EnrichReport::default();
        let out = self.pattern.replace_all(content, |caps: &Captures| {
            report.images += 1;
            let whole = &caps[0];
            let alt = &caps[1];
            let path = &caps[2];

            let Some(file) = self.locate(path) else {
                log::warn!("Image not found, leaving reference as is: {}", path);
                report.missing += 1;
                return whole.to_string();
            };

            let context = (!alt.is_empty()).then_some(alt);
            match self.captioner.caption(&file, context) {
                Ok(caption) => {
                    report.captioned += 1;
                    let info = ImageInfo::probe(&file);
                    format!("{}\n{}", whole, image_block(path, &file, &caption, &info))
                }
                Err(e) => {
                    log::warn!("Captioning {} failed: {}", path, e);
                    report.failed += 1;
                    format!("{}\n> IMAGE_ERROR: {}\n", whole, e)
                }
            }
        });
        (out.into_owned(), report)
    }

    fn locate(&self, path: &str) -> Option<PathBuf> {
        let given = Path::new(path);
        if given.is_file() {
            return Some(given.to_path_buf());
        }
        if given.is_relative() {
            let joined = self.base_dir.join(given);
            if joined.is_file() {
                return Some(joined);
            }
        }
        None
    }
}

/// The quoted caption block. Each line ends in two spaces so Markdown
/// keeps the line breaks inside the quote.
fn image_block(path: &str, file: &Path, caption: &Caption, info: &ImageInfo) -> String {
    let alt = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    format!(
        "> IMAGE_BEGIN  \n\
         > Path: {}  \n\
         > Alt: {}  \n\
         > OCR: {}  \n\
         > DESC: {}  \n\
         > CONTEXT: {}  \n\
         > Type: {}  \n\
         > Size: {}  \n\
         > IMAGE_END  \n",
        path,
        alt,
        caption.ocr,
        caption.desc,
        caption.context,
        info.format,
        info.size()
    )
}

/// Enrich Markdown text; relative image paths resolve against `base_dir`.
pub fn enrich_markdown(content: &str, captioner: &dyn Captioner, base_dir: &Path) -> Result<String> {
    let (out, _) = Enricher::new(captioner, base_dir)?.enrich(content);
    Ok(out)
}

/// Enrich the Markdown file `raw` into `emb`.
///
/// Images are looked up relative to the directory holding `raw`. A
/// missing or blank input fails with [`Error::EmptyInput`] and writes
/// nothing.
pub fn enrich_file(raw: &Path, emb: &Path, captioner: &dyn Captioner) -> Result<EnrichReport> {
    let content = match fs::read_to_string(raw) {
        Ok(content) if !content.trim().is_empty() => content,
        Ok(_) => return Err(Error::EmptyInput(raw.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::EmptyInput(raw.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };

    let base_dir = raw
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let (out, report) = Enricher::new(captioner, base_dir)?.enrich(&content);

    if let Some(parent) = emb.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(emb, out)?;
    log::info!(
        "Enriched {} images ({} failed, {} missing) into {}",
        report.captioned,
        report.failed,
        report.missing,
        emb.display()
    );
    Ok(report)
}
