//! Page driver: pulls extraction results page by page, runs layout
//! reconstruction and assembles the document.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::config::ConvertConfig;
use crate::error::Result;
use crate::extract::{PageSource, PdfSource};
use crate::layout::{clean, image_reference, reconstruct, render_table, PageElements};
use crate::model::{Document, Element, ExtractedImage, Page};

/// Drives page-by-page conversion of a [`PageSource`].
#[derive(Debug, Clone, Copy)]
pub struct PageDriver<'a> {
    config: &'a ConvertConfig,
}

impl<'a> PageDriver<'a> {
    pub fn new(config: &'a ConvertConfig) -> Self {
        Self { config }
    }

    /// Convert every page of `source`, in page order.
    ///
    /// Extraction failures are recorded as page warnings; they never
    /// abort the document.
    pub fn convert<S: PageSource + ?Sized>(&self, source: &S) -> Document {
        self.convert_with_progress(source, |_| {})
    }

    /// Like [`convert`](Self::convert), calling `on_page` with each page
    /// number once that page is done. With parallel processing enabled
    /// the callback order is unspecified.
    pub fn convert_with_progress<S, F>(&self, source: &S, on_page: F) -> Document
    where
        S: PageSource + ?Sized,
        F: Fn(u32) + Sync,
    {
        let count = source.page_count();
        log::info!("Converting {} pages", count);

        let run = |number: u32| {
            let page = self.convert_page(source, number);
            on_page(number);
            page
        };

        let pages: Vec<Page> = if self.config.parallel {
            (1..=count).into_par_iter().map(run).collect()
        } else {
            (1..=count).map(run).collect()
        };

        let mut document = Document::new();
        for page in pages {
            document.add_page(page);
        }
        document
    }

    /// Convert a PDF file and write the Markdown to `output`.
    ///
    /// The output file is only written once every page has been processed;
    /// a source that cannot be opened leaves no file behind.
    pub fn convert_file(&self, pdf: &Path, output: &Path) -> Result<Document> {
        self.convert_file_with_progress(pdf, output, |_, _| {})
    }

    /// Like [`convert_file`](Self::convert_file), calling `on_page` with
    /// each finished page number and the document's page count.
    pub fn convert_file_with_progress<F>(&self, pdf: &Path, output: &Path, on_page: F) -> Result<Document>
    where
        F: Fn(u32, u32) + Sync,
    {
        let source = PdfSource::open(pdf)?;
        fs::create_dir_all(&self.config.image_dir)?;

        let total = source.page_count();
        let document = self.convert_with_progress(&source, |number| on_page(number, total));
        write_output(output, &document.to_markdown())?;
        log::info!(
            "Wrote {} ({} pages, {} tables, {} images)",
            output.display(),
            document.stats.page_count,
            document.stats.table_count,
            document.stats.image_count
        );
        Ok(document)
    }

    /// Build one page: gather elements from each collaborator, then
    /// reconstruct.
    pub fn convert_page<S: PageSource + ?Sized>(&self, source: &S, number: u32) -> Page {
        let mut warnings = Vec::new();
        let mut warn = |message: String| {
            log::warn!("Page {}: {}", number, message);
            warnings.push(message);
        };

        let mut parts = PageElements::default();

        match source.text_runs(number) {
            Ok(runs) => {
                for run in runs {
                    let text = clean(&run.text);
                    if text.is_empty() {
                        log::debug!("Page {}: dropping run that cleaned to nothing", number);
                        continue;
                    }
                    parts
                        .texts
                        .push(Element::text(text, run.bbox, run.font_size, run.is_bold));
                }
            }
            Err(e) => warn(format!("text extraction failed: {}", e)),
        }

        let mut blank_tables = 0;
        match source.tables(number, self.config.table_mode) {
            Ok(tables) => {
                for table in tables {
                    if table.is_blank() {
                        blank_tables += 1;
                        continue;
                    }
                    log::debug!(
                        "Page {}: table {}x{} at {:?}",
                        number,
                        table.row_count(),
                        table.column_count(),
                        table.bbox
                    );
                    parts.tables.push(Element::table(render_table(&table), table.bbox));
                }
            }
            Err(e) => warn(format!("table extraction failed: {}", e)),
        }

        match source.images(number) {
            Ok(images) => {
                for image in images {
                    match self.save_image(&image, number) {
                        Ok(path) => parts
                            .images
                            .push(Element::image(image_reference(image.index, &path), image.bbox)),
                        Err(e) => warn(format!("could not save image {}: {}", image.index, e)),
                    }
                }
            }
            Err(e) => warn(format!("image extraction failed: {}", e)),
        }

        let mut page = reconstruct(number, parts, self.config);
        page.blank_tables = blank_tables;
        page.warnings = warnings;
        page
    }

    /// Write image bytes and return the path used in the reference.
    fn save_image(&self, image: &ExtractedImage, number: u32) -> Result<String> {
        let name = image.file_name(number.saturating_sub(1) as usize);
        let path = self.image_path(&name);

        let mut file = File::create(&path)?;
        file.write_all(&image.bytes)?;
        file.flush()?;

        Ok(path.to_string_lossy().into_owned())
    }

    fn image_path(&self, name: &str) -> PathBuf {
        let dir = &self.config.image_dir;
        if dir.as_os_str().is_empty() || dir == Path::new(".") {
            PathBuf::from(name)
        } else {
            dir.join(name)
        }
    }
}

fn write_output(path: &Path, markdown: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(markdown.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableMode;
    use crate::error::Error;
    use crate::model::{BBox, ElementKind, ImageFormat, TableRegion, TextRun};
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeSource {
        pages: Vec<FakePage>,
    }

    #[derive(Default, Clone)]
    struct FakePage {
        runs: Vec<TextRun>,
        tables: Vec<TableRegion>,
        images: Vec<ExtractedImage>,
        fail_tables: bool,
    }

    impl FakeSource {
        fn page(&self, n: u32) -> Result<&FakePage> {
            self.pages
                .get(n as usize - 1)
                .ok_or(Error::PageOutOfRange(n, self.pages.len() as u32))
        }
    }

    impl PageSource for FakeSource {
        fn page_count(&self) -> u32 {
            self.pages.len() as u32
        }

        fn text_runs(&self, page: u32) -> Result<Vec<TextRun>> {
            Ok(self.page(page)?.runs.clone())
        }

        fn tables(&self, page: u32, _mode: TableMode) -> Result<Vec<TableRegion>> {
            let page = self.page(page)?;
            if page.fail_tables {
                return Err(Error::TableExtract("no rulings".into()));
            }
            Ok(page.tables.clone())
        }

        fn images(&self, page: u32) -> Result<Vec<ExtractedImage>> {
            Ok(self.page(page)?.images.clone())
        }
    }

    fn run(text: &str, bbox: BBox, size: f32) -> TextRun {
        TextRun::new(text, bbox, size, false)
    }

    fn body(y: f32) -> TextRun {
        run("body text", BBox::new(50.0, y, 400.0, y + 12.0), 12.0)
    }

    fn config(dir: &TempDir) -> ConvertConfig {
        ConvertConfig::new().with_image_dir(dir.path()).sequential()
    }

    #[test]
    fn test_large_run_becomes_heading() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource {
            pages: vec![FakePage {
                runs: vec![
                    run("Introduction", BBox::new(50.0, 700.0, 300.0, 718.0), 18.0),
                    body(600.0),
                    body(580.0),
                ],
                ..Default::default()
            }],
        };
        let config = config(&dir);
        let doc = PageDriver::new(&config).convert(&source);
        assert!(doc.to_markdown().starts_with("# Page 1\n\n## Introduction\n\n"));
    }

    #[test]
    fn test_text_inside_table_dropped() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource {
            pages: vec![FakePage {
                runs: vec![
                    run("inside", BBox::new(10.0, 10.0, 90.0, 40.0), 12.0),
                    run("outside", BBox::new(0.0, 60.0, 100.0, 80.0), 12.0),
                ],
                tables: vec![TableRegion::new(
                    BBox::new(0.0, 0.0, 100.0, 50.0),
                    vec![vec!["a".into(), "b".into()]],
                )],
                ..Default::default()
            }],
        };
        let config = config(&dir);
        let doc = PageDriver::new(&config).convert(&source);
        let markdown = doc.to_markdown();
        assert!(!markdown.contains("inside"));
        assert_eq!(
            markdown,
            "# Page 1\n\noutside\n\n#### Table\n\n| 0 | 1 |\n| --- | --- |\n| a | b |\n\n\n\n"
        );
        assert_eq!(doc.stats.overlapped_text_count, 1);
    }

    #[test]
    fn test_equal_tops_ordered_left_to_right() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource {
            pages: vec![FakePage {
                runs: vec![
                    run("right", BBox::new(50.0, 488.0, 90.0, 500.0), 12.0),
                    run("left", BBox::new(10.0, 488.0, 40.0, 500.0), 12.0),
                    run("below", BBox::new(0.0, 288.0, 40.0, 300.0), 12.0),
                ],
                ..Default::default()
            }],
        };
        let config = config(&dir);
        let doc = PageDriver::new(&config).convert(&source);
        assert_eq!(doc.to_markdown(), "# Page 1\n\nleft\n\nright\n\nbelow\n\n");
    }

    #[test]
    fn test_blank_table_registers_no_bbox() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource {
            pages: vec![FakePage {
                runs: vec![run("kept", BBox::new(10.0, 10.0, 90.0, 40.0), 12.0)],
                tables: vec![TableRegion::new(
                    BBox::new(0.0, 0.0, 100.0, 50.0),
                    vec![vec![String::new(), " ".into()]],
                )],
                ..Default::default()
            }],
        };
        let config = config(&dir);
        let doc = PageDriver::new(&config).convert(&source);
        assert_eq!(doc.to_markdown(), "# Page 1\n\nkept\n\n");
        assert_eq!(doc.stats.blank_table_count, 1);
        assert_eq!(doc.stats.table_count, 0);
    }

    #[test]
    fn test_images_written_before_reference() {
        let dir = TempDir::new().unwrap();
        let bytes = vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3, 4];
        let source = FakeSource {
            pages: vec![
                FakePage::default(),
                FakePage {
                    images: vec![ExtractedImage::new(
                        0,
                        bytes.clone(),
                        ImageFormat::Jpeg,
                        BBox::new(50.0, 100.0, 200.0, 200.0),
                    )],
                    ..Default::default()
                },
            ],
        };
        let config = config(&dir);
        let doc = PageDriver::new(&config).convert(&source);

        let path = dir.path().join("image_1_0.jpeg");
        assert_eq!(fs::read(&path).unwrap(), bytes);
        let expected = format!("![Image 0]({})", path.display());
        assert_eq!(doc.pages[1].elements[0].content, expected);
        assert_eq!(doc.pages[1].elements[0].kind, ElementKind::Image);
    }

    #[test]
    fn test_failed_tables_become_warning() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource {
            pages: vec![FakePage {
                runs: vec![body(500.0)],
                fail_tables: true,
                ..Default::default()
            }],
        };
        let config = config(&dir);
        let doc = PageDriver::new(&config).convert(&source);
        assert_eq!(doc.pages[0].warnings.len(), 1);
        assert!(doc.pages[0].warnings[0].contains("table extraction failed"));
        assert_eq!(doc.to_markdown(), "# Page 1\n\nbody text\n\n");
    }

    #[test]
    fn test_runs_cleaning_to_nothing_dropped() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource {
            pages: vec![FakePage {
                runs: vec![
                    run("\u{0}\u{7}  \t", BBox::new(0.0, 0.0, 10.0, 10.0), 30.0),
                    run("  spaced   out ", BBox::new(0.0, 20.0, 10.0, 30.0), 12.0),
                ],
                ..Default::default()
            }],
        };
        let config = config(&dir);
        let doc = PageDriver::new(&config).convert(&source);
        assert_eq!(doc.to_markdown(), "# Page 1\n\nspaced out\n\n");
    }

    #[test]
    fn test_parallel_preserves_page_order() {
        let dir = TempDir::new().unwrap();
        let pages = (0..12)
            .map(|i| FakePage {
                runs: vec![run(
                    &format!("page {}", i + 1),
                    BBox::new(0.0, 0.0, 10.0, 10.0),
                    12.0,
                )],
                ..Default::default()
            })
            .collect();
        let source = FakeSource { pages };
        let config = ConvertConfig::new().with_image_dir(dir.path());
        let doc = PageDriver::new(&config).convert(&source);
        let numbers: Vec<u32> = doc.pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, (1..=12).collect::<Vec<_>>());
        assert!(doc.pages[11].elements[0].content.ends_with("page 12"));
    }

    #[test]
    fn test_progress_called_per_page() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let dir = TempDir::new().unwrap();
        let source = FakeSource {
            pages: vec![FakePage::default(); 3],
        };
        let config = config(&dir);
        let seen = AtomicU32::new(0);
        PageDriver::new(&config).convert_with_progress(&source, |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_unopenable_source_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let pdf = dir.path().join("missing.pdf");
        let out = dir.path().join("raw.md");
        let config = config(&dir);
        assert!(PageDriver::new(&config).convert_file(&pdf, &out).is_err());
        assert!(!out.exists());
    }

    #[test]
    fn test_unopenable_source_reports_no_progress() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let dir = TempDir::new().unwrap();
        let pdf = dir.path().join("missing.pdf");
        let out = dir.path().join("raw.md");
        let config = config(&dir);
        let seen = AtomicU32::new(0);
        let result = PageDriver::new(&config).convert_file_with_progress(&pdf, &out, |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        assert!(result.is_err());
        assert_eq!(seen.load(Ordering::SeqCst), 0);
        assert!(!out.exists());
    }

    #[test]
    fn test_image_path_in_current_dir() {
        let config = ConvertConfig::new();
        let driver = PageDriver::new(&config);
        assert_eq!(driver.image_path("image_0_0.png"), PathBuf::from("image_0_0.png"));
    }
}
