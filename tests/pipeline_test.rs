//! End-to-end conversion of generated PDFs.

mod common;

use std::fs;
use std::sync::Mutex;

use common::{aligned_table_page, build_pdf, report_page, text_page, write_pdf, PageOps};
use pagemark::{
    convert_bytes, convert_file, ConvertConfig, ElementKind, PageDriver, PageSource, PdfSource,
    TableMode,
};
use tempfile::TempDir;

#[test]
fn test_report_page_end_to_end() {
    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "report.pdf", vec![report_page(), text_page("Second page body.")]);
    let out = dir.path().join("raw.md");
    let images = dir.path().join("images");
    let config = ConvertConfig::new().with_image_dir(&images);

    let doc = convert_file(&pdf, &out, &config).unwrap();
    let markdown = fs::read_to_string(&out).unwrap();
    assert_eq!(markdown, doc.to_markdown());

    let image = images.join("image_0_0.png");
    let expected = format!(
        "# Page 1\n\n\
         ## Quarterly Report\n\n\
         Revenue grew in every region.\n\n\
         Costs were flat.\n\n\
         #### Table\n\n\
         | 0 | 1 |\n\
         | --- | --- |\n\
         | Region | Sales |\n\
         | North | 42 |\n\n\n\n\
         ![Image 0]({})\n\n\
         # Page 2\n\n\
         Second page body.\n\n",
        image.display()
    );
    assert_eq!(markdown, expected);

    let png = fs::read(&image).unwrap();
    assert!(png.starts_with(b"\x89PNG\r\n\x1a\n"));

    assert_eq!(doc.stats.page_count, 2);
    assert_eq!(doc.stats.heading_count, 1);
    assert_eq!(doc.stats.table_count, 1);
    assert_eq!(doc.stats.image_count, 1);
    assert_eq!(doc.stats.overlapped_text_count, 4);
    assert_eq!(doc.stats.warning_count, 0);
}

#[test]
fn test_sequential_matches_parallel() {
    let dir = TempDir::new().unwrap();
    let pages: Vec<PageOps> = (1..=6)
        .map(|i| text_page(&format!("Body of page {}.", i)))
        .collect();
    let bytes = build_pdf(pages);

    let config = ConvertConfig::new().with_image_dir(dir.path());
    let parallel = convert_bytes(&bytes, &config).unwrap();
    let sequential = convert_bytes(&bytes, &config.clone().sequential()).unwrap();

    assert_eq!(parallel.to_markdown(), sequential.to_markdown());
    let numbers: Vec<u32> = parallel.pages.iter().map(|p| p.number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_stream_mode_finds_aligned_table() {
    let dir = TempDir::new().unwrap();
    let bytes = build_pdf(vec![aligned_table_page()]);

    let config = ConvertConfig::new()
        .with_image_dir(dir.path())
        .with_table_mode(TableMode::Stream);
    let doc = convert_bytes(&bytes, &config).unwrap();

    assert_eq!(
        doc.to_markdown(),
        "# Page 1\n\n\
         #### Table\n\n\
         | 0 | 1 |\n\
         | --- | --- |\n\
         | Name | Score |\n\
         | Alice | 91 |\n\
         | Bob | 78 |\n\n\n\n"
    );
}

#[test]
fn test_stream_table_leaves_prose_above_it() {
    let dir = TempDir::new().unwrap();
    let page = aligned_table_page()
        .text("F1", 11, 72, 760, "An introductory paragraph line.")
        .text("F1", 11, 72, 740, "It continues on a second line.");
    let bytes = build_pdf(vec![page]);

    let config = ConvertConfig::new()
        .with_image_dir(dir.path())
        .with_table_mode(TableMode::Stream);
    let doc = convert_bytes(&bytes, &config).unwrap();

    assert_eq!(doc.stats.table_count, 1);
    assert_eq!(
        doc.to_markdown(),
        "# Page 1\n\n\
         An introductory paragraph line. It continues on a second line.\n\n\
         #### Table\n\n\
         | 0 | 1 |\n\
         | --- | --- |\n\
         | Name | Score |\n\
         | Alice | 91 |\n\
         | Bob | 78 |\n\n\n\n"
    );
}

#[test]
fn test_lattice_mode_ignores_unruled_alignment() {
    let dir = TempDir::new().unwrap();
    let bytes = build_pdf(vec![aligned_table_page()]);

    let config = ConvertConfig::new().with_image_dir(dir.path());
    let doc = convert_bytes(&bytes, &config).unwrap();

    assert_eq!(doc.stats.table_count, 0);
    let page = &doc.pages[0];
    assert!(page.elements.iter().all(|e| e.kind == ElementKind::Text));
    assert!(doc.to_markdown().contains("Alice"));
}

#[test]
fn test_file_progress_reports_every_page() {
    let dir = TempDir::new().unwrap();
    let pdf = write_pdf(dir.path(), "two.pdf", vec![text_page("one"), text_page("two")]);
    let out = dir.path().join("md").join("raw.md");
    let config = ConvertConfig::new().with_image_dir(dir.path().join("images"));

    let seen = Mutex::new(Vec::new());
    let doc = PageDriver::new(&config)
        .convert_file_with_progress(&pdf, &out, |number, total| {
            seen.lock().unwrap().push((number, total));
        })
        .unwrap();

    let mut seen = seen.into_inner().unwrap();
    seen.sort();
    assert_eq!(seen, vec![(1, 2), (2, 2)]);
    assert_eq!(fs::read_to_string(&out).unwrap(), doc.to_markdown());
    assert_eq!(doc.to_markdown(), "# Page 1\n\none\n\n# Page 2\n\ntwo\n\n");
    assert!(dir.path().join("images").is_dir());
}

#[test]
fn test_pdf_source_reports_pages() {
    let source = PdfSource::from_bytes(&build_pdf(vec![text_page("one"), text_page("two")])).unwrap();
    assert_eq!(source.page_count(), 2);

    let runs = source.text_runs(2).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].text, "two");
    assert_eq!(runs[0].font_size, 11.0);

    assert!(source.text_runs(3).is_err());
}

#[test]
fn test_blank_page_has_only_header() {
    let dir = TempDir::new().unwrap();
    let bytes = build_pdf(vec![PageOps::new()]);
    let doc = convert_bytes(&bytes, &ConvertConfig::new().with_image_dir(dir.path())).unwrap();
    assert_eq!(doc.to_markdown(), "# Page 1\n\n");
}

#[test]
fn test_missing_pdf_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("raw.md");
    let config = ConvertConfig::new().with_image_dir(dir.path());

    assert!(convert_file(&dir.path().join("missing.pdf"), &out, &config).is_err());
    assert!(!out.exists());
}
