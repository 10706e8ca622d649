//! Small PDFs built in memory with lopdf.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// Operations for one page, drawn with fonts `F1` (Helvetica) and
/// `F2` (Helvetica-Bold) and image `Im1` (2x2 RGB) available.
#[derive(Default)]
pub struct PageOps {
    ops: Vec<Operation>,
}

fn int(v: i64) -> Object {
    Object::Integer(v)
}

impl PageOps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `text` at (`x`, `y`) in font `font` at `size` points.
    pub fn text(mut self, font: &str, size: i64, x: i64, y: i64, text: &str) -> Self {
        self.ops.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), int(size)]),
            Operation::new("Td", vec![int(x), int(y)]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]);
        self
    }

    /// Stroke a straight line.
    pub fn line(mut self, x0: i64, y0: i64, x1: i64, y1: i64) -> Self {
        self.ops.extend([
            Operation::new("m", vec![int(x0), int(y0)]),
            Operation::new("l", vec![int(x1), int(y1)]),
            Operation::new("S", vec![]),
        ]);
        self
    }

    /// Stroke a grid with the given column and row edges.
    pub fn grid(mut self, xs: &[i64], ys: &[i64]) -> Self {
        let (left, right) = (xs[0], xs[xs.len() - 1]);
        let (bottom, top) = (ys[0], ys[ys.len() - 1]);
        for &y in ys {
            self = self.line(left, y, right, y);
        }
        for &x in xs {
            self = self.line(x, bottom, x, top);
        }
        self
    }

    /// Paint `Im1` scaled to `w` by `h` with its lower-left at (`x`, `y`).
    pub fn image(mut self, x: i64, y: i64, w: i64, h: i64) -> Self {
        self.ops.extend([
            Operation::new("q", vec![]),
            Operation::new("cm", vec![int(w), int(0), int(0), int(h), int(x), int(y)]),
            Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]),
            Operation::new("Q", vec![]),
        ]);
        self
    }
}

/// Samples of the fixture image.
pub const IMAGE_SAMPLES: [u8; 12] = [255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];

/// Build a PDF with one US Letter page per entry.
pub fn build_pdf(pages: Vec<PageOps>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let image = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 2,
            "Height" => 2,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        IMAGE_SAMPLES.to_vec(),
    ));
    let resources = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
        "XObject" => dictionary! {
            "Im1" => image,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for page in pages {
        let content = Content {
            operations: page.ops,
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().unwrap(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources,
            "MediaBox" => vec![int(0), int(0), int(612), int(792)],
        }),
    );
    let catalog = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Write a built PDF into `dir`.
pub fn write_pdf(dir: &Path, name: &str, pages: Vec<PageOps>) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, build_pdf(pages)).unwrap();
    path
}

/// A report page: a heading, two paragraphs, a ruled 2x2 table and an image.
pub fn report_page() -> PageOps {
    PageOps::new()
        .text("F2", 20, 72, 720, "Quarterly Report")
        .text("F1", 11, 72, 680, "Revenue grew in every region.")
        .text("F1", 11, 72, 620, "Costs were flat.")
        .grid(&[72, 222, 372], &[400, 430, 460])
        .text("F1", 11, 80, 440, "Region")
        .text("F1", 11, 230, 440, "Sales")
        .text("F1", 11, 80, 410, "North")
        .text("F1", 11, 230, 410, "42")
        .image(72, 200, 100, 50)
}

/// A page of plain body text.
pub fn text_page(text: &str) -> PageOps {
    PageOps::new().text("F1", 11, 72, 700, text)
}

/// Rows of whitespace-aligned text with no rulings.
pub fn aligned_table_page() -> PageOps {
    PageOps::new()
        .text("F1", 11, 72, 700, "Name")
        .text("F1", 11, 250, 700, "Score")
        .text("F1", 11, 72, 680, "Alice")
        .text("F1", 11, 250, 680, "91")
        .text("F1", 11, 72, 660, "Bob")
        .text("F1", 11, 250, 660, "78")
}
