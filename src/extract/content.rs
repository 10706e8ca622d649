//! Content stream interpretation.
//!
//! A single pass over a page's operators collects positioned glyph spans,
//! painted line segments (table rulings) and image placements, all in PDF
//! user space with y growing upward.

use crate::model::{is_bold_font_name, BBox};

use super::backend::{ContentOp, FontLookup, PdfValue};

/// Estimated advance of a Latin glyph, in em.
const GLYPH_ADVANCE_EM: f32 = 0.5;

/// TJ adjustment (thousandths of an em) treated as a word break.
const WORD_GAP_UNITS: f32 = 200.0;

/// Rectangles thinner than this are painted as single rulings.
const THIN_RECT: f32 = 2.0;

/// A run of text shown by one text-showing operator.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    /// Left edge
    pub x: f32,
    /// Baseline
    pub y: f32,
    pub width: f32,
    pub font_size: f32,
    pub font_name: String,
    pub is_bold: bool,
}

impl TextSpan {
    pub fn new(
        text: impl Into<String>,
        x: f32,
        y: f32,
        width: f32,
        font_size: f32,
        font_name: impl Into<String>,
    ) -> Self {
        let font_name = font_name.into();
        Self {
            text: text.into(),
            x,
            y,
            width,
            font_size,
            is_bold: is_bold_font_name(&font_name),
            font_name,
        }
    }

    /// Approximate glyph box: 20% of the size below the baseline, 80% above.
    pub fn bbox(&self) -> BBox {
        BBox::new(
            self.x,
            self.y - self.font_size * 0.2,
            self.x + self.width,
            self.y + self.font_size * 0.8,
        )
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// A straight painted line segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Segment {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn is_horizontal(&self, tolerance: f32) -> bool {
        (self.y1 - self.y0).abs() <= tolerance && (self.x1 - self.x0).abs() > tolerance
    }

    pub fn is_vertical(&self, tolerance: f32) -> bool {
        (self.x1 - self.x0).abs() <= tolerance && (self.y1 - self.y0).abs() > tolerance
    }
}

/// Where an XObject was drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlacement {
    /// Resource name passed to `Do`
    pub name: Vec<u8>,
    /// The unit square mapped through the CTM
    pub bbox: BBox,
}

/// Everything collected from one page's content.
#[derive(Debug, Clone, Default)]
pub struct PageScan {
    pub spans: Vec<TextSpan>,
    pub segments: Vec<Segment>,
    pub placements: Vec<ImagePlacement>,
}

/// Affine transform `[a b c d e f]` as used by PDF.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn from_array([a, b, c, d, e, f]: [f32; 6]) -> Self {
        Self { a, b, c, d, e, f }
    }

    fn translation(tx: f32, ty: f32) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    /// `self × other`: apply `self` first, then `other`.
    fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.a + y * self.c + self.e,
            x * self.b + y * self.d + self.f,
        )
    }

    fn horizontal_scale(&self) -> f32 {
        (self.a * self.a + self.b * self.b).sqrt()
    }

    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

/// Graphics state saved by `q` and restored by `Q`.
#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    font: Vec<u8>,
    font_name: String,
    font_size: f32,
    leading: f32,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            font: Vec::new(),
            font_name: String::new(),
            font_size: 12.0,
            leading: 0.0,
        }
    }
}

/// Walks operators and fills a [`PageScan`].
struct Interpreter<'a, F: FontLookup + ?Sized> {
    fonts: &'a F,
    state: GraphicsState,
    saved: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    path: Vec<Segment>,
    current: Option<(f32, f32)>,
    subpath_start: Option<(f32, f32)>,
    scan: PageScan,
}

/// Interpret a page's operators.
pub fn interpret<F: FontLookup + ?Sized>(ops: &[ContentOp], fonts: &F) -> PageScan {
    let mut interpreter = Interpreter {
        fonts,
        state: GraphicsState::default(),
        saved: Vec::new(),
        text_matrix: Matrix::IDENTITY,
        line_matrix: Matrix::IDENTITY,
        path: Vec::new(),
        current: None,
        subpath_start: None,
        scan: PageScan::default(),
    };
    for op in ops {
        interpreter.step(op);
    }
    log::debug!(
        "Content scan: {} spans, {} segments, {} placements",
        interpreter.scan.spans.len(),
        interpreter.scan.segments.len(),
        interpreter.scan.placements.len()
    );
    interpreter.scan
}

impl<F: FontLookup + ?Sized> Interpreter<'_, F> {
    fn step(&mut self, op: &ContentOp) {
        match op.operator.as_str() {
            "q" => self.saved.push(self.state.clone()),
            "Q" => {
                if let Some(state) = self.saved.pop() {
                    self.state = state;
                }
            }
            "cm" => {
                if let Some(m) = op.numbers::<6>() {
                    self.state.ctm = Matrix::from_array(m).then(&self.state.ctm);
                }
            }

            "BT" => {
                self.text_matrix = Matrix::IDENTITY;
                self.line_matrix = Matrix::IDENTITY;
            }
            "ET" => {}
            "Tf" => {
                if let Some(PdfValue::Name(font)) = op.operands.first() {
                    self.state.font_name = self.fonts.base_font(font);
                    self.state.font = font.clone();
                }
                if let Some(size) = op.number(1) {
                    self.state.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = op.number(0) {
                    self.state.leading = leading;
                }
            }
            "Td" => {
                if let Some([tx, ty]) = op.numbers::<2>() {
                    self.move_line(tx, ty);
                }
            }
            "TD" => {
                if let Some([tx, ty]) = op.numbers::<2>() {
                    self.state.leading = -ty;
                    self.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = op.numbers::<6>() {
                    self.line_matrix = Matrix::from_array(m);
                    self.text_matrix = self.line_matrix;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                    self.show_string(bytes);
                }
            }
            "'" => {
                self.next_line();
                if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                    self.show_string(bytes);
                }
            }
            "\"" => {
                self.next_line();
                if let Some(PdfValue::Str(bytes)) = op.operands.get(2) {
                    self.show_string(bytes);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(items)) = op.operands.first() {
                    self.show_array(items);
                }
            }

            "m" => {
                if let Some([x, y]) = op.numbers::<2>() {
                    let p = self.state.ctm.apply(x, y);
                    self.current = Some(p);
                    self.subpath_start = Some(p);
                }
            }
            "l" => {
                if let Some([x, y]) = op.numbers::<2>() {
                    let p = self.state.ctm.apply(x, y);
                    if let Some(from) = self.current {
                        self.path.push(Segment::new(from.0, from.1, p.0, p.1));
                    }
                    self.current = Some(p);
                }
            }
            "h" => self.close_subpath(),
            "re" => {
                if let Some(rect) = op.numbers::<4>() {
                    self.rectangle(rect);
                }
            }
            "S" | "f" | "F" | "f*" | "B" | "B*" => self.paint(),
            "s" | "b" | "b*" => {
                self.close_subpath();
                self.paint();
            }
            "n" => self.discard_path(),

            "Do" => {
                if let Some(PdfValue::Name(name)) = op.operands.first() {
                    self.place(name);
                }
            }
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).then(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = if self.state.leading != 0.0 {
            self.state.leading
        } else {
            self.state.font_size * 1.2
        };
        self.move_line(0.0, -leading);
    }

    fn decode(&self, bytes: &[u8]) -> String {
        self.fonts.decode(&self.state.font, bytes)
    }

    fn show_string(&mut self, bytes: &[u8]) {
        let text = self.decode(bytes);
        let advance = estimate_advance(&text, self.state.font_size);
        self.emit(text, advance);
    }

    fn show_array(&mut self, items: &[PdfValue]) {
        let size = self.state.font_size;
        let mut combined = String::new();
        let mut advance = 0.0;

        for item in items {
            match item {
                PdfValue::Str(bytes) => {
                    let text = self.decode(bytes);
                    advance += estimate_advance(&text, size);
                    combined.push_str(&text);
                }
                other => {
                    let Some(adjust) = other.as_number() else {
                        continue;
                    };
                    advance -= adjust / 1000.0 * size;
                    if -adjust > WORD_GAP_UNITS && wants_space(&combined) {
                        combined.push(' ');
                    }
                }
            }
        }

        self.emit(combined, advance);
    }

    /// Record a span at the current text position and advance past it.
    fn emit(&mut self, text: String, advance: f32) {
        let rendering = self.text_matrix.then(&self.state.ctm);
        if !text.trim().is_empty() {
            let (x, y) = rendering.apply(0.0, 0.0);
            let scale = rendering.vertical_scale();
            let size = if scale > 0.0 {
                self.state.font_size * scale
            } else {
                self.state.font_size
            };
            let width = advance.max(0.0) * rendering.horizontal_scale();
            self.scan.spans.push(TextSpan::new(
                text,
                x,
                y,
                width,
                size,
                self.state.font_name.clone(),
            ));
        }
        self.text_matrix = Matrix::translation(advance, 0.0).then(&self.text_matrix);
    }

    fn close_subpath(&mut self) {
        if let (Some(from), Some(start)) = (self.current, self.subpath_start) {
            if from != start {
                self.path.push(Segment::new(from.0, from.1, start.0, start.1));
            }
            self.current = Some(start);
        }
    }

    fn rectangle(&mut self, [x, y, w, h]: [f32; 4]) {
        let ctm = self.state.ctm;
        let corners = [
            ctm.apply(x, y),
            ctm.apply(x + w, y),
            ctm.apply(x + w, y + h),
            ctm.apply(x, y + h),
        ];
        let bounds = bounds_of(&corners);

        if bounds.height() <= THIN_RECT {
            let mid = (bounds.y0 + bounds.y1) / 2.0;
            self.path.push(Segment::new(bounds.x0, mid, bounds.x1, mid));
        } else if bounds.width() <= THIN_RECT {
            let mid = (bounds.x0 + bounds.x1) / 2.0;
            self.path.push(Segment::new(mid, bounds.y0, mid, bounds.y1));
        } else {
            for i in 0..4 {
                let (a, b) = (corners[i], corners[(i + 1) % 4]);
                self.path.push(Segment::new(a.0, a.1, b.0, b.1));
            }
        }
        self.current = Some(corners[0]);
        self.subpath_start = Some(corners[0]);
    }

    fn paint(&mut self) {
        self.scan.segments.append(&mut self.path);
        self.current = None;
        self.subpath_start = None;
    }

    fn discard_path(&mut self) {
        self.path.clear();
        self.current = None;
        self.subpath_start = None;
    }

    fn place(&mut self, name: &[u8]) {
        let ctm = self.state.ctm;
        let corners = [
            ctm.apply(0.0, 0.0),
            ctm.apply(1.0, 0.0),
            ctm.apply(1.0, 1.0),
            ctm.apply(0.0, 1.0),
        ];
        self.scan.placements.push(ImagePlacement {
            name: name.to_vec(),
            bbox: bounds_of(&corners),
        });
    }
}

fn bounds_of(points: &[(f32, f32)]) -> BBox {
    let mut bbox = BBox::new(f32::MAX, f32::MAX, f32::MIN, f32::MIN);
    for &(x, y) in points {
        bbox.x0 = bbox.x0.min(x);
        bbox.y0 = bbox.y0.min(y);
        bbox.x1 = bbox.x1.max(x);
        bbox.y1 = bbox.y1.max(y);
    }
    bbox
}

/// Width of `text` in unscaled text space.
fn estimate_advance(text: &str, font_size: f32) -> f32 {
    text.chars()
        .map(|c| {
            if is_spaceless_script_char(c) || is_hangul(c) {
                font_size
            } else {
                font_size * GLYPH_ADVANCE_EM
            }
        })
        .sum()
}

fn wants_space(text: &str) -> bool {
    match text.chars().last() {
        Some(c) => !c.is_whitespace() && !is_spaceless_script_char(c),
        None => false,
    }
}

fn is_hangul(c: char) -> bool {
    matches!(c as u32, 0xAC00..=0xD7AF | 0x1100..=0x11FF | 0x3130..=0x318F)
}

/// Characters of scripts written without spaces between words (Han, kana
/// and CJK punctuation). Hangul is not one of them.
pub fn is_spaceless_script_char(c: char) -> bool {
    matches!(c as u32,
        0x3000..=0x303F
        | 0x3040..=0x309F
        | 0x30A0..=0x30FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0x20000..=0x2EBEF)
}
