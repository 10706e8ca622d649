//! Thin layer over `lopdf` for page lookup, resources and string decoding.
//!
//! Content operators are converted into [`ContentOp`] so the interpreter in
//! `content` never touches lopdf types directly.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::model::BBox;

/// US Letter, used when a page carries no usable MediaBox.
const DEFAULT_PAGE_BOX: BBox = BBox::new(0.0, 0.0, 612.0, 792.0);

/// Guard against cyclic `Parent` chains.
const MAX_INHERIT_DEPTH: usize = 32;

/// A content stream operand.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

impl PdfValue {
    /// Numeric value, if the operand is a number.
    pub fn as_number(&self) -> Option<f32> {
        match self {
            PdfValue::Integer(i) => Some(*i as f32),
            PdfValue::Real(r) => Some(*r),
            _ => None,
        }
    }
}

/// One operator with its operands.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

impl ContentOp {
    /// Numeric operand at `index`.
    pub fn number(&self, index: usize) -> Option<f32> {
        self.operands.get(index).and_then(PdfValue::as_number)
    }

    /// All operands as numbers, or `None` when fewer than `N` are numeric.
    pub fn numbers<const N: usize>(&self) -> Option<[f32; N]> {
        let mut out = [0.0; N];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.number(i)?;
        }
        Some(out)
    }
}

/// Font names and string decoding for the fonts of one page.
pub trait FontLookup {
    /// PostScript name behind a font resource, e.g. `Helvetica-Bold`.
    fn base_font(&self, resource: &[u8]) -> String;

    /// Decode a shown string using the resource's encoding.
    fn decode(&self, resource: &[u8], bytes: &[u8]) -> String;
}

/// Decode a string without font information.
///
/// Tries UTF-16BE (with BOM), then UTF-8, then falls back to Latin-1.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if let Some(body) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// An opened PDF document.
pub struct PdfBackend {
    doc: LopdfDocument,
    pages: BTreeMap<u32, ObjectId>,
}

impl PdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        LopdfDocument::load(path)
            .map_err(map_load_error)
            .map(Self::from_document)
    }

    /// Load from an in-memory buffer.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        LopdfDocument::load_mem(data)
            .map_err(map_load_error)
            .map(Self::from_document)
    }

    fn from_document(doc: LopdfDocument) -> Self {
        let pages = doc.get_pages();
        Self { doc, pages }
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Object id of the 1-based page `number`.
    pub fn page_id(&self, number: u32) -> Result<ObjectId> {
        self.pages
            .get(&number)
            .copied()
            .ok_or(Error::PageOutOfRange(number, self.page_count()))
    }

    /// The page's MediaBox, falling back to US Letter.
    pub fn page_box(&self, page: ObjectId) -> BBox {
        let Some(values) = self
            .inherited(page, b"MediaBox")
            .and_then(|o| o.as_array().ok())
        else {
            return DEFAULT_PAGE_BOX;
        };

        let nums: Vec<f32> = values
            .iter()
            .filter_map(|v| self.resolve(v))
            .filter_map(|v| v.as_float().ok())
            .collect();
        if nums.len() < 4 {
            return DEFAULT_PAGE_BOX;
        }

        let bbox = BBox::from_points(nums[0], nums[1], nums[2], nums[3]);
        if bbox.is_well_formed() && bbox.height() > 0.0 {
            bbox
        } else {
            DEFAULT_PAGE_BOX
        }
    }

    /// Decompressed page content, with multiple streams joined by a space.
    pub fn page_content(&self, page: ObjectId) -> Result<Vec<u8>> {
        let dict = self
            .doc
            .get_dictionary(page)
            .map_err(|e| Error::PdfParse(e.to_string()))?;
        let contents = dict
            .get(b"Contents")
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let streams: Vec<&Object> = match self.resolve(contents) {
            Some(Object::Array(items)) => items.iter().collect(),
            Some(other) => vec![other],
            None => Vec::new(),
        };

        let mut content = Vec::new();
        for item in streams {
            match self.resolve(item) {
                Some(Object::Stream(stream)) => match stream.decompressed_content() {
                    Ok(data) => {
                        content.extend_from_slice(&data);
                        content.push(b' ');
                    }
                    // Unfiltered streams report an error but carry usable bytes.
                    Err(_) if stream.dict.get(b"Filter").is_err() => {
                        content.extend_from_slice(&stream.content);
                        content.push(b' ');
                    }
                    Err(e) => log::warn!("Skipping undecodable content stream: {}", e),
                },
                _ => return Err(Error::PdfParse("Invalid content stream".to_string())),
            }
        }
        Ok(content)
    }

    /// Font table of a page.
    pub fn page_fonts(&self, page: ObjectId) -> Result<PageFonts<'_>> {
        let fonts = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| Error::PdfParse(e.to_string()))?;
        Ok(PageFonts {
            doc: &self.doc,
            fonts,
        })
    }

    /// Image or form XObject named `name` in the page's resources.
    pub fn xobject(&self, page: ObjectId, name: &[u8]) -> Option<&Stream> {
        let resources = self.inherited(page, b"Resources")?.as_dict().ok()?;
        let xobjects = self.resolve(resources.get(b"XObject").ok()?)?.as_dict().ok()?;
        self.resolve(xobjects.get(name).ok()?)?.as_stream().ok()
    }

    /// Follow a reference to its object.
    pub fn resolve<'a>(&'a self, obj: &'a Object) -> Option<&'a Object> {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).ok(),
            other => Some(other),
        }
    }

    /// Look up a page attribute, walking up the page tree.
    fn inherited(&self, page: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut dict: &Dictionary = self.doc.get_dictionary(page).ok()?;
        for _ in 0..MAX_INHERIT_DEPTH {
            if let Ok(value) = dict.get(key) {
                return self.resolve(value);
            }
            let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
            dict = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }
}

/// Parse content bytes into operations.
pub fn decode_content(data: &[u8]) -> Result<Vec<ContentOp>> {
    let content =
        lopdf::content::Content::decode(data).map_err(|e| Error::PdfParse(e.to_string()))?;

    Ok(content
        .operations
        .iter()
        .map(|op| ContentOp {
            operator: op.operator.clone(),
            operands: op.operands.iter().map(to_value).collect(),
        })
        .collect())
}

fn map_load_error(e: lopdf::Error) -> Error {
    match e {
        lopdf::Error::Decryption(_) => Error::Encrypted,
        other => Error::from(other),
    }
}

fn to_value(obj: &Object) -> PdfValue {
    match obj {
        Object::Integer(i) => PdfValue::Integer(*i),
        Object::Real(r) => PdfValue::Real(*r),
        Object::Name(n) => PdfValue::Name(n.clone()),
        Object::String(bytes, _) => PdfValue::Str(bytes.clone()),
        Object::Array(items) => PdfValue::Array(items.iter().map(to_value).collect()),
        _ => PdfValue::Other,
    }
}

/// Fonts of one page, borrowed from the document.
pub struct PageFonts<'a> {
    doc: &'a LopdfDocument,
    fonts: BTreeMap<Vec<u8>, &'a Dictionary>,
}

impl FontLookup for PageFonts<'_> {
    fn base_font(&self, resource: &[u8]) -> String {
        self.fonts
            .get(resource)
            .and_then(|font| font.get(b"BaseFont").ok())
            .and_then(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .unwrap_or_else(|| String::from_utf8_lossy(resource).into_owned())
    }

    fn decode(&self, resource: &[u8], bytes: &[u8]) -> String {
        if let Some(font) = self.fonts.get(resource) {
            if let Ok(encoding) = font.get_font_encoding(self.doc) {
                if let Ok(text) = LopdfDocument::decode_text(&encoding, bytes) {
                    return text;
                }
            }
        }
        decode_text_simple(bytes)
    }
}
