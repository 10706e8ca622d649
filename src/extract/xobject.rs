//! Image XObject decoding.
//!
//! JPEG and JPEG 2000 streams are kept as-is once their signature checks
//! out; 8-bit gray or RGB samples are re-encoded as PNG. Anything else is
//! skipped with a warning.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::model::{ExtractedImage, ImageFormat};

use super::backend::PdfBackend;
use super::content::ImagePlacement;

/// Decode every image drawn on a page.
///
/// Indices follow drawing order, counting images that fail to decode, so
/// file names stay stable when one image is unreadable.
pub fn extract_images(
    backend: &PdfBackend,
    page: ObjectId,
    placements: &[ImagePlacement],
) -> Vec<ExtractedImage> {
    let page_box = backend.page_box(page);
    let mut images = Vec::new();

    for (index, placement) in placements.iter().enumerate() {
        let name = String::from_utf8_lossy(&placement.name);
        let Some(stream) = backend.xobject(page, &placement.name) else {
            log::warn!("Image resource /{} not found", name);
            continue;
        };
        if !is_image(stream) {
            log::debug!("Skipping non-image XObject /{}", name);
            continue;
        }
        let Some(bbox) = placement.bbox.clip(&page_box) else {
            log::debug!("Image /{} lies outside the page", name);
            continue;
        };

        match encode(backend, stream) {
            Ok((bytes, format)) => images.push(ExtractedImage::new(index, bytes, format, bbox)),
            Err(e) => log::warn!("Skipping image /{}: {}", name, e),
        }
    }
    images
}

fn is_image(stream: &Stream) -> bool {
    stream
        .dict
        .get(b"Subtype")
        .and_then(Object::as_name)
        .is_ok_and(|subtype| subtype == b"Image")
}

/// Filter names applied to a stream, outermost first.
fn filters(backend: &PdfBackend, stream: &Stream) -> Vec<String> {
    let Some(filter) = stream
        .dict
        .get(b"Filter")
        .ok()
        .and_then(|f| backend.resolve(f))
    else {
        return Vec::new();
    };

    let names: Vec<&Object> = match filter {
        Object::Array(items) => items.iter().collect(),
        single => vec![single],
    };
    names
        .into_iter()
        .filter_map(|n| n.as_name().ok())
        .map(|n| String::from_utf8_lossy(n).into_owned())
        .collect()
}

fn encode(backend: &PdfBackend, stream: &Stream) -> Result<(Vec<u8>, ImageFormat)> {
    let filters = filters(backend, stream);
    match filters.as_slice() {
        [f] if f == "DCTDecode" => pass_through(&stream.content, ImageFormat::Jpeg),
        [f] if f == "JPXDecode" => pass_through(&stream.content, ImageFormat::Jp2),
        [] => to_png(backend, stream, stream.content.clone()),
        [f] if f == "FlateDecode" || f == "LZWDecode" => {
            let samples = stream
                .decompressed_content()
                .map_err(|e| Error::ImageExtract(e.to_string()))?;
            to_png(backend, stream, samples)
        }
        other => Err(Error::ImageExtract(format!(
            "unsupported filter chain {:?}",
            other
        ))),
    }
}

fn pass_through(content: &[u8], format: ImageFormat) -> Result<(Vec<u8>, ImageFormat)> {
    match ImageFormat::detect(content) {
        Some(found) if found == format => Ok((content.to_vec(), format)),
        _ => Err(Error::ImageExtract(format!(
            "{}-byte stream has no {} signature",
            content.len(),
            format.extension()
        ))),
    }
}

fn to_png(backend: &PdfBackend, stream: &Stream, samples: Vec<u8>) -> Result<(Vec<u8>, ImageFormat)> {
    let dict = &stream.dict;
    let dimension = |key: &[u8]| -> Result<u32> {
        dict.get(key)
            .and_then(Object::as_i64)
            .ok()
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
            .ok_or_else(|| {
                Error::ImageExtract(format!("missing {}", String::from_utf8_lossy(key)))
            })
    };
    let width = dimension(b"Width")?;
    let height = dimension(b"Height")?;

    let bits = dict
        .get(b"BitsPerComponent")
        .and_then(Object::as_i64)
        .unwrap_or(8);
    if bits != 8 {
        return Err(Error::ImageExtract(format!("{} bits per component", bits)));
    }

    let channels = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|cs| color_channels(backend, cs))
        .ok_or_else(|| Error::ImageExtract("unsupported color space".to_string()))?;

    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(channels))
        .ok_or_else(|| {
            Error::ImageExtract(format!("{}x{} image is too large", width, height))
        })?;
    if samples.len() < expected {
        return Err(Error::ImageExtract(format!(
            "expected {} sample bytes, found {}",
            expected,
            samples.len()
        )));
    }
    let mut samples = samples;
    samples.truncate(expected);

    let image = match channels {
        1 => GrayImage::from_raw(width, height, samples).map(DynamicImage::ImageLuma8),
        _ => RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8),
    }
    .ok_or_else(|| Error::ImageExtract("sample buffer size mismatch".to_string()))?;

    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
    Ok((png, ImageFormat::Png))
}

/// Components per pixel for gray and RGB spaces.
fn color_channels(backend: &PdfBackend, space: &Object) -> Option<usize> {
    match backend.resolve(space)? {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" | b"G" => Some(1),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Some(3),
            _ => None,
        },
        Object::Array(items) => {
            let family = items.first()?.as_name().ok()?;
            let param = backend.resolve(items.get(1)?)?;
            match family {
                b"ICCBased" => {
                    let n = param.as_stream().ok()?.dict.get(b"N").ok()?.as_i64().ok()?;
                    matches!(n, 1 | 3).then_some(n as usize)
                }
                b"CalGray" => Some(1),
                b"CalRGB" => Some(3),
                _ => None,
            }
        }
        _ => None,
    }
}
