// src/combine/imaging.rs
// =============================================================================
// Image helpers for the combiner.
//
// - Which files count as images (by extension only, the bytes are not sniffed)
// - Shrinking an image so width * height stays under a pixel ceiling
// - Building data:image/...;base64,... URIs
//
// resize() is a plain function with no shared state, so it can run on any
// thread. The combiner runs it on tokio's blocking pool because resampling a
// large image is CPU heavy.
// =============================================================================

use crate::error::{Error, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// Extensions treated as images (compared case-insensitively)
pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Returns the lowercased extension if `path` names an image file
pub fn image_extension(path: &str) -> Option<String> {
    let name = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }

    let ext = ext.to_ascii_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

pub fn is_image(path: &str) -> bool {
    image_extension(path).is_some()
}

/// `data:image/<ext>;base64,<payload>`
pub fn data_uri(extension: &str, payload: &str) -> String {
    format!("data:image/{};base64,{}", extension, payload)
}

/// Result of `resize`
#[derive(Debug, Clone)]
pub struct ResizedImage {
    /// Encoded image, in the format named by the file extension once resized
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// false when the image already fit and `bytes` are the input bytes
    pub resized: bool,
}

/// New dimensions for an image above the ceiling, `None` if it already fits.
///
/// Scale factor is sqrt(max / (w * h)), applied to both sides and rounded
/// down so the result never exceeds the ceiling. Sides never drop below 1.
pub fn scaled_dimensions(width: u32, height: u32, max_pixels: u64) -> Option<(u32, u32)> {
    let pixels = u64::from(width) * u64::from(height);
    if pixels <= max_pixels {
        return None;
    }

    let scale = (max_pixels as f64 / pixels as f64).sqrt();
    let new_width = ((f64::from(width) * scale).floor() as u32).max(1);
    let new_height = ((f64::from(height) * scale).floor() as u32).max(1);
    Some((new_width, new_height))
}

/// Shrinks an encoded image so it has at most `max_pixels` pixels.
///
/// Images that already fit are returned byte for byte. Larger ones are
/// resampled (Lanczos3) and re-encoded in the format `extension` names, so
/// the bytes match the `data:image/<ext>` label even when the file lies
/// about its content. Unknown extensions keep the sniffed format.
pub fn resize(bytes: &[u8], max_pixels: u64, extension: &str) -> Result<ResizedImage> {
    let source = image::guess_format(bytes).map_err(|e| Error::ImageDecode(e.to_string()))?;
    let decoded = image::load_from_memory_with_format(bytes, source)
        .map_err(|e| Error::ImageDecode(e.to_string()))?;

    let (width, height) = (decoded.width(), decoded.height());

    let Some((new_width, new_height)) = scaled_dimensions(width, height, max_pixels) else {
        return Ok(ResizedImage {
            bytes: bytes.to_vec(),
            width,
            height,
            resized: false,
        });
    };

    let target = ImageFormat::from_extension(extension).unwrap_or(source);
    let mut scaled = decoded.resize_exact(new_width, new_height, FilterType::Lanczos3);

    // JPEG has no alpha channel
    if target == ImageFormat::Jpeg {
        scaled = DynamicImage::ImageRgb8(scaled.to_rgb8());
    }

    let mut out = Cursor::new(Vec::new());
    scaled
        .write_to(&mut out, target)
        .map_err(|e| Error::ImageDecode(format!("could not re-encode {:?}: {}", target, e)))?;

    Ok(ResizedImage {
        bytes: out.into_inner(),
        width: new_width,
        height: new_height,
        resized: true,
    })
}
