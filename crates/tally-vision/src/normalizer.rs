//! Image normalization before transmission
//!
//! Decodes the upload, coerces it to 8-bit RGB (dropping alpha/palette/16-bit
//! channels) and re-encodes it as JPEG. No resizing, cropping or enhancement.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use tally_types::Result;

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

pub const JPEG_MIME: &str = "image/jpeg";

/// Image ready to be sent inline to the model
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
}

impl NormalizedImage {
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

/// Decode `bytes` and re-encode them as RGB JPEG.
///
/// Fails with an image error when the bytes are not a recognized image.
pub fn normalize_image(bytes: &[u8], quality: u8) -> Result<NormalizedImage> {
    let decoded = image::load_from_memory(bytes)?;
    let rgb = match decoded {
        DynamicImage::ImageRgb8(buffer) => buffer,
        other => other.to_rgb8(),
    };

    let mut encoded = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut encoded, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)?;

    Ok(NormalizedImage {
        bytes: encoded,
        mime_type: JPEG_MIME,
        width: rgb.width(),
        height: rgb.height(),
    })
}
