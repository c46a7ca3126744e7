//! Format detection, decoding and same-format re-encoding.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Detect | signature match over [`CODEC_PRIORITY`], `image::guess_format` to name rejects |
//! | Decode (PNG, JPEG) | `image::load_from_memory_with_format` |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (default compression) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` |
//!
//! Only PNG and JPEG are accepted. Everything else, including formats the
//! `image` crate could decode with more features enabled, is rejected before
//! any decoding work.

use super::params::Quality;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageFormat};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("Unsupported image format: {0} (only PNG and JPEG are accepted)")]
    UnsupportedFormat(String),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode {format}: {message}")]
    Encode {
        format: SourceFormat,
        message: String,
    },
    #[error("Label font unavailable: {0}")]
    Font(String),
    #[error("Invalid plot style: {0}")]
    InvalidStyle(String),
}

/// Raster encodings this crate reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Png,
    Jpeg,
}

/// Codecs in the order their signatures are tried.
pub const CODEC_PRIORITY: &[SourceFormat] = &[SourceFormat::Png, SourceFormat::Jpeg];

/// File extensions accepted by the path and URL sources.
const EXTENSIONS: &[(&str, SourceFormat)] = &[
    ("png", SourceFormat::Png),
    ("jpg", SourceFormat::Jpeg),
    ("jpeg", SourceFormat::Jpeg),
];

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];

impl SourceFormat {
    fn signature(self) -> &'static [u8] {
        match self {
            Self::Png => PNG_SIGNATURE,
            Self::Jpeg => JPEG_SIGNATURE,
        }
    }

    /// Whether `bytes` start with this format's magic number.
    pub fn matches(self, bytes: &[u8]) -> bool {
        bytes.starts_with(self.signature())
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
        }
    }

    /// Canonical file extension, also used for multipart upload names.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// Look up a format by file extension (case-insensitive, without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        EXTENSIONS
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(ext))
            .map(|(_, format)| *format)
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Png => f.write_str("PNG"),
            Self::Jpeg => f.write_str("JPEG"),
        }
    }
}

/// Returns the file extensions accepted by path and URL sources.
pub fn supported_extensions() -> impl Iterator<Item = &'static str> {
    EXTENSIONS.iter().map(|(ext, _)| *ext)
}

/// An image decoded into memory, tagged with the format it came from.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub image: DynamicImage,
    pub format: SourceFormat,
}

/// Detect the format from the leading bytes.
///
/// Signatures are tried in [`CODEC_PRIORITY`] order and the first match wins.
/// Bytes that look like some other known raster format are reported as
/// [`ImagingError::UnsupportedFormat`]; anything else as [`ImagingError::Decode`].
pub fn detect_format(bytes: &[u8]) -> Result<SourceFormat, ImagingError> {
    if let Some(format) = CODEC_PRIORITY.iter().copied().find(|f| f.matches(bytes)) {
        return Ok(format);
    }
    match image::guess_format(bytes) {
        Ok(other) => Err(ImagingError::UnsupportedFormat(format!("{other:?}"))),
        Err(_) => Err(ImagingError::Decode(
            "data is not a recognized image".to_string(),
        )),
    }
}

/// Detect the format and decode the whole image.
pub fn decode(bytes: &[u8]) -> Result<DecodedImage, ImagingError> {
    let format = detect_format(bytes)?;
    let image = image::load_from_memory_with_format(bytes, format.image_format())
        .map_err(|e| ImagingError::Decode(format!("{format}: {e}")))?;
    Ok(DecodedImage { image, format })
}

/// Encode `image` as `format`.
///
/// JPEG cannot carry alpha, so RGBA and LA images are flattened to RGB first.
pub fn encode(
    image: &DynamicImage,
    format: SourceFormat,
    quality: Quality,
) -> Result<Vec<u8>, ImagingError> {
    let mut buf = Vec::new();
    let result = match format {
        SourceFormat::Png => image.write_with_encoder(PngEncoder::new(&mut buf)),
        SourceFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality.value());
            if image.color().has_alpha() {
                DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)
            } else {
                image.write_with_encoder(encoder)
            }
        }
    };
    result.map_err(|e| ImagingError::Encode {
        format,
        message: e.to_string(),
    })?;
    Ok(buf)
}
