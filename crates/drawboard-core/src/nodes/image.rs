//! Image node geometry and image source handling.

use super::NodeGeometry;
use crate::error::ImageError;
use base64::{Engine, engine::general_purpose::STANDARD};
use kurbo::Rect;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Image format for embedded image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }
}

/// Where the pixels of an image node come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageSource {
    /// A URL the renderer resolves (object URLs for pasted or dropped files).
    Url { url: String },
    /// Bytes embedded in the document, base64 encoded.
    Embedded {
        format: ImageFormat,
        data_base64: String,
    },
}

impl ImageSource {
    pub fn url(url: impl Into<String>) -> Self {
        ImageSource::Url { url: url.into() }
    }

    pub fn embedded(format: ImageFormat, data: &[u8]) -> Self {
        ImageSource::Embedded {
            format,
            data_base64: STANDARD.encode(data),
        }
    }

    /// Raw bytes of an embedded source.
    pub fn data(&self) -> Option<Vec<u8>> {
        match self {
            ImageSource::Embedded { data_base64, .. } => STANDARD.decode(data_base64).ok(),
            ImageSource::Url { .. } => None,
        }
    }
}

/// Detect the format of `data` and read its natural pixel dimensions.
pub fn decode_dimensions(data: &[u8]) -> Result<(ImageFormat, u32, u32), ImageError> {
    if data.is_empty() {
        return Err(ImageError::Empty);
    }
    let format = ImageFormat::from_magic_bytes(data).ok_or(ImageError::UnsupportedFormat)?;
    let (width, height) = image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ImageError::Decode(e.to_string()))?
        .into_dimensions()?;
    if width == 0 || height == 0 {
        return Err(ImageError::ZeroSize);
    }
    Ok((format, width, height))
}

/// A raster image displayed at `width` x `height`.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub width: f64,
    pub height: f64,
    /// Natural width in pixels.
    pub source_width: u32,
    /// Natural height in pixels.
    pub source_height: u32,
    pub source: ImageSource,
}

impl Image {
    /// Create an image displayed at its natural size.
    pub fn new(source: ImageSource, source_width: u32, source_height: u32) -> Self {
        Self {
            width: source_width as f64,
            height: source_height as f64,
            source_width,
            source_height,
            source,
        }
    }
}

impl NodeGeometry for Image {
    fn local_bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}
