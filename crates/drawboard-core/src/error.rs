//! Error types for the document engine.
//!
//! None of these reach the end user as a blocking failure. Engine-level
//! operations log them and leave the document in its last valid state.

use thiserror::Error;

/// Errors raised while turning serialized records back into nodes.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Unknown node type tag: {0}")]
    UnknownType(String),
    #[error("Malformed record: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Frame {0} cannot be nested inside another frame")]
    NestedFrame(String),
}

/// Result type for record conversion.
pub type RecordResult<T> = Result<T, RecordError>;

/// Image loading errors.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image data is empty")]
    Empty,
    #[error("Unsupported image format")]
    UnsupportedFormat,
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Image has zero size")]
    ZeroSize,
}

impl From<image::ImageError> for ImageError {
    fn from(err: image::ImageError) -> Self {
        ImageError::Decode(err.to_string())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
