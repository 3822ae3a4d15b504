//! Error types for slidematch.

use thiserror::Error;

/// Result alias for slidematch operations.
pub type SlideResult<T> = std::result::Result<T, SlideError>;

/// Errors produced while decoding, matching or recognizing captcha images.
///
/// Every stage of the slide pipeline returns one of these as a plain value;
/// the coordinator decides which of them are recovered to the default offset.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SlideError {
    /// The bytes could not be parsed as a raster image.
    #[error("image decode failed: {reason}")]
    DecodeFailed { reason: String },
    /// The image decoded but is below the minimum usable size.
    #[error("image too small: {width}x{height} (minimum {min}px per side)")]
    TooSmall { width: u32, height: u32, min: u32 },
    /// Width or height is zero, or their product overflows.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// The backing buffer is shorter than the view requires.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// The matcher could not produce an alignment.
    #[error("no match found: {reason}")]
    NoMatchFound { reason: &'static str },
    /// The slide detection capability failed.
    #[error("slide detector failed: {reason}")]
    DetectorFailed { reason: String },
    /// The text recognition capability failed.
    #[error("text recognition failed: {reason}")]
    ClassificationFailed { reason: String },
}

impl SlideError {
    /// Returns true for errors that come from validating the input images.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::DecodeFailed { .. } | Self::TooSmall { .. })
    }
}
