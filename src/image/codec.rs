//! Decoding and validation of raw captcha image bytes.
//!
//! Any raster format enabled on the `image` crate is accepted (PNG, JPEG,
//! GIF, BMP, WebP). Decoding is pure: the same bytes always produce the same
//! outcome. Headers are checked against a maximum side length before any
//! pixel buffer is allocated.

use std::fmt;
use std::io::Cursor;

use ::image::imageops::FilterType;
use ::image::{DynamicImage, GrayImage, ImageReader, Limits, Luma};

use crate::image::OwnedImage;
use crate::util::math::scaled_len;
use crate::util::{SlideError, SlideResult};

/// Smallest accepted width and height, in pixels.
pub const MIN_DIMENSION: u32 = 10;

/// Largest accepted width and height, in pixels.
pub const MAX_DIMENSION: u32 = 4096;

/// Outcome of decoding and validating one image.
///
/// `Err` is always [`SlideError::DecodeFailed`] or [`SlideError::TooSmall`].
pub type ValidationOutcome = SlideResult<DecodedImage>;

/// Decodes raw bytes and rejects images outside the accepted size range.
#[derive(Clone, Copy, Debug)]
pub struct ImageCodec {
    min_dimension: u32,
    max_dimension: u32,
}

impl Default for ImageCodec {
    fn default() -> Self {
        Self {
            min_dimension: MIN_DIMENSION,
            max_dimension: MAX_DIMENSION,
        }
    }
}

impl ImageCodec {
    /// Creates a codec with a custom minimum dimension.
    pub fn with_min_dimension(min_dimension: u32) -> Self {
        Self {
            min_dimension,
            ..Self::default()
        }
    }

    /// Replaces the maximum accepted width and height.
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    /// Returns the minimum accepted width and height.
    pub fn min_dimension(&self) -> u32 {
        self.min_dimension
    }

    /// Returns the maximum accepted width and height.
    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Decodes `bytes` and checks the size range.
    ///
    /// Images wider or taller than the maximum are [`SlideError::DecodeFailed`];
    /// the decoder refuses them from the header alone.
    pub fn decode(&self, bytes: &[u8]) -> ValidationOutcome {
        if bytes.is_empty() {
            return Err(SlideError::DecodeFailed {
                reason: "empty image data".to_string(),
            });
        }
        let mut limits = Limits::default();
        limits.max_image_width = Some(self.max_dimension);
        limits.max_image_height = Some(self.max_dimension);
        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(decode_failed)?;
        reader.limits(limits);
        let img = reader.decode().map_err(decode_failed)?;
        let (width, height) = (img.width(), img.height());
        if width > self.max_dimension || height > self.max_dimension {
            return Err(decode_failed(format_args!(
                "{width}x{height} exceeds {}px per side",
                self.max_dimension
            )));
        }
        if width < self.min_dimension || height < self.min_dimension {
            return Err(SlideError::TooSmall {
                width,
                height,
                min: self.min_dimension,
            });
        }
        Ok(DecodedImage::new(img))
    }
}

fn decode_failed(err: impl fmt::Display) -> SlideError {
    SlideError::DecodeFailed {
        reason: err.to_string(),
    }
}

/// ITU-R BT.601 luma, rounded: `0.299 R + 0.587 G + 0.114 B`.
fn rec601_luma([r, g, b]: [u8; 3]) -> u8 {
    let weighted = 299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b);
    ((weighted + 500) / 1000) as u8
}

/// A decoded raster image, color or grayscale, with or without alpha.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    img: DynamicImage,
}

impl DecodedImage {
    /// Wraps an already decoded image without validation.
    pub fn new(img: DynamicImage) -> Self {
        Self { img }
    }

    /// Returns the width in pixels.
    pub fn width(&self) -> u32 {
        self.img.width()
    }

    /// Returns the height in pixels.
    pub fn height(&self) -> u32 {
        self.img.height()
    }

    /// Number of channels in the decoded pixel format.
    pub fn channels(&self) -> u8 {
        self.img.color().channel_count()
    }

    /// Whether the pixel format carries an alpha channel.
    pub fn has_alpha(&self) -> bool {
        self.img.color().has_alpha()
    }

    /// Borrow the underlying `image` buffer.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.img
    }

    /// Converts to single-channel 8-bit intensity (Rec. 601 luma).
    ///
    /// Alpha is dropped. Gray input passes through unchanged.
    pub fn to_luma(&self) -> SlideResult<OwnedImage> {
        let rgb = self.img.to_rgb8();
        let luma = GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
            Luma([rec601_luma(rgb.get_pixel(x, y).0)])
        });
        OwnedImage::try_from(luma)
    }

    /// Row-major mask with 1 where alpha is above `threshold`, 0 elsewhere.
    ///
    /// Images without an alpha channel are fully opaque.
    pub fn alpha_mask(&self, threshold: u8) -> Vec<u8> {
        let len = self.width() as usize * self.height() as usize;
        if !self.has_alpha() {
            return vec![1; len];
        }
        self.img
            .to_rgba8()
            .pixels()
            .map(|px| u8::from(px.0[3] > threshold))
            .collect()
    }

    /// True when this image does not fit strictly inside `background`.
    pub fn is_too_large_for(&self, background: &DecodedImage) -> bool {
        self.width() >= background.width() || self.height() >= background.height()
    }

    /// Resizes to `fraction` of the background's width and height.
    ///
    /// A fraction that truncates either side to zero pixels yields
    /// [`SlideError::NoMatchFound`].
    pub fn resized_to_fraction(
        &self,
        background: &DecodedImage,
        fraction: f64,
    ) -> SlideResult<DecodedImage> {
        let width = scaled_len(background.width(), fraction);
        let height = scaled_len(background.height(), fraction);
        if width == 0 || height == 0 {
            return Err(SlideError::NoMatchFound {
                reason: "template resized to an empty image",
            });
        }
        Ok(Self::new(
            self.img.resize_exact(width, height, FilterType::Triangle),
        ))
    }

    /// Copies out the rectangle at `(x, y)` with the given size.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> DecodedImage {
        Self::new(self.img.crop_imm(x, y, width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::{DecodedImage, ImageCodec, MIN_DIMENSION};
    use crate::util::SlideError;
    use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode_png(img: &DynamicImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn gray(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(width, height, |x, y| {
            Luma([((x * 31 + y * 17) & 0xFF) as u8])
        }))
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = ImageCodec::default()
            .decode(b"definitely not an image")
            .unwrap_err();
        assert!(matches!(err, SlideError::DecodeFailed { .. }));
        assert!(err.is_validation());
    }

    #[test]
    fn empty_bytes_fail_to_decode() {
        let err = ImageCodec::default().decode(&[]).unwrap_err();
        assert!(matches!(err, SlideError::DecodeFailed { .. }));
    }

    #[test]
    fn images_below_minimum_are_too_small() {
        let bytes = encode_png(&gray(40, 9));
        let err = ImageCodec::default().decode(&bytes).unwrap_err();
        assert_eq!(
            err,
            SlideError::TooSmall {
                width: 40,
                height: 9,
                min: MIN_DIMENSION,
            }
        );
    }

    #[test]
    fn minimum_size_is_accepted() {
        let bytes = encode_png(&gray(10, 10));
        let decoded = ImageCodec::default().decode(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 10));
        assert_eq!(decoded.channels(), 1);
        assert!(!decoded.has_alpha());
    }

    #[test]
    fn images_above_maximum_fail_to_decode() {
        let codec = ImageCodec::default().with_max_dimension(64);
        assert_eq!(codec.max_dimension(), 64);
        assert!(codec.decode(&encode_png(&gray(64, 20))).is_ok());

        let err = codec.decode(&encode_png(&gray(65, 20))).unwrap_err();
        assert!(matches!(err, SlideError::DecodeFailed { .. }));
        let err = codec.decode(&encode_png(&gray(20, 200))).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn luma_uses_rec601_weights() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 255, 0]));
        img.put_pixel(2, 0, Rgb([0, 0, 255]));
        img.put_pixel(0, 1, Rgb([255, 255, 255]));
        img.put_pixel(1, 1, Rgb([0, 0, 0]));
        img.put_pixel(2, 1, Rgb([100, 150, 200]));
        let luma = DecodedImage::new(DynamicImage::ImageRgb8(img))
            .to_luma()
            .unwrap();
        assert_eq!(luma.data(), &[76, 150, 29, 255, 0, 141]);

        let plain = gray(12, 10);
        let passthrough = DecodedImage::new(plain.clone()).to_luma().unwrap();
        assert_eq!(passthrough.data(), plain.as_bytes());
    }

    #[test]
    fn alpha_mask_tracks_transparency() {
        let mut img = RgbaImage::from_pixel(12, 10, Rgba([200, 10, 10, 255]));
        img.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        img.put_pixel(11, 9, Rgba([0, 0, 0, 0]));
        let decoded = DecodedImage::new(DynamicImage::ImageRgba8(img));
        let mask = decoded.alpha_mask(0);
        assert_eq!(mask.len(), 120);
        assert_eq!(mask[0], 0);
        assert_eq!(mask[119], 0);
        assert_eq!(mask.iter().map(|&m| m as usize).sum::<usize>(), 118);

        let opaque = DecodedImage::new(gray(12, 10));
        assert!(opaque.alpha_mask(0).iter().all(|&m| m == 1));
    }

    #[test]
    fn oversized_template_resizes_to_fraction_of_background() {
        let background = DecodedImage::new(gray(100, 50));
        let template = DecodedImage::new(gray(120, 50));
        assert!(template.is_too_large_for(&background));

        let resized = template.resized_to_fraction(&background, 0.3).unwrap();
        assert_eq!((resized.width(), resized.height()), (30, 15));
        assert!(!resized.is_too_large_for(&background));
    }

    #[test]
    fn zero_fraction_resize_is_no_match() {
        let background = DecodedImage::new(gray(100, 50));
        let template = DecodedImage::new(gray(120, 50));
        let err = template.resized_to_fraction(&background, 0.0).unwrap_err();
        assert!(matches!(err, SlideError::NoMatchFound { .. }));
    }
}
