//! Primary slide matcher: size normalization plus exhaustive ZNCC search.
//!
//! The matcher converts both images to luma, scores every placement of the
//! template fully inside the background with the zero-mean normalized
//! cross-correlation, and returns the top-left of the best placement. Ties
//! resolve to the first placement in row-major order.

use std::borrow::Cow;
use std::fmt;

use crate::image::DecodedImage;
use crate::kernel::scalar::ZnccScalar;
use crate::kernel::{scan_best, ScanParams, DEFAULT_MAX_WORK};
use crate::template::Template;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{SlideError, SlideResult};
use crate::{ImageView, Peak};

/// Fraction of the background size an oversized template is resized to.
pub const DEFAULT_RESIZE_FRACTION: f64 = 0.3;

/// Top-left pixel offset of the template inside the background.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlideOffset {
    /// Horizontal offset in pixels.
    pub x: u32,
    /// Vertical offset in pixels.
    pub y: u32,
}

impl SlideOffset {
    /// Offset answered whenever no real match could be computed.
    ///
    /// This is a fixed policy value; it is not derived from any image and
    /// may lie outside the valid placement range of a given request.
    pub const DEFAULT: SlideOffset = SlideOffset { x: 150, y: 0 };

    /// Creates an offset.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for SlideOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Configuration for [`TemplateMatcher`].
#[derive(Clone, Copy, Debug)]
pub struct MatchConfig {
    /// Oversized templates are resized to this fraction of the background.
    pub resize_fraction: f64,
    /// Windows with variance at or below this value score 0.
    pub min_var: f64,
    /// Largest scan accepted, in `placements * template pixels`.
    pub max_work: u64,
    /// Use the rayon row-parallel scan when the feature is enabled.
    pub parallel: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            resize_fraction: DEFAULT_RESIZE_FRACTION,
            min_var: ScanParams::default().min_var,
            max_work: DEFAULT_MAX_WORK,
            parallel: cfg!(feature = "rayon"),
        }
    }
}

/// Correlation-based matcher for pre-validated images.
#[derive(Clone, Debug, Default)]
pub struct TemplateMatcher {
    cfg: MatchConfig,
}

impl TemplateMatcher {
    /// Creates a matcher with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the matcher configuration.
    pub fn with_config(mut self, cfg: MatchConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &MatchConfig {
        &self.cfg
    }

    /// Applies the size rule: a template that does not fit strictly inside
    /// the background is resized to `resize_fraction` of the background.
    pub fn normalize_template<'a>(
        &self,
        background: &DecodedImage,
        template: &'a DecodedImage,
    ) -> SlideResult<Cow<'a, DecodedImage>> {
        if !template.is_too_large_for(background) {
            return Ok(Cow::Borrowed(template));
        }
        let resized = template.resized_to_fraction(background, self.cfg.resize_fraction)?;
        trace_warn!(
            from_width = template.width(),
            from_height = template.height(),
            to_width = resized.width(),
            to_height = resized.height(),
            "template larger than background, resized"
        );
        Ok(Cow::Owned(resized))
    }

    /// Finds the best-alignment offset of `template` inside `background`.
    pub fn match_images(
        &self,
        background: &DecodedImage,
        template: &DecodedImage,
    ) -> SlideResult<SlideOffset> {
        let _span = trace_span!("template_match").entered();
        let template = self.normalize_template(background, template)?;
        let bg_luma = background.to_luma()?;
        let tpl = Template::from_decoded(&template)?;
        let peak = self.match_luma(bg_luma.view(), &tpl)?;
        trace_event!(
            "template_match_peak",
            x = peak.x,
            y = peak.y,
            score = peak.score
        );
        to_offset(peak)
    }

    /// Scans a luma background with a luma template and returns the best peak.
    pub fn match_luma(&self, background: ImageView<'_, u8>, template: &Template) -> SlideResult<Peak> {
        let plan = template.plan()?;
        let params = ScanParams {
            min_var: self.cfg.min_var,
            max_work: self.cfg.max_work,
        };
        scan_best::<ZnccScalar>(background, &plan, params, self.cfg.parallel)
    }
}

pub(crate) fn to_offset(peak: Peak) -> SlideResult<SlideOffset> {
    let x = u32::try_from(peak.x).map_err(|_| SlideError::NoMatchFound {
        reason: "offset exceeds u32",
    })?;
    let y = u32::try_from(peak.y).map_err(|_| SlideError::NoMatchFound {
        reason: "offset exceeds u32",
    })?;
    Ok(SlideOffset::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::{MatchConfig, SlideOffset, TemplateMatcher};
    use crate::image::DecodedImage;
    use crate::util::SlideError;
    use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn noise_rgb(width: u32, height: u32, seed: u64) -> RgbImage {
        let mut rng = StdRng::seed_from_u64(seed);
        RgbImage::from_fn(width, height, |_, _| Rgb([rng.random(), rng.random(), rng.random()]))
    }

    fn crop(img: &RgbImage, x: u32, y: u32, width: u32, height: u32) -> DecodedImage {
        DecodedImage::new(DynamicImage::ImageRgb8(
            image::imageops::crop_imm(img, x, y, width, height).to_image(),
        ))
    }

    #[test]
    fn exact_copy_is_found_at_its_offset() {
        let bg = noise_rgb(90, 40, 7);
        let template = crop(&bg, 37, 12, 16, 14);
        let background = DecodedImage::new(DynamicImage::ImageRgb8(bg));
        let offset = TemplateMatcher::new()
            .match_images(&background, &template)
            .unwrap();
        assert_eq!(offset, SlideOffset::new(37, 12));
    }

    #[test]
    fn result_lies_inside_placement_range() {
        let background = DecodedImage::new(DynamicImage::ImageRgb8(noise_rgb(60, 30, 11)));
        let template = DecodedImage::new(DynamicImage::ImageRgb8(noise_rgb(13, 9, 12)));
        let offset = TemplateMatcher::new()
            .match_images(&background, &template)
            .unwrap();
        assert!(offset.x <= 60 - 13);
        assert!(offset.y <= 30 - 9);
    }

    #[test]
    fn oversized_template_is_normalized_before_matching() {
        let background = DecodedImage::new(DynamicImage::ImageRgb8(noise_rgb(80, 40, 3)));
        let template = DecodedImage::new(DynamicImage::ImageRgb8(noise_rgb(80, 60, 4)));
        let matcher = TemplateMatcher::new();
        let normalized = matcher.normalize_template(&background, &template).unwrap();
        assert_eq!((normalized.width(), normalized.height()), (24, 12));

        let offset = matcher.match_images(&background, &template).unwrap();
        assert!(offset.x <= 80 - 24);
        assert!(offset.y <= 40 - 12);
    }

    #[test]
    fn fitting_template_is_not_resized() {
        let background = DecodedImage::new(DynamicImage::ImageRgb8(noise_rgb(80, 40, 3)));
        let template = DecodedImage::new(DynamicImage::ImageRgb8(noise_rgb(79, 39, 4)));
        let normalized = TemplateMatcher::new()
            .normalize_template(&background, &template)
            .unwrap();
        assert_eq!((normalized.width(), normalized.height()), (79, 39));
    }

    #[test]
    fn flat_template_resolves_to_origin() {
        let background = DecodedImage::new(DynamicImage::ImageRgb8(noise_rgb(40, 20, 5)));
        let template = DecodedImage::new(DynamicImage::ImageLuma8(GrayImage::from_pixel(
            10,
            10,
            Luma([128]),
        )));
        let offset = TemplateMatcher::new()
            .match_images(&background, &template)
            .unwrap();
        assert_eq!(offset, SlideOffset::new(0, 0));
    }

    #[test]
    fn zero_resize_fraction_yields_no_match() {
        let background = DecodedImage::new(DynamicImage::ImageRgb8(noise_rgb(40, 20, 5)));
        let template = DecodedImage::new(DynamicImage::ImageRgb8(noise_rgb(50, 20, 6)));
        let matcher = TemplateMatcher::new().with_config(MatchConfig {
            resize_fraction: 0.0,
            ..MatchConfig::default()
        });
        let err = matcher.match_images(&background, &template).unwrap_err();
        assert!(matches!(err, SlideError::NoMatchFound { .. }));
    }

    #[test]
    fn repeated_matching_is_deterministic() {
        let bg = noise_rgb(70, 35, 21);
        let template = crop(&bg, 5, 20, 12, 12);
        let background = DecodedImage::new(DynamicImage::ImageRgb8(bg));
        let matcher = TemplateMatcher::new();
        let first = matcher.match_images(&background, &template).unwrap();
        for _ in 0..3 {
            assert_eq!(matcher.match_images(&background, &template).unwrap(), first);
        }
    }
}
