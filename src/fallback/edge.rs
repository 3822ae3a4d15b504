//! Edge-domain slide detector for puzzle pieces with transparent margins.
//!
//! Slide-captcha pieces usually arrive as an RGBA image whose shape is cut
//! out with alpha, often padded with transparent rows and columns. The
//! detector crops the piece to its opaque bounding box, compares Sobel edge
//! maps instead of raw intensities (the notch in the background is usually
//! shaded, so intensities disagree while edges survive), and restricts the
//! correlation to opaque pixels.

use crate::fallback::SlideDetector;
use crate::image::edges::sobel_edges;
use crate::image::{DecodedImage, ImageCodec};
use crate::kernel::scalar::ZnccMaskedScalar;
use crate::kernel::{scan_best, ScanParams, DEFAULT_MAX_WORK};
use crate::search::{SlideOffset, DEFAULT_RESIZE_FRACTION};
use crate::template::Template;
use crate::trace::{trace_event, trace_span};
use crate::util::math::clamp_coord;
use crate::util::{SlideError, SlideResult};

/// Configuration for [`EdgeSlideDetector`].
#[derive(Clone, Copy, Debug)]
pub struct EdgeDetectorConfig {
    /// Pixels with alpha at or below this value are treated as transparent.
    pub alpha_threshold: u8,
    /// Oversized pieces are resized to this fraction of the background.
    pub resize_fraction: f64,
    /// Edge windows with variance at or below this value score 0.
    pub min_var: f64,
    /// Largest scan accepted, in `placements * template pixels`.
    pub max_work: u64,
    /// Use the rayon row-parallel scan when the feature is enabled.
    pub parallel: bool,
}

impl Default for EdgeDetectorConfig {
    fn default() -> Self {
        Self {
            alpha_threshold: 0,
            resize_fraction: DEFAULT_RESIZE_FRACTION,
            min_var: ScanParams::default().min_var,
            max_work: DEFAULT_MAX_WORK,
            parallel: cfg!(feature = "rayon"),
        }
    }
}

/// Default [`SlideDetector`]: masked ZNCC over Sobel edge maps.
#[derive(Clone, Debug, Default)]
pub struct EdgeSlideDetector {
    codec: ImageCodec,
    cfg: EdgeDetectorConfig,
}

impl EdgeSlideDetector {
    /// Creates a detector with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the detector configuration.
    pub fn with_config(mut self, cfg: EdgeDetectorConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Locates `template` inside `background` and returns the template's
    /// top-left offset, clamped to the valid placement range.
    pub fn locate(
        &self,
        background: &DecodedImage,
        template: &DecodedImage,
    ) -> SlideResult<SlideOffset> {
        let _span = trace_span!("edge_detect").entered();
        let alpha = template.alpha_mask(self.cfg.alpha_threshold);
        let (cx, cy, cw, ch) = opaque_bounds(&alpha, template.width(), template.height()).ok_or(
            SlideError::NoMatchFound {
                reason: "template is fully transparent",
            },
        )?;
        let piece = template.crop(cx, cy, cw, ch);

        // (piece, crop offset inside the template, template size for clamping)
        let (piece, crop_offset, tpl_dims) = if piece.is_too_large_for(background) {
            let resized = piece.resized_to_fraction(background, self.cfg.resize_fraction)?;
            let dims = (resized.width(), resized.height());
            (resized, (0, 0), dims)
        } else {
            (piece, (cx, cy), (template.width(), template.height()))
        };

        let mut mask = piece.alpha_mask(self.cfg.alpha_threshold);
        clear_border(&mut mask, piece.width() as usize, piece.height() as usize);

        let bg_edges = sobel_edges(background.to_luma()?.view())?;
        let piece_edges = sobel_edges(piece.to_luma()?.view())?;
        let plan = Template::from_luma(piece_edges)
            .with_mask(mask)
            .masked_plan()?;
        let params = ScanParams {
            min_var: self.cfg.min_var,
            max_work: self.cfg.max_work,
        };
        let peak =
            scan_best::<ZnccMaskedScalar>(bg_edges.view(), &plan, params, self.cfg.parallel)?;
        trace_event!(
            "edge_detect_peak",
            x = peak.x,
            y = peak.y,
            score = peak.score
        );

        let max_x = background.width().saturating_sub(tpl_dims.0);
        let max_y = background.height().saturating_sub(tpl_dims.1);
        Ok(SlideOffset::new(
            clamp_coord(peak.x as i64 - crop_offset.0 as i64, max_x),
            clamp_coord(peak.y as i64 - crop_offset.1 as i64, max_y),
        ))
    }
}

impl SlideDetector for EdgeSlideDetector {
    fn detect(&self, background: &[u8], template: &[u8]) -> SlideResult<SlideOffset> {
        let background = self.codec.decode(background)?;
        let template = self.codec.decode(template)?;
        self.locate(&background, &template)
    }
}

/// Bounding box `(x, y, width, height)` of the nonzero mask entries.
fn opaque_bounds(mask: &[u8], width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let (w, h) = (width as usize, height as usize);
    let mut min_x = w;
    let mut min_y = h;
    let mut max_x = 0usize;
    let mut max_y = 0usize;
    let mut any = false;
    for y in 0..h {
        for x in 0..w {
            if mask[y * w + x] != 0 {
                any = true;
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }
    }
    any.then(|| {
        (
            min_x as u32,
            min_y as u32,
            (max_x - min_x + 1) as u32,
            (max_y - min_y + 1) as u32,
        )
    })
}

/// Sobel leaves a one-pixel border without gradient; exclude it from the mask.
fn clear_border(mask: &mut [u8], width: usize, height: usize) {
    for y in 0..height {
        for x in 0..width {
            if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
                mask[y * width + x] = 0;
            }
        }
    }
}
