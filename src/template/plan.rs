//! Template plan precomputation for ZNCC scoring.

use crate::image::ImageView;
use crate::util::{SlideError, SlideResult};

/// Precomputed zero-mean buffer and variance of an unmasked template.
///
/// `var_t` is the sum of squared deviations (not divided by the pixel
/// count), which is what the kernels need for the ZNCC denominator.
/// A flat template is legal and has `var_t == 0`; every placement then
/// scores 0.
#[derive(Clone, Debug)]
pub struct TemplatePlan {
    width: usize,
    height: usize,
    mean: f64,
    var_t: f64,
    t_prime: Vec<f64>,
}

impl TemplatePlan {
    /// Builds a plan from a template view.
    pub fn from_view(tpl: ImageView<'_, u8>) -> SlideResult<Self> {
        let width = tpl.width();
        let height = tpl.height();
        let count = width
            .checked_mul(height)
            .ok_or(SlideError::InvalidDimensions { width, height })?;

        let mut sum = 0.0f64;
        for y in 0..height {
            let row = tpl
                .row(y)
                .ok_or(SlideError::InvalidDimensions { width, height })?;
            sum += row.iter().map(|&v| v as f64).sum::<f64>();
        }
        let mean = sum / count as f64;

        let mut t_prime = Vec::with_capacity(count);
        let mut var_t = 0.0f64;
        for y in 0..height {
            let row = tpl
                .row(y)
                .ok_or(SlideError::InvalidDimensions { width, height })?;
            for &value in row {
                let d = value as f64 - mean;
                var_t += d * d;
                t_prime.push(d);
            }
        }

        Ok(Self {
            width,
            height,
            mean,
            var_t,
            t_prime,
        })
    }

    /// Returns the template width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the template height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the mean intensity of the template.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Returns the sum of squared deviations from the mean.
    pub fn var_t(&self) -> f64 {
        self.var_t
    }

    /// Returns the zero-mean template buffer in row-major order.
    pub fn t_prime(&self) -> &[f64] {
        &self.t_prime
    }
}

/// Masked variant of [`TemplatePlan`]; only pixels with a nonzero mask count.
#[derive(Clone, Debug)]
pub struct MaskedTemplatePlan {
    width: usize,
    height: usize,
    mask: Vec<u8>,
    sum_w: f64,
    var_t: f64,
    t_prime: Vec<f64>,
}

impl MaskedTemplatePlan {
    /// Builds a plan from a template view and a row-major 0/1 mask.
    pub fn from_view(tpl: ImageView<'_, u8>, mask: &[u8]) -> SlideResult<Self> {
        let width = tpl.width();
        let height = tpl.height();
        let count = width
            .checked_mul(height)
            .ok_or(SlideError::InvalidDimensions { width, height })?;
        if mask.len() != count {
            return Err(SlideError::BufferTooSmall {
                needed: count,
                got: mask.len(),
            });
        }

        let mut sum = 0.0f64;
        let mut sum_w = 0.0f64;
        for y in 0..height {
            let row = tpl
                .row(y)
                .ok_or(SlideError::InvalidDimensions { width, height })?;
            for (x, &value) in row.iter().enumerate() {
                if mask[y * width + x] != 0 {
                    sum += value as f64;
                    sum_w += 1.0;
                }
            }
        }
        if sum_w == 0.0 {
            return Err(SlideError::NoMatchFound {
                reason: "template mask selects no pixels",
            });
        }
        let mean = sum / sum_w;

        let mut t_prime = vec![0.0f64; count];
        let mut var_t = 0.0f64;
        for y in 0..height {
            let row = tpl
                .row(y)
                .ok_or(SlideError::InvalidDimensions { width, height })?;
            for (x, &value) in row.iter().enumerate() {
                let idx = y * width + x;
                if mask[idx] != 0 {
                    let d = value as f64 - mean;
                    var_t += d * d;
                    t_prime[idx] = d;
                }
            }
        }

        Ok(Self {
            width,
            height,
            mask: mask.iter().map(|&m| u8::from(m != 0)).collect(),
            sum_w,
            var_t,
            t_prime,
        })
    }

    /// Returns the template width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the template height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the 0/1 mask in row-major order.
    pub fn mask(&self) -> &[u8] {
        &self.mask
    }

    /// Returns the number of active mask pixels.
    pub fn sum_w(&self) -> f64 {
        self.sum_w
    }

    /// Returns the masked sum of squared deviations.
    pub fn var_t(&self) -> f64 {
        self.var_t
    }

    /// Returns the zero-mean template buffer; masked-out pixels are 0.
    pub fn t_prime(&self) -> &[f64] {
        &self.t_prime
    }
}
