//! Scalar reference kernels for score evaluation.

use crate::candidate::peak::{BestPeak, Peak};
use crate::kernel::{Kernel, ScanParams};
use crate::template::{MaskedTemplatePlan, TemplatePlan};
use crate::util::math::zncc;
use crate::util::{SlideError, SlideResult};
use crate::ImageView;

/// Scalar unmasked ZNCC kernel (TM_CCOEFF_NORMED).
pub struct ZnccScalar;

/// Scalar masked ZNCC kernel; masked-out template pixels are ignored.
pub struct ZnccMaskedScalar;

/// Largest valid top-left placement, or an error if the template does not fit
/// or the scan would exceed `max_work`.
pub(crate) fn placement_range(
    image: ImageView<'_, u8>,
    tpl_width: usize,
    tpl_height: usize,
    max_work: u64,
) -> SlideResult<(usize, usize)> {
    let img_width = image.width();
    let img_height = image.height();
    if tpl_width == 0 || tpl_height == 0 {
        return Err(SlideError::InvalidDimensions {
            width: tpl_width,
            height: tpl_height,
        });
    }
    if img_width < tpl_width || img_height < tpl_height {
        return Err(SlideError::NoMatchFound {
            reason: "template does not fit inside the background",
        });
    }
    let (max_x, max_y) = (img_width - tpl_width, img_height - tpl_height);
    let work = [max_x + 1, max_y + 1, tpl_width, tpl_height]
        .into_iter()
        .fold(1u64, |acc, n| acc.saturating_mul(n as u64));
    if work > max_work {
        return Err(SlideError::NoMatchFound {
            reason: "search exceeds the work budget",
        });
    }
    Ok((max_x, max_y))
}

/// Scores every placement on row `y` into `best`.
pub(crate) fn scan_row<K: Kernel>(
    image: ImageView<'_, u8>,
    plan: &K::Plan,
    y: usize,
    max_x: usize,
    params: ScanParams,
    best: &mut BestPeak,
) {
    for x in 0..=max_x {
        let score = K::score_at(image, plan, x, y, params.min_var);
        best.push(Peak { x, y, score });
    }
}

fn scan_best_sequential<K: Kernel>(
    image: ImageView<'_, u8>,
    plan: &K::Plan,
    params: ScanParams,
) -> SlideResult<Peak> {
    let (tpl_width, tpl_height) = K::plan_dims(plan);
    let (max_x, max_y) = placement_range(image, tpl_width, tpl_height, params.max_work)?;
    let mut best = BestPeak::new();
    for y in 0..=max_y {
        scan_row::<K>(image, plan, y, max_x, params, &mut best);
    }
    best.into_inner().ok_or(SlideError::NoMatchFound {
        reason: "no placement was scored",
    })
}

fn in_range(image: ImageView<'_, u8>, dims: (usize, usize), x: usize, y: usize) -> bool {
    let (tpl_width, tpl_height) = dims;
    image.width() >= tpl_width
        && image.height() >= tpl_height
        && x <= image.width() - tpl_width
        && y <= image.height() - tpl_height
}

impl Kernel for ZnccScalar {
    type Plan = TemplatePlan;

    fn plan_dims(plan: &Self::Plan) -> (usize, usize) {
        (plan.width(), plan.height())
    }

    fn score_at(
        image: ImageView<'_, u8>,
        tpl: &Self::Plan,
        x: usize,
        y: usize,
        min_var: f64,
    ) -> f64 {
        let dims = Self::plan_dims(tpl);
        if !in_range(image, dims, x, y) {
            return f64::NEG_INFINITY;
        }
        let (tpl_width, tpl_height) = dims;
        let var_t = tpl.var_t();
        if var_t <= min_var {
            return 0.0;
        }
        let t_prime = tpl.t_prime();
        let n = (tpl_width * tpl_height) as f64;

        let mut dot = 0.0f64;
        let mut sum_i = 0.0f64;
        let mut sum_i2 = 0.0f64;
        for ty in 0..tpl_height {
            let Some(img_row) = image.row(y + ty) else {
                return f64::NEG_INFINITY;
            };
            let base = ty * tpl_width;
            for (tx, &px) in img_row[x..x + tpl_width].iter().enumerate() {
                let value = px as f64;
                dot += t_prime[base + tx] * value;
                sum_i += value;
                sum_i2 += value * value;
            }
        }

        let var_i = sum_i2 - (sum_i * sum_i) / n;
        zncc(dot, var_t, var_i, min_var)
    }

    fn scan_best(
        image: ImageView<'_, u8>,
        tpl: &Self::Plan,
        params: ScanParams,
    ) -> SlideResult<Peak> {
        scan_best_sequential::<Self>(image, tpl, params)
    }
}

impl Kernel for ZnccMaskedScalar {
    type Plan = MaskedTemplatePlan;

    fn plan_dims(plan: &Self::Plan) -> (usize, usize) {
        (plan.width(), plan.height())
    }

    fn score_at(
        image: ImageView<'_, u8>,
        tpl: &Self::Plan,
        x: usize,
        y: usize,
        min_var: f64,
    ) -> f64 {
        let dims = Self::plan_dims(tpl);
        if !in_range(image, dims, x, y) {
            return f64::NEG_INFINITY;
        }
        let (tpl_width, tpl_height) = dims;
        let var_t = tpl.var_t();
        if var_t <= min_var {
            return 0.0;
        }
        let t_prime = tpl.t_prime();
        let mask = tpl.mask();
        let sum_w = tpl.sum_w();

        let mut dot = 0.0f64;
        let mut sum_i = 0.0f64;
        let mut sum_i2 = 0.0f64;
        for ty in 0..tpl_height {
            let Some(img_row) = image.row(y + ty) else {
                return f64::NEG_INFINITY;
            };
            let base = ty * tpl_width;
            for (tx, &px) in img_row[x..x + tpl_width].iter().enumerate() {
                let idx = base + tx;
                if mask[idx] == 0 {
                    continue;
                }
                let value = px as f64;
                dot += t_prime[idx] * value;
                sum_i += value;
                sum_i2 += value * value;
            }
        }

        let var_i = sum_i2 - (sum_i * sum_i) / sum_w;
        zncc(dot, var_t, var_i, min_var)
    }

    fn scan_best(
        image: ImageView<'_, u8>,
        tpl: &Self::Plan,
        params: ScanParams,
    ) -> SlideResult<Peak> {
        scan_best_sequential::<Self>(image, tpl, params)
    }
}
