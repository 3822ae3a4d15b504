//! Correlation kernel implementations.

use crate::candidate::peak::Peak;
use crate::util::SlideResult;
use crate::ImageView;

/// Default cap on `placements * template pixels` for one full scan.
///
/// About a second of scalar work. A typical 320x160 background with a 50x50
/// piece needs roughly 7.5e7.
pub const DEFAULT_MAX_WORK: u64 = 1 << 30;

/// Scan configuration for kernel evaluations.
#[derive(Clone, Copy, Debug)]
pub struct ScanParams {
    /// Variance at or below which a window (or the template) scores 0.
    pub min_var: f64,
    /// Scans needing more than this many pixel products are refused with
    /// [`SlideError::NoMatchFound`](crate::SlideError::NoMatchFound).
    pub max_work: u64,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            min_var: 1e-8,
            max_work: DEFAULT_MAX_WORK,
        }
    }
}

/// Kernel trait for scoring and scan operations.
pub trait Kernel {
    type Plan;

    /// Returns `(width, height)` of the planned template.
    fn plan_dims(plan: &Self::Plan) -> (usize, usize);

    /// Computes the score at a single placement (top-left coordinates).
    ///
    /// Placements outside the valid range score `f64::NEG_INFINITY`.
    fn score_at(image: ImageView<'_, u8>, plan: &Self::Plan, x: usize, y: usize, min_var: f64)
        -> f64;

    /// Scans every placement and returns the best one in row-major order.
    fn scan_best(image: ImageView<'_, u8>, plan: &Self::Plan, params: ScanParams)
        -> SlideResult<Peak>;
}

pub mod scalar;

#[cfg(feature = "rayon")]
pub mod rayon;

/// Runs `K`'s full scan, row-parallel when `parallel` is set and the
/// `rayon` feature is enabled.
pub fn scan_best<K>(
    image: ImageView<'_, u8>,
    plan: &K::Plan,
    params: ScanParams,
    parallel: bool,
) -> SlideResult<Peak>
where
    K: Kernel,
    K::Plan: Sync,
{
    #[cfg(feature = "rayon")]
    if parallel {
        return self::rayon::scan_best_par::<K>(image, plan, params);
    }
    #[cfg(not(feature = "rayon"))]
    let _ = parallel;
    K::scan_best(image, plan, params)
}
