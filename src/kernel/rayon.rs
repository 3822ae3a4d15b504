//! Rayon-parallel scans (feature-gated).
//!
//! Rows of placements are scored in parallel; each worker keeps its own
//! best peak and the partial results are merged with the same row-major
//! tie-break as the scalar scan, so both paths return identical peaks.

use crate::candidate::peak::{BestPeak, Peak};
use crate::kernel::scalar::{placement_range, scan_row};
use crate::kernel::{Kernel, ScanParams};
use crate::util::{SlideError, SlideResult};
use crate::ImageView;
use rayon::prelude::*;

/// Row-parallel full scan for any kernel whose plan can be shared across threads.
pub fn scan_best_par<K>(
    image: ImageView<'_, u8>,
    plan: &K::Plan,
    params: ScanParams,
) -> SlideResult<Peak>
where
    K: Kernel,
    K::Plan: Sync,
{
    let (tpl_width, tpl_height) = K::plan_dims(plan);
    let (max_x, max_y) = placement_range(image, tpl_width, tpl_height, params.max_work)?;

    (0..=max_y)
        .into_par_iter()
        .map(|y| {
            let mut best = BestPeak::new();
            scan_row::<K>(image, plan, y, max_x, params, &mut best);
            best
        })
        .reduce(BestPeak::new, BestPeak::merge)
        .into_inner()
        .ok_or(SlideError::NoMatchFound {
            reason: "no placement was scored",
        })
}
