//! Numeric helpers shared by the kernels and the size normalization.

/// Scales a pixel length by `fraction`, truncating toward zero.
pub(crate) fn scaled_len(len: u32, fraction: f64) -> u32 {
    let scaled = (len as f64 * fraction).floor();
    if scaled.is_finite() && scaled > 0.0 {
        scaled.min(u32::MAX as f64) as u32
    } else {
        0
    }
}

/// Clamps a signed placement coordinate into `[0, max]`.
pub(crate) fn clamp_coord(value: i64, max: u32) -> u32 {
    value.clamp(0, max as i64) as u32
}

/// Final ZNCC normalization: `dot / sqrt(var_t * var_i)`.
///
/// Returns 0 when either variance is at or below `min_var`, and for any
/// non-finite intermediate.
#[inline]
pub(crate) fn zncc(dot: f64, var_t: f64, var_i: f64, min_var: f64) -> f64 {
    if var_t <= min_var || var_i <= min_var {
        return 0.0;
    }
    let score = dot / (var_t * var_i).sqrt();
    if score.is_finite() {
        score.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}
