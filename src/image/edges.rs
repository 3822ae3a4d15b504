//! Sobel edge maps for edge-domain matching.

use crate::image::{ImageView, OwnedImage};
use crate::util::{SlideError, SlideResult};

/// `|gx| + |gy|` peaks at 8 * 255; scaling by 1/8 maps it back to `u8`.
const EDGE_SCALE: f32 = 1.0 / 8.0;

/// Computes an 8-bit Sobel gradient-magnitude image.
///
/// Border pixels have no full 3x3 neighborhood and are set to 0.
pub fn sobel_edges(src: ImageView<'_, u8>) -> SlideResult<OwnedImage> {
    let width = src.width();
    let height = src.height();
    let mut out = vec![0u8; width * height];
    if width >= 3 && height >= 3 {
        for y in 1..height - 1 {
            let (Some(above), Some(row), Some(below)) = (src.row(y - 1), src.row(y), src.row(y + 1))
            else {
                return Err(SlideError::InvalidDimensions { width, height });
            };
            for x in 1..width - 1 {
                let px = |r: &[u8], i: usize| r[i] as f32;
                let gx = px(above, x + 1) + 2.0 * px(row, x + 1) + px(below, x + 1)
                    - px(above, x - 1)
                    - 2.0 * px(row, x - 1)
                    - px(below, x - 1);
                let gy = px(below, x - 1) + 2.0 * px(below, x) + px(below, x + 1)
                    - px(above, x - 1)
                    - 2.0 * px(above, x)
                    - px(above, x + 1);
                let magnitude = (gx.abs() + gy.abs()) * EDGE_SCALE;
                out[y * width + x] = magnitude.round().min(255.0) as u8;
            }
        }
    }
    OwnedImage::new(out, width, height)
}
