//! Template storage and planning utilities.

use crate::image::{DecodedImage, ImageView, OwnedImage};
use crate::util::SlideResult;

mod plan;

pub use plan::{MaskedTemplatePlan, TemplatePlan};

/// Grayscale template image, optionally restricted by a 0/1 mask.
#[derive(Clone, Debug)]
pub struct Template {
    img: OwnedImage,
    mask: Option<Vec<u8>>,
}

impl Template {
    /// Creates a template from a contiguous grayscale buffer.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> SlideResult<Self> {
        let img = OwnedImage::new(data, width, height)?;
        Ok(Self { img, mask: None })
    }

    /// Converts a decoded image to a luma template.
    pub fn from_decoded(img: &DecodedImage) -> SlideResult<Self> {
        Ok(Self {
            img: img.to_luma()?,
            mask: None,
        })
    }

    /// Wraps an owned luma buffer.
    pub fn from_luma(img: OwnedImage) -> Self {
        Self { img, mask: None }
    }

    /// Attaches a row-major 0/1 mask of the same size as the template.
    pub fn with_mask(mut self, mask: Vec<u8>) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Returns a borrowed view of the template data.
    pub fn view(&self) -> ImageView<'_, u8> {
        self.img.view()
    }

    /// Returns the template width in pixels.
    pub fn width(&self) -> usize {
        self.img.width()
    }

    /// Returns the template height in pixels.
    pub fn height(&self) -> usize {
        self.img.height()
    }

    /// Returns the mask, if one was attached.
    pub fn mask(&self) -> Option<&[u8]> {
        self.mask.as_deref()
    }

    /// Precomputes the unmasked ZNCC plan. Any attached mask is ignored.
    pub fn plan(&self) -> SlideResult<TemplatePlan> {
        TemplatePlan::from_view(self.view())
    }

    /// Precomputes the masked ZNCC plan; without a mask every pixel counts.
    pub fn masked_plan(&self) -> SlideResult<MaskedTemplatePlan> {
        match &self.mask {
            Some(mask) => MaskedTemplatePlan::from_view(self.view(), mask),
            None => {
                let full = vec![1u8; self.width() * self.height()];
                MaskedTemplatePlan::from_view(self.view(), &full)
            }
        }
    }
}
