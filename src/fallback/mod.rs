//! Secondary slide matching used when the primary matcher has no result.
//!
//! [`SlideDetector`] is the seam for an opaque detection capability working
//! on raw encoded bytes. [`FallbackMatcher`] wraps one and guarantees that
//! detector failures never leave it: every error becomes `None`.

use std::sync::Arc;

use crate::search::SlideOffset;
use crate::trace::trace_warn;
use crate::util::SlideResult;

mod edge;

pub use edge::{EdgeDetectorConfig, EdgeSlideDetector};

/// Opaque slide detection capability.
///
/// Implementations are shared read-only across concurrent requests.
/// Offsets follow the same convention as the primary matcher: the
/// template's top-left corner inside the background.
pub trait SlideDetector: Send + Sync {
    /// Locates `template` inside `background`, both given as encoded images.
    fn detect(&self, background: &[u8], template: &[u8]) -> SlideResult<SlideOffset>;
}

/// Fail-safe wrapper around a [`SlideDetector`].
#[derive(Clone)]
pub struct FallbackMatcher {
    detector: Arc<dyn SlideDetector>,
}

impl Default for FallbackMatcher {
    fn default() -> Self {
        Self::new(Arc::new(EdgeSlideDetector::default()))
    }
}

impl std::fmt::Debug for FallbackMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackMatcher").finish_non_exhaustive()
    }
}

impl FallbackMatcher {
    /// Wraps a shared detector.
    pub fn new(detector: Arc<dyn SlideDetector>) -> Self {
        Self { detector }
    }

    /// Runs the detector; any failure is logged and reported as `None`.
    pub fn match_bytes(&self, background: &[u8], template: &[u8]) -> Option<SlideOffset> {
        match self.detector.detect(background, template) {
            Ok(offset) => Some(offset),
            Err(_err) => {
                trace_warn!(error = %_err, "fallback slide detector failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FallbackMatcher, SlideDetector};
    use crate::search::SlideOffset;
    use crate::util::{SlideError, SlideResult};
    use std::sync::Arc;

    struct Fixed(SlideResult<SlideOffset>);

    impl SlideDetector for Fixed {
        fn detect(&self, _background: &[u8], _template: &[u8]) -> SlideResult<SlideOffset> {
            self.0.clone()
        }
    }

    #[test]
    fn detector_result_is_passed_through() {
        let fallback = FallbackMatcher::new(Arc::new(Fixed(Ok(SlideOffset::new(4, 2)))));
        assert_eq!(fallback.match_bytes(b"bg", b"tpl"), Some(SlideOffset::new(4, 2)));
    }

    #[test]
    fn detector_error_becomes_none() {
        let fallback = FallbackMatcher::new(Arc::new(Fixed(Err(SlideError::DetectorFailed {
            reason: "model exploded".to_string(),
        }))));
        assert_eq!(fallback.match_bytes(b"bg", b"tpl"), None);
    }

    #[test]
    fn default_detector_rejects_garbage() {
        assert_eq!(FallbackMatcher::default().match_bytes(b"bg", b"tpl"), None);
    }
}
