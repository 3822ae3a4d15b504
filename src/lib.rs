//! slidematch locates the puzzle piece of a slide captcha inside its
//! background image.
//!
//! The primary matcher scores every placement of the piece with zero-mean
//! normalized cross-correlation; an edge-domain detector backs it up, and
//! [`SafeMatchCoordinator`] turns any failure into a fixed default offset so
//! callers always receive an answer. A thin [`TextRecognitionAdapter`]
//! forwards text captchas to a pluggable classifier.
//!
//! Optional features: `rayon` scans rows in parallel, `tracing` emits spans
//! and events for every pipeline stage.

mod candidate;
pub mod coordinator;
pub mod fallback;
pub mod image;
pub mod kernel;
pub mod lowlevel;
pub mod recognize;
pub mod search;
pub mod template;
mod trace;
pub mod util;

pub use candidate::peak::Peak;
pub use coordinator::{MatchRequest, MatchSource, Resolution, SafeMatchCoordinator};
pub use fallback::{EdgeDetectorConfig, EdgeSlideDetector, FallbackMatcher, SlideDetector};
pub use image::{
    DecodedImage, ImageCodec, ImageView, OwnedImage, ValidationOutcome, MAX_DIMENSION,
    MIN_DIMENSION,
};
pub use kernel::{Kernel, ScanParams};
pub use recognize::{TextRecognitionAdapter, TextRecognizer, UnconfiguredRecognizer};
pub use search::{MatchConfig, SlideOffset, TemplateMatcher};
pub use template::Template;
pub use util::{SlideError, SlideResult};
