//! Text recognition pass-through.
//!
//! Character classification itself is an opaque capability behind
//! [`TextRecognizer`]; this module only adapts its failures into
//! [`SlideError::ClassificationFailed`] so callers see a single error kind.

use std::fmt;
use std::sync::Arc;

use crate::trace::trace_event;
use crate::util::{SlideError, SlideResult};

/// Opaque image-to-text classifier.
///
/// Implementations are shared read-only across concurrent requests.
pub trait TextRecognizer: Send + Sync {
    /// Classifies the text in an encoded image.
    fn classify(&self, image: &[u8]) -> SlideResult<String>;
}

/// Recognizer used when no classification model is loaded.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnconfiguredRecognizer;

impl TextRecognizer for UnconfiguredRecognizer {
    fn classify(&self, _image: &[u8]) -> SlideResult<String> {
        Err(SlideError::ClassificationFailed {
            reason: "no text recognition model is loaded".to_string(),
        })
    }
}

/// Forwards image bytes to a [`TextRecognizer`].
#[derive(Clone)]
pub struct TextRecognitionAdapter {
    recognizer: Arc<dyn TextRecognizer>,
}

impl Default for TextRecognitionAdapter {
    fn default() -> Self {
        Self::new(Arc::new(UnconfiguredRecognizer))
    }
}

impl fmt::Debug for TextRecognitionAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextRecognitionAdapter")
            .finish_non_exhaustive()
    }
}

impl TextRecognitionAdapter {
    /// Wraps a shared recognizer.
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self { recognizer }
    }

    /// Returns the recognized text, or `ClassificationFailed` on any failure.
    pub fn recognize(&self, image: &[u8]) -> SlideResult<String> {
        match self.recognizer.classify(image) {
            Ok(text) => {
                trace_event!("text_recognized", chars = text.chars().count());
                Ok(text)
            }
            Err(err @ SlideError::ClassificationFailed { .. }) => Err(err),
            Err(err) => Err(SlideError::ClassificationFailed {
                reason: err.to_string(),
            }),
        }
    }
}
