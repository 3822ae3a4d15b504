use std::sync::Arc;

use slidematch::{SafeMatchCoordinator, SlideDetector, TextRecognitionAdapter, TextRecognizer};

/// Shared application state, built once at startup.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    /// Slide matching pipeline.
    pub coordinator: SafeMatchCoordinator,
    /// Text captcha recognizer.
    pub recognizer: TextRecognitionAdapter,
}

impl AppState {
    /// State with the default matcher, edge fallback and no OCR model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Plugs in a text recognition implementation.
    pub fn with_recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> Self {
        self.recognizer = TextRecognitionAdapter::new(recognizer);
        self
    }

    /// Replaces the fallback slide detector.
    pub fn with_detector(mut self, detector: Arc<dyn SlideDetector>) -> Self {
        self.coordinator = self.coordinator.with_detector(detector);
        self
    }
}
