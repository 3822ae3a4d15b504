//! Fail-open orchestration of the slide matching pipeline.
//!
//! Stages run in order: validate both images with the codec, match them
//! with [`TemplateMatcher`], and on a matcher failure ask the
//! [`FallbackMatcher`] with the raw request bytes. Every stage returns a plain
//! `Result`; the substitution of [`SlideOffset::DEFAULT`] for a failure
//! happens in exactly one place, [`SafeMatchCoordinator::resolve_detailed`].
//!
//! Returning a fixed offset instead of an error trades correctness for
//! client robustness. Callers that need to tell a real match from the
//! substitute should inspect [`Resolution::source`].

use std::fmt;
use std::sync::Arc;

use crate::fallback::{FallbackMatcher, SlideDetector};
use crate::image::ImageCodec;
use crate::search::{SlideOffset, TemplateMatcher};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{SlideError, SlideResult};

/// A background and a template, both still encoded.
#[derive(Clone, Copy, Debug)]
pub struct MatchRequest<'a> {
    /// Encoded background image.
    pub background: &'a [u8],
    /// Encoded puzzle-piece image.
    pub template: &'a [u8],
}

impl<'a> MatchRequest<'a> {
    /// Pairs a background with its template.
    pub fn new(background: &'a [u8], template: &'a [u8]) -> Self {
        Self {
            background,
            template,
        }
    }
}

/// Which stage produced an offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchSource {
    /// The primary correlation matcher.
    Template,
    /// The fallback detector.
    Fallback,
    /// No stage succeeded; the policy default was substituted.
    Default,
}

impl fmt::Display for MatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Template => "template",
            Self::Fallback => "fallback",
            Self::Default => "default",
        })
    }
}

/// Offset answered for a request, with its provenance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// The offset to hand to the client.
    pub offset: SlideOffset,
    /// The stage that produced `offset`.
    pub source: MatchSource,
    /// The error that forced the default, when `source` is `Default`.
    pub failure: Option<SlideError>,
}

impl Resolution {
    fn matched(offset: SlideOffset, source: MatchSource) -> Self {
        Self {
            offset,
            source,
            failure: None,
        }
    }

    fn default_offset(failure: Option<SlideError>) -> Self {
        Self {
            offset: SlideOffset::DEFAULT,
            source: MatchSource::Default,
            failure,
        }
    }
}

/// Runs codec, matcher and fallback, and never fails.
#[derive(Clone, Debug, Default)]
pub struct SafeMatchCoordinator {
    codec: ImageCodec,
    matcher: TemplateMatcher,
    fallback: FallbackMatcher,
}

impl SafeMatchCoordinator {
    /// Creates a coordinator with the default codec, matcher and detector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the codec.
    pub fn with_codec(mut self, codec: ImageCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Replaces the primary matcher.
    pub fn with_matcher(mut self, matcher: TemplateMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Replaces the fallback detector.
    pub fn with_detector(mut self, detector: Arc<dyn SlideDetector>) -> Self {
        self.fallback = FallbackMatcher::new(detector);
        self
    }

    /// Resolves a request to an offset. Total: always returns a value.
    pub fn resolve(&self, request: &MatchRequest<'_>) -> SlideOffset {
        self.resolve_detailed(request).offset
    }

    /// Resolves a request and reports which stage produced the offset.
    ///
    /// This is the only place where a pipeline failure is replaced by
    /// [`SlideOffset::DEFAULT`].
    pub fn resolve_detailed(&self, request: &MatchRequest<'_>) -> Resolution {
        let _span = trace_span!("slide_resolve").entered();
        match self.try_resolve(request) {
            Ok((offset, source)) => {
                trace_event!("slide_resolved", x = offset.x, y = offset.y);
                Resolution::matched(offset, source)
            }
            Err(err) => {
                trace_warn!(error = %err, "slide matching failed, substituting default offset");
                Resolution::default_offset(Some(err))
            }
        }
    }

    /// A single full screenshot carries no separable template, so no match
    /// is attempted and the default offset is answered.
    pub fn resolve_full_image(&self) -> Resolution {
        Resolution::default_offset(None)
    }

    fn try_resolve(&self, request: &MatchRequest<'_>) -> SlideResult<(SlideOffset, MatchSource)> {
        // Validation failures skip the fallback entirely.
        let background = self.codec.decode(request.background)?;
        let template = self.codec.decode(request.template)?;

        match self.matcher.match_images(&background, &template) {
            Ok(offset) => Ok((offset, MatchSource::Template)),
            Err(primary) => {
                trace_warn!(error = %primary, "template matcher failed, trying fallback");
                self.fallback
                    .match_bytes(request.background, request.template)
                    .map(|offset| (offset, MatchSource::Fallback))
                    .ok_or(primary)
            }
        }
    }
}
