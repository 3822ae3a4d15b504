//! Best-peak tracking with row-major tie-breaking.

use std::cmp::Ordering;

/// Scored placement of the template's top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    /// X coordinate (column) of the placement.
    pub x: usize,
    /// Y coordinate (row) of the placement.
    pub y: usize,
    /// ZNCC score at the placement, in `[-1, 1]`.
    pub score: f64,
}

/// Orders `a` before `b` when it is the better peak.
///
/// Higher scores win; equal scores fall back to row-major scan order so the
/// first placement encountered top-to-bottom, left-to-right is kept.
pub(crate) fn peak_cmp(a: &Peak, b: &Peak) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.y.cmp(&b.y))
        .then_with(|| a.x.cmp(&b.x))
}

/// Keeps the single best peak seen so far.
#[derive(Debug, Default)]
pub struct BestPeak {
    best: Option<Peak>,
}

impl BestPeak {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers a candidate; it replaces the current best only if strictly better.
    pub fn push(&mut self, peak: Peak) {
        match &self.best {
            Some(best) if peak_cmp(&peak, best) != Ordering::Less => {}
            _ => self.best = Some(peak),
        }
    }

    /// Merges another tracker into this one.
    pub fn merge(mut self, other: BestPeak) -> Self {
        if let Some(peak) = other.best {
            self.push(peak);
        }
        self
    }

    /// Returns the best peak, if any candidate was offered.
    pub fn into_inner(self) -> Option<Peak> {
        self.best
    }
}
