//! Candidate selection over scored placements.

pub(crate) mod peak;
