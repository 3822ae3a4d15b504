//! Low-level building blocks for custom matching pipelines.
//!
//! These expose template plans, kernels and the edge filter for callers that
//! want to score luma buffers directly instead of going through
//! [`TemplateMatcher`](crate::TemplateMatcher) or the coordinator.

pub use crate::candidate::peak::{BestPeak, Peak};
pub use crate::image::edges::sobel_edges;
pub use crate::kernel::scalar::{ZnccMaskedScalar, ZnccScalar};
pub use crate::kernel::{scan_best, Kernel, ScanParams, DEFAULT_MAX_WORK};
pub use crate::template::{MaskedTemplatePlan, TemplatePlan};
