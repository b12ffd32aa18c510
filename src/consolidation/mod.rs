//! Joining regions against detector calls and consolidating the result.
//!
//! - [`Intersector`](intersect::Intersector): per-region overlap, coverage and
//!   best-match queries against one [`AnnotationIndex`](crate::index::annotation_index::AnnotationIndex)
//! - [`AnnotationMerger`](merger::AnnotationMerger): applies the decision policy to
//!   both detectors' results and emits the catalog in canonical order
//!
//! Coverage is always measured against the *unpadded* region, even though calls
//! are looked up with the padded interval.

pub mod intersect;
pub mod merger;
