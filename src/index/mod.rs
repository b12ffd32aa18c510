//! Overlap indexes over genomic intervals.
//!
//! - [`IntervalSet`](interval_set::IntervalSet): generic per-contig interval store with
//!   a build phase (O(log n) insertion) and a frozen, query-only phase
//! - [`AnnotationIndex`](annotation_index::AnnotationIndex): one detector's calls,
//!   indexed per contig with per-contig failure isolation

pub mod annotation_index;
pub mod interval_set;
