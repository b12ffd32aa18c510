//! Core data types for tandem-repeat region consolidation.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`GenomicInterval`](interval::GenomicInterval): half-open, 0-based coordinates
//! - [`ContigTable`](contig::ContigTable): contig lengths in reference declaration order
//! - [`Region`](region::Region): a candidate region with reported and padded coordinates
//! - [`AnnotationRecord`](annotation::AnnotationRecord): one detector call, tagged by source
//! - [`RegionId`], [`AnnotationId`], [`AnnotationSource`], [`RejectionReason`], [`DropReason`]
//!
//! ## Ordering
//!
//! Intervals are ordered by contig *declaration order* (the order of the reference
//! index), then start, then end. Contig names are never compared lexically, so
//! `chr10` does not sort before `chr2`.
//!
//! [`RegionId`]: types::RegionId
//! [`AnnotationId`]: types::AnnotationId
//! [`AnnotationSource`]: types::AnnotationSource
//! [`RejectionReason`]: types::RejectionReason
//! [`DropReason`]: types::DropReason

pub mod annotation;
pub mod contig;
pub mod interval;
pub mod region;
pub mod types;
