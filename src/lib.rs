//! # tr-catalog
//!
//! A library for building an annotated catalog of tandem-repeat regions.
//!
//! Candidate regions are filtered by span and contig, padded, and joined
//! against the calls of two independent detectors: a period finder (TRF) and a
//! repeat classifier (RepeatMasker). Each kept region receives one consolidated
//! record that says which detectors saw it, how much of it they cover, and
//! whether their boundaries disagree.
//!
//! ## Features
//!
//! - **Interval algebra**: per-contig overlap indexes, span unions, coverage
//!   measured against the unpadded region
//! - **Deterministic output**: canonical order (contig declaration order, start,
//!   end) regardless of worker scheduling
//! - **Conflict detection**: flags regions where the detectors' best matches
//!   disagree beyond a tolerance, and regions seen by only one detector
//! - **QC statistics**: span distributions, histograms, drop and rejection counts
//!
//! ## Example
//!
//! ```rust,no_run
//! use tr_catalog::config::PipelineConfig;
//! use tr_catalog::parsing::{bed, contigs, repeatmasker, trf};
//! use tr_catalog::pipeline;
//! use std::path::Path;
//!
//! let table = contigs::read_contig_table(Path::new("GRCh38.fa.fai")).unwrap();
//! let config = PipelineConfig::default().resolve(&table).unwrap();
//!
//! let candidates = bed::read_bed_file(Path::new("candidates.bed.gz")).unwrap();
//! let filtered = pipeline::filter_regions(&table, &config, candidates).unwrap();
//!
//! let pf = trf::read_trf_file(Path::new("trf.tsv")).unwrap();
//! let cls = repeatmasker::read_repeatmasker_file(Path::new("rm.out"), config.min_classifier_score).unwrap();
//! let merged = pipeline::consolidate(&table, &config, &filtered.kept, pf, cls).unwrap();
//!
//! for record in &merged.catalog {
//!     println!("{} coverage={:.2} conflict={}", record.region_id, record.coverage_fraction, record.conflict_flag);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Intervals, contig tables, regions and annotation records
//! - [`index`]: Per-contig interval indexes
//! - [`filtering`]: Region eligibility rules
//! - [`consolidation`]: Intersection and the annotation merger
//! - [`stats`]: Span statistics, histograms and the stats report
//! - [`parsing`]: Parsers for contig tables, BED and detector output
//! - [`catalog`]: Catalog and filtered-table writers and readers
//! - [`pipeline`]: Stage wiring with failure handling
//! - [`cli`]: Command-line interface implementation

pub mod catalog;
pub mod cli;
pub mod config;
pub mod consolidation;
pub mod core;
pub mod filtering;
pub mod index;
pub mod parsing;
pub mod pipeline;
pub mod stats;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{PipelineConfig, ResolvedConfig};
pub use consolidation::merger::{AnnotationMerger, ConsolidatedAnnotation, MergeConfig};
pub use core::contig::{Contig, ContigTable};
pub use core::interval::GenomicInterval;
pub use core::region::Region;
pub use core::types::*;
pub use filtering::RegionFilter;
pub use index::annotation_index::AnnotationIndex;
