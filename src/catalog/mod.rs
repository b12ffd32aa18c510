//! Tabular outputs of the pipeline and their readers.
//!
//! - [`store`]: the consolidated catalog TSV, one row per kept, annotated region
//!   in canonical order, with the source summary serialized as compact JSON
//! - [`regions`]: the filtered region table (one row per input region, with
//!   status and rejection reason) and the kept-region BED
//!
//! Both tables can be read back, so `stats` can run on files written by an
//! earlier `filter` / `consolidate` run.
//!
//! ## Catalog columns
//!
//! ```text
//! #contig  start  end  region_id  source_summary  coverage_fraction  conflict_flag  partial_detection
//! ```

pub mod regions;
pub mod store;
