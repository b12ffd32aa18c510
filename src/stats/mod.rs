//! Summary statistics for QC reporting.
//!
//! - [`SpanStats`](spans::SpanStats): count, extremes, mean, spread and quartiles
//!   of a span distribution
//! - [`Histogram`](spans::Histogram): fixed-bucket span histogram with
//!   underflow/overflow counts
//! - [`StatsAggregator`](report::StatsAggregator): builds a [`StatsReport`](report::StatsReport)
//!   from the filtered regions, the catalog and the merge outcome

pub mod report;
pub mod spans;
