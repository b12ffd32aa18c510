//! Run configuration.
//!
//! Every threshold of the consolidation core is a value of [`PipelineConfig`]
//! rather than a constant, so thresholds can be tuned per reference. The
//! configuration is read from JSON; absent fields take the defaults below.
//!
//! ```json
//! {
//!   "min_span": 50,
//!   "max_span": 50000,
//!   "accepted_contigs": ["chr1", "chr2"],
//!   "slop": 25,
//!   "boundary_tolerance": 5,
//!   "min_coverage": 0.0,
//!   "histogram_edges": [50, 100, 200, 500, 1000, 2000, 5000, 10000, 20000, 50000],
//!   "min_classifier_score": 225,
//!   "reciprocal_fraction": 0.5,
//!   "isolate_contig_failures": false
//! }
//! ```
//!
//! A configuration is only usable after [`PipelineConfig::resolve`] checks it
//! against the reference contig table.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consolidation::merger::MergeConfig;
use crate::core::contig::ContigTable;
use crate::filtering::FilterConfig;

/// Default minimum region span (bp)
pub const DEFAULT_MIN_SPAN: u64 = 50;
/// Default maximum region span (bp)
pub const DEFAULT_MAX_SPAN: u64 = 50_000;
/// Default symmetric padding applied before annotation lookup (bp)
pub const DEFAULT_SLOP: u64 = 25;
/// Default allowed difference between detector boundaries (bp)
pub const DEFAULT_BOUNDARY_TOLERANCE: u64 = 5;
/// Default RepeatMasker score threshold
pub const DEFAULT_MIN_CLASSIFIER_SCORE: u32 = 225;
/// Default reciprocal overlap fraction for overlap-count statistics
pub const DEFAULT_RECIPROCAL_FRACTION: f64 = 0.5;
/// Default span histogram edges: 1-2-5 log scale from 50 bp to 50 kb
pub const DEFAULT_HISTOGRAM_EDGES: [u64; 10] = [
    50, 100, 200, 500, 1_000, 2_000, 5_000, 10_000, 20_000, 50_000,
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid span range: min_span ({min_span}) must be less than max_span ({max_span})")]
    InvalidSpanRange { min_span: u64, max_span: u64 },

    #[error("Accepted contig '{0}' is not in the contig table")]
    UnknownContig(String),

    #[error("No contigs are accepted")]
    EmptyContigSet,

    #[error("{name} must be within [0, 1], got {value}")]
    InvalidFraction { name: &'static str, value: f64 },

    #[error("Invalid histogram edges: {0}")]
    InvalidHistogramEdges(String),

    #[error("Failed to read configuration: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// User-facing configuration, as read from JSON or assembled from CLI flags
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub min_span: u64,
    pub max_span: u64,
    /// `None` accepts the primary chromosomes of the contig table
    pub accepted_contigs: Option<Vec<String>>,
    pub slop: u64,
    pub boundary_tolerance: u64,
    pub min_coverage: f64,
    pub histogram_edges: Vec<u64>,
    pub min_classifier_score: u32,
    pub reciprocal_fraction: f64,
    pub isolate_contig_failures: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_span: DEFAULT_MIN_SPAN,
            max_span: DEFAULT_MAX_SPAN,
            accepted_contigs: None,
            slop: DEFAULT_SLOP,
            boundary_tolerance: DEFAULT_BOUNDARY_TOLERANCE,
            min_coverage: 0.0,
            histogram_edges: DEFAULT_HISTOGRAM_EDGES.to_vec(),
            min_classifier_score: DEFAULT_MIN_CLASSIFIER_SCORE,
            reciprocal_fraction: DEFAULT_RECIPROCAL_FRACTION,
            isolate_contig_failures: false,
        }
    }
}

/// Configuration checked against a contig table and split per component
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub filter: FilterConfig,
    pub merge: MergeConfig,
    pub histogram_edges: Vec<u64>,
    pub min_classifier_score: u32,
    pub isolate_contig_failures: bool,
}

impl PipelineConfig {
    /// Load configuration from a JSON file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file cannot be read or
    /// `ConfigError::Parse` if it is not valid configuration JSON.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Parse` on invalid JSON or unknown fields.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if serialization fails.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate every threshold and resolve the accepted contig set
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` describing the first invalid value.
    pub fn resolve(&self, contigs: &ContigTable) -> Result<ResolvedConfig, ConfigError> {
        let accepted = match &self.accepted_contigs {
            Some(names) => {
                if let Some(unknown) = names.iter().find(|n| !contigs.contains(n)) {
                    return Err(ConfigError::UnknownContig(unknown.clone()));
                }
                names.clone()
            }
            None => contigs.primary_names(),
        };
        let filter = FilterConfig::new(self.min_span, self.max_span, accepted)?;

        check_fraction("min_coverage", self.min_coverage)?;
        check_fraction("reciprocal_fraction", self.reciprocal_fraction)?;
        if self.reciprocal_fraction == 0.0 {
            return Err(ConfigError::InvalidFraction {
                name: "reciprocal_fraction",
                value: self.reciprocal_fraction,
            });
        }
        check_histogram_edges(&self.histogram_edges)?;

        Ok(ResolvedConfig {
            filter,
            merge: MergeConfig {
                slop: self.slop,
                boundary_tolerance: self.boundary_tolerance,
                min_coverage: self.min_coverage,
                reciprocal_fraction: self.reciprocal_fraction,
            },
            histogram_edges: self.histogram_edges.clone(),
            min_classifier_score: self.min_classifier_score,
            isolate_contig_failures: self.isolate_contig_failures,
        })
    }
}

fn check_fraction(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidFraction { name, value })
    }
}

/// Edges must contain at least two values and be strictly increasing
///
/// # Errors
///
/// Returns `ConfigError::InvalidHistogramEdges` otherwise.
pub fn check_histogram_edges(edges: &[u64]) -> Result<(), ConfigError> {
    if edges.len() < 2 {
        return Err(ConfigError::InvalidHistogramEdges(format!(
            "need at least 2 edges, got {}",
            edges.len()
        )));
    }
    if let Some(pair) = edges.windows(2).find(|w| w[0] >= w[1]) {
        return Err(ConfigError::InvalidHistogramEdges(format!(
            "edges must be strictly increasing ({} >= {})",
            pair[0], pair[1]
        )));
    }
    Ok(())
}
