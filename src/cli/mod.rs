//! Command-line interface for tr-catalog.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **filter**: Apply span and contig rules to candidate regions
//! - **consolidate**: Join kept regions with period-finder and classifier calls
//!   and write the catalog
//! - **stats**: Summarize a catalog (and optionally its filtered region table)
//!
//! ## Usage
//!
//! ```text
//! # Filter candidate regions against a FASTA index
//! tr-catalog filter --contigs GRCh38.fa.fai --regions candidates.bed.gz \
//!     --output filtered.tsv --kept-bed kept.bed
//!
//! # Consolidate detector output into the catalog
//! tr-catalog consolidate --contigs GRCh38.fa.fai --filtered filtered.tsv \
//!     --period-finder trf.tsv --classifier rm.out --output catalog.tsv
//!
//! # JSON stats for scripting
//! tr-catalog --format json stats --catalog catalog.tsv --filtered filtered.tsv
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::config::PipelineConfig;

pub mod consolidate;
pub mod filter;
pub mod stats;

#[derive(Parser)]
#[command(name = "tr-catalog")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Build an annotated catalog of tandem-repeat regions")]
#[command(
    long_about = "tr-catalog consolidates candidate tandem-repeat regions with the calls of two independent detectors.\n\nIt provides:\n- Span and contig filtering of candidate regions\n- Per-region merging of period-finder (TRF) and classifier (RepeatMasker) calls\n- Boundary conflict and partial detection flags\n- Summary statistics for QC"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Worker threads (0 = one per core)
    #[arg(short, long, global = true, default_value = "0")]
    pub threads: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Filter candidate regions by span and contig
    Filter(filter::FilterArgs),

    /// Consolidate detector calls into the catalog
    Consolidate(consolidate::ConsolidateArgs),

    /// Summarize a catalog
    Stats(stats::StatsArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Configuration file plus per-flag overrides
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// JSON configuration file; flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Minimum region span in bp
    #[arg(long)]
    pub min_span: Option<u64>,

    /// Maximum region span in bp
    #[arg(long)]
    pub max_span: Option<u64>,

    /// Accepted contigs (default: primary chromosomes of the contig table)
    #[arg(long, value_delimiter = ',')]
    pub accepted_contigs: Option<Vec<String>>,

    /// Padding applied to regions before annotation lookup, in bp
    #[arg(long)]
    pub slop: Option<u64>,

    /// Maximum difference between detector boundaries before flagging a conflict, in bp
    #[arg(long)]
    pub boundary_tolerance: Option<u64>,

    /// Drop catalog regions with coverage below this fraction
    #[arg(long)]
    pub min_coverage: Option<f64>,

    /// Discard classifier calls scoring below this
    #[arg(long)]
    pub min_classifier_score: Option<u32>,

    /// Span histogram bucket edges
    #[arg(long, value_delimiter = ',')]
    pub histogram_edges: Option<Vec<u64>>,

    /// Drop only the regions of contigs whose calls are malformed instead of aborting
    #[arg(long)]
    pub isolate_contig_failures: bool,
}

impl ConfigArgs {
    /// Load the configuration file, if any, and apply flag overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or parsed.
    pub fn load(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load_from_file(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?,
            None => PipelineConfig::default(),
        };

        if let Some(v) = self.min_span {
            config.min_span = v;
        }
        if let Some(v) = self.max_span {
            config.max_span = v;
        }
        if let Some(v) = &self.accepted_contigs {
            config.accepted_contigs = Some(v.clone());
        }
        if let Some(v) = self.slop {
            config.slop = v;
        }
        if let Some(v) = self.boundary_tolerance {
            config.boundary_tolerance = v;
        }
        if let Some(v) = self.min_coverage {
            config.min_coverage = v;
        }
        if let Some(v) = self.min_classifier_score {
            config.min_classifier_score = v;
        }
        if let Some(v) = &self.histogram_edges {
            config.histogram_edges = v.clone();
        }
        if self.isolate_contig_failures {
            config.isolate_contig_failures = true;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"min_span": 10, "slop": 5}"#).unwrap();

        let args = ConfigArgs {
            config: Some(path),
            slop: Some(0),
            accepted_contigs: Some(vec!["chr1".to_string()]),
            ..ConfigArgs::default()
        };
        let config = args.load().unwrap();
        assert_eq!(config.min_span, 10);
        assert_eq!(config.slop, 0);
        assert_eq!(config.accepted_contigs, Some(vec!["chr1".to_string()]));
        assert_eq!(config.max_span, crate::config::DEFAULT_MAX_SPAN);
    }
}
