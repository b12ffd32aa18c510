use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Args};

use crate::catalog::regions::read_region_table_file;
use crate::catalog::store::write_catalog_file;
use crate::cli::{stats::print_report, ConfigArgs, OutputFormat};
use crate::core::region::Region;
use crate::parsing::bed::read_bed_file;
use crate::parsing::contigs::read_contig_table;
use crate::parsing::repeatmasker::read_repeatmasker_file;
use crate::parsing::trf::read_trf_file;
use crate::pipeline;
use crate::stats::report::StatsAggregator;

#[derive(Args)]
#[command(group(ArgGroup::new("candidates").required(true).args(["regions", "filtered"])))]
pub struct ConsolidateArgs {
    /// Contig table: FASTA index (.fai) or two-column genome file
    #[arg(long)]
    pub contigs: PathBuf,

    /// Raw candidate regions (BED, optionally gzipped); filtered before merging
    #[arg(long)]
    pub regions: Option<PathBuf>,

    /// Filtered region table written by `filter`
    #[arg(long)]
    pub filtered: Option<PathBuf>,

    /// Period-finder calls: reformatted TRF TSV or raw `trf -ngs` output
    #[arg(long)]
    pub period_finder: PathBuf,

    /// Classifier calls: RepeatMasker .out report or BED-like TSV
    #[arg(long)]
    pub classifier: PathBuf,

    /// Catalog TSV to write
    #[arg(short, long)]
    pub output: PathBuf,

    /// Also write the stats report as JSON
    #[arg(long)]
    pub stats_output: Option<PathBuf>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Execute consolidate subcommand
///
/// # Errors
///
/// Returns an error if an input cannot be read or parsed, the configuration is
/// invalid, an annotation index fails in strict mode, the merge fails, or an
/// output cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ConsolidateArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let contigs = read_contig_table(&args.contigs)
        .with_context(|| format!("Failed to read contig table {}", args.contigs.display()))?;
    let config = args
        .config
        .load()?
        .resolve(&contigs)
        .context("Invalid configuration")?;

    let regions: Vec<Region> = match (&args.regions, &args.filtered) {
        (Some(path), _) => {
            let intervals = read_bed_file(path)
                .with_context(|| format!("Failed to read regions {}", path.display()))?;
            let outcome = pipeline::filter_regions(&contigs, &config, intervals)?;
            outcome.kept.into_iter().chain(outcome.rejected).collect()
        }
        (None, Some(path)) => read_region_table_file(path)
            .with_context(|| format!("Failed to read filtered regions {}", path.display()))?,
        (None, None) => anyhow::bail!("One of --regions or --filtered is required"),
    };
    let kept: Vec<Region> = regions.iter().filter(|r| r.is_kept()).cloned().collect();

    let period_finder = read_trf_file(&args.period_finder).with_context(|| {
        format!(
            "Failed to read period-finder calls {}",
            args.period_finder.display()
        )
    })?;
    let classifier = read_repeatmasker_file(&args.classifier, config.min_classifier_score)
        .with_context(|| {
            format!(
                "Failed to read classifier calls {}",
                args.classifier.display()
            )
        })?;

    if verbose {
        eprintln!(
            "Consolidating {} kept regions with {} period-finder and {} classifier calls",
            kept.len(),
            period_finder.len(),
            classifier.len()
        );
    }

    let merged = pipeline::consolidate(&contigs, &config, &kept, period_finder, classifier)?;

    let md5 = write_catalog_file(&args.output, &merged.catalog)
        .with_context(|| format!("Failed to write catalog {}", args.output.display()))?;

    let aggregator = StatsAggregator::new(config.histogram_edges.clone())?;
    let mut report = aggregator.report(Some(&regions), &merged.catalog, Some(&merged));
    report.catalog_md5 = Some(md5);

    if let Some(path) = &args.stats_output {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("Failed to write stats report {}", path.display()))?;
    }

    print_report(&report, format)
}
