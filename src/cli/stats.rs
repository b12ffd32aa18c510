use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::catalog::regions::read_region_table_file;
use crate::catalog::store::{catalog_md5, parse_catalog};
use crate::cli::OutputFormat;
use crate::config::PipelineConfig;
use crate::stats::report::{StatsAggregator, StatsReport};
use crate::stats::spans::{Histogram, SpanStats};

#[derive(Args)]
pub struct StatsArgs {
    /// Catalog TSV written by `consolidate`
    #[arg(long)]
    pub catalog: PathBuf,

    /// Filtered region table written by `filter`, for rejection counts and kept spans
    #[arg(long)]
    pub filtered: Option<PathBuf>,

    /// JSON configuration file (only `histogram_edges` is used)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Span histogram bucket edges
    #[arg(long, value_delimiter = ',')]
    pub histogram_edges: Option<Vec<u64>>,
}

/// Execute stats subcommand
///
/// # Errors
///
/// Returns an error if an input cannot be read or parsed or the histogram
/// edges are invalid.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: StatsArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => PipelineConfig::load_from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let edges = args
        .histogram_edges
        .clone()
        .unwrap_or(config.histogram_edges);
    let aggregator = StatsAggregator::new(edges).context("Invalid histogram edges")?;

    let content = std::fs::read_to_string(&args.catalog)
        .with_context(|| format!("Failed to read catalog {}", args.catalog.display()))?;
    let catalog = parse_catalog(&content)
        .with_context(|| format!("Failed to parse catalog {}", args.catalog.display()))?;

    let regions = match &args.filtered {
        Some(path) => Some(
            read_region_table_file(path)
                .with_context(|| format!("Failed to read filtered regions {}", path.display()))?,
        ),
        None => None,
    };

    if verbose {
        eprintln!("Read {} catalog records", catalog.len());
    }

    let mut report = aggregator.report(regions.as_deref(), &catalog, None);
    report.catalog_md5 = Some(catalog_md5(content.as_bytes()));

    print_report(&report, format)
}

/// Print a stats report in the requested format
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn print_report(report: &StatsReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => print_text_report(report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Tsv => print_tsv_report(report),
    }
    Ok(())
}

fn print_text_report(report: &StatsReport) {
    let catalog = &report.catalog;

    if let Some(filter) = &report.filter {
        println!("Regions");
        println!(
            "   Input: {}   Kept: {}   Removed: {} ({:.2}%)",
            filter.total,
            filter.kept,
            filter.removed,
            filter.removed_pct()
        );
        for (reason, count) in &filter.by_reason {
            println!("   {reason}: {count}");
        }
        println!();
    }

    println!("Catalog");
    println!("   Records: {}", catalog.records);
    if let Some(dropped) = catalog.dropped() {
        println!("   Dropped: {dropped}");
    }
    for (reason, count) in &catalog.drops {
        println!("   {reason}: {count}");
    }
    if let Some(fraction) = catalog.unannotated_fraction {
        println!("   Unannotated: {:.2}% of kept regions", fraction * 100.0);
    }
    println!(
        "   Conflicts: {} ({:.2}%)",
        catalog.conflicts,
        catalog.conflict_fraction * 100.0
    );
    println!(
        "   Partial detection: {} ({:.2}%)",
        catalog.partial,
        catalog.partial_fraction * 100.0
    );
    println!(
        "   Sources: {} both, {} period finder only, {} classifier only",
        catalog.sources.both, catalog.sources.period_finder_only, catalog.sources.classifier_only
    );
    println!(
        "   Coverage: mean {:.3}, {} fully covered",
        catalog.mean_coverage, catalog.fully_covered
    );
    for (source, distribution) in &catalog.overlap_counts {
        println!(
            "   {source}: {} regions with overlapping calls",
            distribution.regions_hit()
        );
    }
    if !catalog.classes.is_empty() {
        println!("   Classes:");
        for (class, count) in &catalog.classes {
            println!("      {class}: {count}");
        }
    }

    for (label, stats) in [
        ("Input spans", &report.input_spans),
        ("Kept spans", &report.kept_spans),
        ("Catalog spans", &report.catalog_spans),
    ] {
        if let Some(stats) = stats {
            println!();
            print_span_stats(label, stats);
        }
    }

    println!();
    print_histogram("Catalog span histogram", &report.catalog_histogram);

    if let Some(md5) = &report.catalog_md5 {
        println!();
        println!("Catalog MD5: {md5}");
    }
}

fn print_span_stats(label: &str, stats: &SpanStats) {
    println!("{label}");
    println!("   Count: {}   Total: {} bp", stats.count, stats.total);
    println!(
        "   Min: {}   Q25: {:.1}   Median: {:.1}   Q75: {:.1}   Max: {}",
        stats.min, stats.q25, stats.median, stats.q75, stats.max
    );
    println!("   Mean: {:.1}   Std: {:.1}", stats.mean, stats.std);
}

fn print_histogram(label: &str, histogram: &Histogram) {
    println!("{label}");
    if histogram.underflow() > 0 {
        println!("   < {}: {}", histogram.edges()[0], histogram.underflow());
    }
    for (low, high, count) in histogram.buckets() {
        println!("   [{low}, {high}): {count}");
    }
    if histogram.overflow() > 0 {
        let last = histogram.edges()[histogram.edges().len() - 1];
        println!("   > {last}: {}", histogram.overflow());
    }
}

fn print_tsv_report(report: &StatsReport) {
    let catalog = &report.catalog;
    println!("metric\tvalue");
    if let Some(filter) = &report.filter {
        println!("regions_input\t{}", filter.total);
        println!("regions_kept\t{}", filter.kept);
        for (reason, count) in &filter.by_reason {
            println!("rejected_{reason}\t{count}");
        }
    }
    println!("catalog_records\t{}", catalog.records);
    for (reason, count) in &catalog.drops {
        println!("dropped_{reason}\t{count}");
    }
    println!("conflicts\t{}", catalog.conflicts);
    println!("conflict_fraction\t{:.6}", catalog.conflict_fraction);
    println!("partial\t{}", catalog.partial);
    println!("partial_fraction\t{:.6}", catalog.partial_fraction);
    println!("mean_coverage\t{:.6}", catalog.mean_coverage);
    for (class, count) in &catalog.classes {
        println!("class_{class}\t{count}");
    }
    for (low, high, count) in report.catalog_histogram.buckets() {
        println!("span_{low}_{high}\t{count}");
    }
    println!("span_underflow\t{}", report.catalog_histogram.underflow());
    println!("span_overflow\t{}", report.catalog_histogram.overflow());
    if let Some(md5) = &report.catalog_md5 {
        println!("catalog_md5\t{md5}");
    }
}
