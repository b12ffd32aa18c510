use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::catalog::regions::{write_kept_bed, write_region_table};
use crate::cli::{ConfigArgs, OutputFormat};
use crate::core::region::Region;
use crate::filtering::FilterSummary;
use crate::parsing::bed::read_bed_file;
use crate::parsing::contigs::read_contig_table;
use crate::pipeline;

#[derive(Args)]
pub struct FilterArgs {
    /// Contig table: FASTA index (.fai) or two-column genome file
    #[arg(long)]
    pub contigs: PathBuf,

    /// Candidate regions (BED, optionally gzipped)
    #[arg(long)]
    pub regions: PathBuf,

    /// Filtered region table to write (one row per input region)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Also write the kept regions as BED
    #[arg(long)]
    pub kept_bed: Option<PathBuf>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Execute filter subcommand
///
/// # Errors
///
/// Returns an error if an input cannot be read, the configuration is invalid,
/// a region is malformed, or an output cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: FilterArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let contigs = read_contig_table(&args.contigs)
        .with_context(|| format!("Failed to read contig table {}", args.contigs.display()))?;
    let config = args
        .config
        .load()?
        .resolve(&contigs)
        .context("Invalid configuration")?;

    let intervals = read_bed_file(&args.regions)
        .with_context(|| format!("Failed to read regions {}", args.regions.display()))?;
    if verbose {
        eprintln!(
            "Read {} candidate regions and {} contigs",
            intervals.len(),
            contigs.len()
        );
    }

    let outcome = pipeline::filter_regions(&contigs, &config, intervals)?;

    let mut rows: Vec<&Region> = outcome.kept.iter().chain(&outcome.rejected).collect();
    rows.sort_by(|a, b| contigs.compare(&a.interval, &b.interval));

    let mut writer = BufWriter::new(
        File::create(&args.output)
            .with_context(|| format!("Failed to create {}", args.output.display()))?,
    );
    write_region_table(&mut writer, rows.iter().copied())?;
    writer.flush()?;

    if let Some(path) = &args.kept_bed {
        let mut writer = BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        );
        write_kept_bed(&mut writer, rows.iter().copied())?;
        writer.flush()?;
    }

    match format {
        OutputFormat::Text => print_text_summary(&outcome.summary),
        OutputFormat::Json => print_json_summary(&outcome.summary)?,
        OutputFormat::Tsv => print_tsv_summary(&outcome.summary),
    }

    Ok(())
}

fn print_text_summary(summary: &FilterSummary) {
    println!(
        "Filtered {} regions: {} kept, {} removed ({:.2}%)",
        summary.total,
        summary.kept,
        summary.removed,
        summary.removed_pct()
    );
    for (reason, count) in &summary.by_reason {
        println!("   {reason}: {count}");
    }
    println!(
        "Span: {} bp total, {} bp kept, {} bp removed ({:.2}%)",
        summary.span_total,
        summary.span_kept,
        summary.span_removed,
        summary.span_removed_pct()
    );
}

fn print_json_summary(summary: &FilterSummary) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "total": summary.total,
        "kept": summary.kept,
        "removed": summary.removed,
        "removed_pct": summary.removed_pct(),
        "by_reason": summary.by_reason,
        "span": {
            "total": summary.span_total,
            "kept": summary.span_kept,
            "removed": summary.span_removed,
            "removed_pct": summary.span_removed_pct(),
        },
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_summary(summary: &FilterSummary) {
    println!("metric\tvalue");
    println!("total\t{}", summary.total);
    println!("kept\t{}", summary.kept);
    println!("removed\t{}", summary.removed);
    for (reason, count) in &summary.by_reason {
        println!("{reason}\t{count}");
    }
    println!("span_total\t{}", summary.span_total);
    println!("span_kept\t{}", summary.span_kept);
    println!("span_removed\t{}", summary.span_removed);
}
