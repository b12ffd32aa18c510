//! Library-level tests of the full filter, index and merge pipeline.

use tr_catalog::catalog::store::{catalog_to_string, parse_catalog};
use tr_catalog::config::PipelineConfig;
use tr_catalog::core::types::DropReason;
use tr_catalog::parsing::repeatmasker::parse_tsv_text;
use tr_catalog::parsing::trf::parse_trf_text;
use tr_catalog::pipeline;
use tr_catalog::stats::report::StatsAggregator;
use tr_catalog::{Contig, ContigTable, GenomicInterval};

fn contigs() -> ContigTable {
    ContigTable::new(vec![
        Contig::new("chr1", 10_000_000),
        Contig::new("chr2", 10_000_000),
        Contig::new("chrUn_KI270742v1", 186_739),
    ])
    .unwrap()
}

/// Candidate regions every 1 kb, alternating contigs, in shuffled order
fn candidates() -> Vec<GenomicInterval> {
    let mut intervals: Vec<GenomicInterval> = (0..400u64)
        .map(|i| {
            let contig = if i % 2 == 0 { "chr1" } else { "chr2" };
            let start = 1_000 + i * 1_000;
            GenomicInterval::new(contig, start, start + 60 + (i % 7) * 40)
        })
        .collect();
    intervals.push(GenomicInterval::new("chrUn_KI270742v1", 100, 400));
    intervals.reverse();
    intervals
}

fn trf_text() -> String {
    let mut text = String::new();
    for i in (0..400u64).step_by(3) {
        let contig = if i % 2 == 0 { "chr1" } else { "chr2" };
        let start = 1_000 + i * 1_000;
        text.push_str(&format!(
            "{contig}\t{start}\t{}\t3.0\t20.0\t120\t1.5\tCAG\n",
            start + 60
        ));
    }
    text
}

fn rm_text() -> String {
    let mut text = String::new();
    for i in (0..400u64).step_by(2) {
        let contig = if i % 2 == 0 { "chr1" } else { "chr2" };
        let start = 1_000 + i * 1_000 + (i % 5) * 3;
        text.push_str(&format!(
            "{contig}\t{start}\t{}\t(CAG)n\t4.2\t{}\n",
            start + 60,
            200 + i
        ));
    }
    text
}

fn run() -> tr_catalog::consolidation::merger::MergeOutcome {
    let contigs = contigs();
    let config = PipelineConfig::default().resolve(&contigs).unwrap();
    let filtered = pipeline::filter_regions(&contigs, &config, candidates()).unwrap();
    let period_finder = parse_trf_text(&trf_text(), "trf.tsv").unwrap();
    let classifier =
        parse_tsv_text(&rm_text(), "rm.tsv", config.min_classifier_score).unwrap();
    pipeline::consolidate(&contigs, &config, &filtered.kept, period_finder, classifier).unwrap()
}

#[test]
fn test_every_kept_region_is_accounted_for() {
    let contigs = contigs();
    let config = PipelineConfig::default().resolve(&contigs).unwrap();
    let filtered = pipeline::filter_regions(&contigs, &config, candidates()).unwrap();
    assert_eq!(filtered.kept.len(), 400);
    assert_eq!(filtered.rejected.len(), 1);

    let outcome = run();
    assert_eq!(outcome.regions_considered, 400);
    assert_eq!(outcome.catalog.len() + outcome.dropped.len(), 400);
    assert_eq!(
        outcome.dropped_for(DropReason::Unannotated),
        outcome.dropped.len()
    );

    for record in &outcome.catalog {
        assert!((0.0..=1.0).contains(&record.coverage_fraction));
        if record.partial_detection {
            assert!(!record.conflict_flag, "{} is partial and conflicting", record.region_id);
        }
        assert_eq!(record.rederive_conflict(5), record.conflict_flag);
    }
}

#[test]
fn test_catalog_order_is_canonical() {
    let contigs = contigs();
    let outcome = run();
    for pair in outcome.catalog.windows(2) {
        assert_eq!(
            contigs.compare(&pair[0].interval, &pair[1].interval),
            std::cmp::Ordering::Less
        );
    }
    assert_eq!(outcome.catalog[0].interval.contig, "chr1");
}

#[test]
fn test_output_independent_of_thread_count() {
    let single = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .unwrap()
        .install(run);
    let many = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .unwrap()
        .install(run);

    assert_eq!(
        catalog_to_string(&single.catalog).unwrap(),
        catalog_to_string(&many.catalog).unwrap()
    );
    assert_eq!(single.dropped, many.dropped);
    assert_eq!(single.overlap_counts, many.overlap_counts);
}

#[test]
fn test_catalog_survives_a_write_read_cycle() {
    let outcome = run();
    let text = catalog_to_string(&outcome.catalog).unwrap();
    let parsed = parse_catalog(&text).unwrap();

    assert_eq!(parsed.len(), outcome.catalog.len());
    for (read, written) in parsed.iter().zip(&outcome.catalog) {
        assert_eq!(read.region_id, written.region_id);
        assert_eq!(read.interval, written.interval);
        assert_eq!(read.coverage_fraction, written.coverage_fraction);
        assert_eq!(read.conflict_flag, written.conflict_flag);
        assert_eq!(read.partial_detection, written.partial_detection);
    }
    assert!(parsed.iter().any(|r| r.conflict_flag));
    assert!(parsed.iter().any(|r| r.partial_detection));
    for record in &parsed {
        assert_eq!(record.rederive_conflict(5), record.conflict_flag);
    }
}

#[test]
fn test_stats_agree_with_catalog() {
    let contigs = contigs();
    let config = PipelineConfig::default().resolve(&contigs).unwrap();
    let filtered = pipeline::filter_regions(&contigs, &config, candidates()).unwrap();
    let outcome = run();
    let regions: Vec<_> = filtered
        .kept
        .iter()
        .chain(&filtered.rejected)
        .cloned()
        .collect();

    let aggregator = StatsAggregator::new(config.histogram_edges.clone()).unwrap();
    let report = aggregator.report(Some(&regions), &outcome.catalog, Some(&outcome));

    let stats = &report.catalog;
    assert_eq!(stats.records, outcome.catalog.len());
    assert_eq!(
        stats.conflicts,
        outcome.catalog.iter().filter(|r| r.conflict_flag).count()
    );
    assert_eq!(stats.dropped(), Some(outcome.dropped.len()));
    assert_eq!(report.filter.as_ref().map(|f| f.total), Some(401));
    assert_eq!(report.catalog_histogram.total(), outcome.catalog.len());
}
