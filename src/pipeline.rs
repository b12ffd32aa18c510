//! Stage wiring shared by the CLI and library users.
//!
//! Parsing stays with the caller; these functions take parsed inputs and run
//! filter, index build and merge with the configured failure handling.

use thiserror::Error;
use tracing::{info, warn};

use crate::config::ResolvedConfig;
use crate::consolidation::merger::{AnnotationMerger, MergeError, MergeOutcome};
use crate::core::annotation::AnnotationRecord;
use crate::core::contig::ContigTable;
use crate::core::interval::GenomicInterval;
use crate::core::region::Region;
use crate::core::types::AnnotationSource;
use crate::filtering::{FilterError, FilterOutcome, RegionFilter};
use crate::index::annotation_index::{AnnotationError, AnnotationIndex};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Annotation(#[from] AnnotationError),

    #[error(transparent)]
    Merge(#[from] MergeError),
}

/// Run the region filter
///
/// # Errors
///
/// Returns `PipelineError::Filter` for a malformed interval or a filter
/// configuration that does not fit the contig table.
pub fn filter_regions(
    contigs: &ContigTable,
    config: &ResolvedConfig,
    intervals: Vec<GenomicInterval>,
) -> Result<FilterOutcome, PipelineError> {
    let filter = RegionFilter::new(contigs, &config.filter).map_err(FilterError::from)?;
    Ok(filter.filter(intervals)?)
}

/// Build one detector's index. Contig failures abort unless
/// `isolate_contig_failures` is set, in which case each one is logged.
///
/// # Errors
///
/// Returns `PipelineError::Annotation` with the first failed contig in strict
/// mode.
pub fn build_index(
    source: AnnotationSource,
    records: Vec<AnnotationRecord>,
    contigs: &ContigTable,
    isolate_contig_failures: bool,
) -> Result<AnnotationIndex, PipelineError> {
    let index = AnnotationIndex::build(source, records, contigs);
    if !isolate_contig_failures {
        return Ok(index.into_complete()?);
    }
    for (contig, error) in index.failures() {
        warn!(%source, contig = %contig, "Skipping contig: {error}");
    }
    Ok(index)
}

/// Build both indexes and consolidate the kept regions
///
/// # Errors
///
/// Returns `PipelineError::Annotation` when an index fails in strict mode, or
/// `PipelineError::Merge` if the merge fails.
pub fn consolidate(
    contigs: &ContigTable,
    config: &ResolvedConfig,
    kept: &[Region],
    period_finder: Vec<AnnotationRecord>,
    classifier: Vec<AnnotationRecord>,
) -> Result<MergeOutcome, PipelineError> {
    let isolate = config.isolate_contig_failures;
    let pf_index = build_index(AnnotationSource::PeriodFinder, period_finder, contigs, isolate)?;
    let cls_index = build_index(AnnotationSource::Classifier, classifier, contigs, isolate)?;
    info!(
        period_finder = pf_index.len(),
        classifier = cls_index.len(),
        "Built annotation indexes"
    );

    let merger = AnnotationMerger::new(contigs, &pf_index, &cls_index, &config.merge)?;
    Ok(merger.merge(kept)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::core::annotation::test_support::{class, period};
    use crate::core::contig::Contig;
    use crate::core::types::DropReason;

    fn contigs() -> ContigTable {
        ContigTable::new(vec![
            Contig::new("chr1", 100_000),
            Contig::new("chr2", 100_000),
        ])
        .unwrap()
    }

    fn resolved(isolate: bool) -> ResolvedConfig {
        PipelineConfig {
            slop: 0,
            isolate_contig_failures: isolate,
            ..PipelineConfig::default()
        }
        .resolve(&contigs())
        .unwrap()
    }

    #[test]
    fn test_filter_then_consolidate() {
        let contigs = contigs();
        let config = resolved(false);
        let filtered = filter_regions(
            &contigs,
            &config,
            vec![
                GenomicInterval::new("chr2", 100, 200),
                GenomicInterval::new("chr1", 100, 120),
                GenomicInterval::new("chr1", 500, 600),
            ],
        )
        .unwrap();
        assert_eq!(filtered.kept.len(), 2);

        let merged = consolidate(
            &contigs,
            &config,
            &filtered.kept,
            vec![period(0, "chr2", 100, 200), period(1, "chr1", 500, 600)],
            vec![class(0, "chr1", 500, 600)],
        )
        .unwrap();
        let ids: Vec<String> = merged.catalog.iter().map(|c| c.region_id.to_string()).collect();
        assert_eq!(ids, vec!["chr1:500-600", "chr2:100-200"]);
    }

    #[test]
    fn test_strict_mode_aborts_on_bad_record() {
        let contigs = contigs();
        let result = consolidate(
            &contigs,
            &resolved(false),
            &[Region::kept(GenomicInterval::new("chr1", 500, 600))],
            vec![period(0, "chr1", 500, 600), period(1, "chr2", 99_990, 100_010)],
            vec![],
        );
        assert!(matches!(result, Err(PipelineError::Annotation(_))));
    }

    #[test]
    fn test_isolated_mode_drops_failed_contig_only() {
        let contigs = contigs();
        let merged = consolidate(
            &contigs,
            &resolved(true),
            &[
                Region::kept(GenomicInterval::new("chr1", 500, 600)),
                Region::kept(GenomicInterval::new("chr2", 500, 600)),
            ],
            vec![period(0, "chr1", 500, 600), period(1, "chr2", 99_990, 100_010)],
            vec![],
        )
        .unwrap();
        assert_eq!(merged.catalog.len(), 1);
        assert_eq!(merged.dropped_for(DropReason::FailedContig), 1);
    }
}
