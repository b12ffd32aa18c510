use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ConfigError;
use crate::consolidation::merger::{ConsolidatedAnnotation, MergeOutcome, OverlapCounts};
use crate::core::annotation::AnnotationFields;
use crate::core::region::Region;
use crate::core::types::{AnnotationSource, DropReason};
use crate::filtering::FilterSummary;
use crate::stats::spans::{Histogram, SpanStats};

/// Version of the stats report layout
pub const REPORT_VERSION: &str = "1.0.0";

fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

fn fraction(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        count_to_f64(part) / count_to_f64(whole)
    }
}

/// Number of regions per overlap count for one detector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapDistribution {
    /// overlapping calls -> regions
    pub plain: BTreeMap<usize, usize>,
    /// reciprocally overlapping calls -> regions
    pub reciprocal: BTreeMap<usize, usize>,
}

impl OverlapDistribution {
    fn add(&mut self, plain: usize, reciprocal: usize) {
        *self.plain.entry(plain).or_default() += 1;
        *self.reciprocal.entry(reciprocal).or_default() += 1;
    }

    /// Regions with at least one overlapping call
    #[must_use]
    pub fn regions_hit(&self) -> usize {
        self.plain
            .iter()
            .filter(|(&count, _)| count > 0)
            .map(|(_, &regions)| regions)
            .sum()
    }
}

/// Which detectors contributed to catalog records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceBreakdown {
    pub both: usize,
    pub period_finder_only: usize,
    pub classifier_only: usize,
}

/// Stats over the consolidated catalog and, when known, the merge that made it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub records: usize,
    pub conflicts: usize,
    pub conflict_fraction: f64,
    pub partial: usize,
    pub partial_fraction: f64,
    pub sources: SourceBreakdown,
    pub mean_coverage: f64,
    /// Records with coverage 1.0
    pub fully_covered: usize,
    /// Kept regions given to the merger
    pub kept_regions: Option<usize>,
    pub drops: BTreeMap<DropReason, usize>,
    /// Kept regions dropped as unannotated, as a fraction of kept regions
    pub unannotated_fraction: Option<f64>,
    pub overlap_counts: BTreeMap<AnnotationSource, OverlapDistribution>,
    /// Records per repeat class of the best classifier match
    #[serde(default)]
    pub classes: BTreeMap<String, usize>,
}

impl CatalogStats {
    #[must_use]
    pub fn from_catalog(catalog: &[ConsolidatedAnnotation]) -> Self {
        let mut sources = SourceBreakdown::default();
        let mut classes: BTreeMap<String, usize> = BTreeMap::new();
        for record in catalog {
            let summary = &record.source_summary;
            match (summary.period_finder.is_some(), summary.classifier.is_some()) {
                (true, true) => sources.both += 1,
                (true, false) => sources.period_finder_only += 1,
                (false, true) => sources.classifier_only += 1,
                (false, false) => {}
            }
            if let Some(AnnotationFields::Classifier(fields)) =
                summary.classifier.as_ref().map(|e| &e.best_match.fields)
            {
                *classes.entry(fields.class().to_string()).or_default() += 1;
            }
        }

        let records = catalog.len();
        let conflicts = catalog.iter().filter(|r| r.conflict_flag).count();
        let partial = catalog.iter().filter(|r| r.partial_detection).count();
        let coverage_sum: f64 = catalog.iter().map(|r| r.coverage_fraction).sum();

        Self {
            records,
            conflicts,
            conflict_fraction: fraction(conflicts, records),
            partial,
            partial_fraction: fraction(partial, records),
            sources,
            mean_coverage: if records == 0 {
                0.0
            } else {
                coverage_sum / count_to_f64(records)
            },
            fully_covered: catalog
                .iter()
                .filter(|r| r.coverage_fraction >= 1.0)
                .count(),
            kept_regions: None,
            drops: BTreeMap::new(),
            unannotated_fraction: None,
            overlap_counts: BTreeMap::new(),
            classes,
        }
    }

    /// Add drop counts and overlap distributions from the merge
    pub fn add_merge(&mut self, merge: &MergeOutcome) {
        self.kept_regions = Some(merge.regions_considered);
        self.drops = merge.drop_counts.clone();
        self.unannotated_fraction = Some(fraction(
            merge.dropped_for(DropReason::Unannotated),
            merge.regions_considered,
        ));
        self.overlap_counts = overlap_distributions(&merge.overlap_counts);
    }

    /// Add the kept region count when only the filtered table is known.
    /// Drop reasons stay unknown.
    pub fn add_kept_regions(&mut self, kept_regions: usize) {
        self.kept_regions = Some(kept_regions);
    }

    /// Kept regions missing from the catalog
    #[must_use]
    pub fn dropped(&self) -> Option<usize> {
        self.kept_regions.map(|kept| kept.saturating_sub(self.records))
    }
}

fn overlap_distributions(
    counts: &[OverlapCounts],
) -> BTreeMap<AnnotationSource, OverlapDistribution> {
    let mut period_finder = OverlapDistribution::default();
    let mut classifier = OverlapDistribution::default();
    for c in counts {
        period_finder.add(c.period_finder, c.period_finder_reciprocal);
        classifier.add(c.classifier, c.classifier_reciprocal);
    }
    BTreeMap::from([
        (AnnotationSource::PeriodFinder, period_finder),
        (AnnotationSource::Classifier, classifier),
    ])
}

/// Machine-readable stats report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    pub version: String,
    pub created_at: String,
    pub filter: Option<FilterSummary>,
    pub input_spans: Option<SpanStats>,
    pub kept_spans: Option<SpanStats>,
    pub catalog_spans: Option<SpanStats>,
    pub kept_histogram: Option<Histogram>,
    pub catalog_histogram: Histogram,
    pub catalog: CatalogStats,
    /// MD5 of the catalog file, when the catalog was written
    pub catalog_md5: Option<String>,
}

/// Computes stats reports. Pure: inputs are only read.
pub struct StatsAggregator {
    empty: Histogram,
}

impl StatsAggregator {
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidHistogramEdges` for unusable edges.
    pub fn new(edges: Vec<u64>) -> Result<Self, ConfigError> {
        Ok(Self {
            empty: Histogram::new(edges)?,
        })
    }

    /// Histogram of `lengths` over the configured edges
    #[must_use]
    pub fn histogram(&self, lengths: impl IntoIterator<Item = u64>) -> Histogram {
        let mut histogram = self.empty.clone();
        histogram.extend(lengths);
        histogram
    }

    /// Build a report.
    ///
    /// `regions` is every filtered region (kept and rejected) when known.
    /// `merge` adds drop reasons and overlap distributions.
    #[must_use]
    pub fn report(
        &self,
        regions: Option<&[Region]>,
        catalog: &[ConsolidatedAnnotation],
        merge: Option<&MergeOutcome>,
    ) -> StatsReport {
        let mut catalog_stats = CatalogStats::from_catalog(catalog);

        let (filter, input_spans, kept_spans, kept_histogram) = match regions {
            Some(regions) => {
                let summary = FilterSummary::from_regions(regions);
                catalog_stats.add_kept_regions(summary.kept);
                let kept_lengths: Vec<u64> = regions
                    .iter()
                    .filter(|r| r.is_kept())
                    .map(Region::span)
                    .collect();
                (
                    Some(summary),
                    SpanStats::from_lengths(regions.iter().map(Region::span)),
                    SpanStats::from_lengths(kept_lengths.iter().copied()),
                    Some(self.histogram(kept_lengths)),
                )
            }
            None => (None, None, None, None),
        };

        if let Some(merge) = merge {
            catalog_stats.add_merge(merge);
        }

        let catalog_lengths = catalog.iter().map(|r| r.interval.len());
        let report = StatsReport {
            version: REPORT_VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            filter,
            input_spans,
            kept_spans,
            catalog_spans: SpanStats::from_lengths(catalog_lengths.clone()),
            kept_histogram,
            catalog_histogram: self.histogram(catalog_lengths),
            catalog: catalog_stats,
            catalog_md5: None,
        };
        debug!(records = report.catalog.records, "Computed catalog stats");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_HISTOGRAM_EDGES;
    use crate::consolidation::merger::{AnnotationMerger, MergeConfig};
    use crate::core::annotation::test_support::{class, period};
    use crate::core::contig::{Contig, ContigTable};
    use crate::core::interval::GenomicInterval;
    use crate::core::types::RejectionReason;
    use crate::index::annotation_index::AnnotationIndex;

    fn contigs() -> ContigTable {
        ContigTable::new(vec![Contig::new("chr21", 1_000_000)]).unwrap()
    }

    fn merged(regions: &[Region]) -> MergeOutcome {
        let contigs = contigs();
        let pf = AnnotationIndex::build(
            AnnotationSource::PeriodFinder,
            vec![
                period(0, "chr21", 100, 200),
                period(1, "chr21", 1000, 1050),
            ],
            &contigs,
        );
        let cls = AnnotationIndex::build(
            AnnotationSource::Classifier,
            vec![class(0, "chr21", 1060, 1100)],
            &contigs,
        );
        let config = MergeConfig {
            slop: 0,
            ..MergeConfig::default()
        };
        AnnotationMerger::new(&contigs, &pf, &cls, &config)
            .unwrap()
            .merge(regions)
            .unwrap()
    }

    fn regions() -> Vec<Region> {
        vec![
            Region::kept(GenomicInterval::new("chr21", 100, 200)),
            Region::kept(GenomicInterval::new("chr21", 1000, 1100)),
            Region::kept(GenomicInterval::new("chr21", 5000, 5100)),
            Region::rejected(
                GenomicInterval::new("chr21", 9000, 9010),
                RejectionReason::TooShort,
            ),
        ]
    }

    #[test]
    fn test_report_with_merge() {
        let regions = regions();
        let kept: Vec<Region> = regions.iter().filter(|r| r.is_kept()).cloned().collect();
        let merge = merged(&kept);
        let aggregator = StatsAggregator::new(DEFAULT_HISTOGRAM_EDGES.to_vec()).unwrap();

        let report = aggregator.report(Some(&regions), &merge.catalog, Some(&merge));
        let catalog = &report.catalog;

        assert_eq!(catalog.records, 2);
        assert_eq!(catalog.conflicts, 1);
        assert!((catalog.conflict_fraction - 0.5).abs() < 1e-12);
        assert_eq!(catalog.partial, 1);
        assert_eq!(catalog.sources.both, 1);
        assert_eq!(catalog.sources.period_finder_only, 1);
        assert_eq!(catalog.kept_regions, Some(3));
        assert_eq!(catalog.drops.get(&DropReason::Unannotated), Some(&1));
        assert!((catalog.unannotated_fraction.unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(
            catalog.overlap_counts[&AnnotationSource::PeriodFinder].regions_hit(),
            2
        );
        assert_eq!(catalog.classes.get("Simple_repeat"), Some(&1));

        let filter = report.filter.unwrap();
        assert_eq!(filter.total, 4);
        assert_eq!(filter.rejected(RejectionReason::TooShort), 1);
        assert_eq!(report.input_spans.unwrap().count, 4);
        assert_eq!(report.kept_histogram.unwrap().total(), 3);
        assert_eq!(report.catalog_histogram.total(), 2);
    }

    #[test]
    fn test_classes_from_best_classifier_match() {
        let contigs = contigs();
        let pf = AnnotationIndex::build(AnnotationSource::PeriodFinder, vec![], &contigs);
        let mut satellite = class(1, "chr21", 2000, 2300);
        if let AnnotationFields::Classifier(fields) = &mut satellite.fields {
            fields.family = "Satellite/centr".to_string();
        }
        let mut low_complexity = class(2, "chr21", 4000, 4100);
        if let AnnotationFields::Classifier(fields) = &mut low_complexity.fields {
            fields.family = "Low_complexity".to_string();
        }
        let cls = AnnotationIndex::build(
            AnnotationSource::Classifier,
            vec![class(0, "chr21", 100, 200), satellite, low_complexity],
            &contigs,
        );
        let config = MergeConfig {
            slop: 0,
            ..MergeConfig::default()
        };
        let regions = [
            Region::kept(GenomicInterval::new("chr21", 100, 200)),
            Region::kept(GenomicInterval::new("chr21", 2000, 2300)),
            Region::kept(GenomicInterval::new("chr21", 2100, 2200)),
        ];
        let merge = AnnotationMerger::new(&contigs, &pf, &cls, &config)
            .unwrap()
            .merge(&regions)
            .unwrap();

        let stats = CatalogStats::from_catalog(&merge.catalog);
        assert_eq!(
            stats.classes,
            BTreeMap::from([
                ("Satellite".to_string(), 2),
                ("Simple_repeat".to_string(), 1),
            ])
        );
    }

    #[test]
    fn test_report_without_merge() {
        let regions = regions();
        let kept: Vec<Region> = regions.iter().filter(|r| r.is_kept()).cloned().collect();
        let merge = merged(&kept);
        let aggregator = StatsAggregator::new(DEFAULT_HISTOGRAM_EDGES.to_vec()).unwrap();

        let report = aggregator.report(Some(&regions), &merge.catalog, None);
        assert_eq!(report.catalog.dropped(), Some(1));
        assert!(report.catalog.drops.is_empty());
        assert!(report.catalog.unannotated_fraction.is_none());
    }

    #[test]
    fn test_empty_catalog() {
        let aggregator = StatsAggregator::new(vec![0, 10]).unwrap();
        let report = aggregator.report(None, &[], None);
        assert_eq!(report.catalog.records, 0);
        assert_eq!(report.catalog.conflict_fraction, 0.0);
        assert!(report.catalog_spans.is_none());
        assert!(report.filter.is_none());
    }

    #[test]
    fn test_report_serializes() {
        let aggregator = StatsAggregator::new(DEFAULT_HISTOGRAM_EDGES.to_vec()).unwrap();
        let report = aggregator.report(None, &[], None);
        let json = serde_json::to_string(&report).unwrap();
        let parsed: StatsReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.catalog, report.catalog);
    }
}
