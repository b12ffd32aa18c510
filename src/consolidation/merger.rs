use std::collections::{BTreeMap, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{DEFAULT_BOUNDARY_TOLERANCE, DEFAULT_RECIPROCAL_FRACTION, DEFAULT_SLOP};
use crate::consolidation::intersect::{
    combined_coverage, CoverageAnomaly, IntersectionResult, Intersector,
};
use crate::core::annotation::AnnotationRecord;
use crate::core::contig::ContigTable;
use crate::core::interval::{GenomicInterval, IntervalError};
use crate::core::region::Region;
use crate::core::types::{AnnotationId, AnnotationSource, DropReason, RegionId};
use crate::index::annotation_index::AnnotationIndex;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error(transparent)]
    CoverageAnomaly(#[from] CoverageAnomaly),

    #[error("Expected a {expected} index, got a {found} index")]
    WrongIndex {
        expected: AnnotationSource,
        found: AnnotationSource,
    },

    #[error("Region {0} is not a kept region")]
    NotKept(RegionId),

    #[error("Region {0} appears more than once")]
    DuplicateRegion(RegionId),

    #[error("Region {0} is on a contig missing from the contig table")]
    UnknownContig(RegionId),

    #[error("Malformed region {region_id}: {reason}")]
    MalformedRegion {
        region_id: RegionId,
        reason: IntervalError,
    },
}

/// Thresholds used when consolidating annotations
#[derive(Debug, Clone, PartialEq)]
pub struct MergeConfig {
    /// Padding applied to regions before annotation lookup (bp)
    pub slop: u64,
    /// Maximum difference between the detectors' best-match boundaries (bp)
    pub boundary_tolerance: u64,
    /// Regions with coverage below this are dropped
    pub min_coverage: f64,
    /// Reciprocal overlap fraction for overlap-count statistics
    pub reciprocal_fraction: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            slop: DEFAULT_SLOP,
            boundary_tolerance: DEFAULT_BOUNDARY_TOLERANCE,
            min_coverage: 0.0,
            reciprocal_fraction: DEFAULT_RECIPROCAL_FRACTION,
        }
    }
}

/// What one detector contributed to a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEvidence {
    pub annotation_count: usize,
    pub annotation_ids: Vec<AnnotationId>,
    pub coverage_fraction: f64,
    pub best_match: AnnotationRecord,
}

impl SourceEvidence {
    fn from_result(result: IntersectionResult) -> Option<Self> {
        let best_match = result.best_match?;
        Some(Self {
            annotation_count: result.annotation_ids.len(),
            annotation_ids: result.annotation_ids,
            coverage_fraction: result.coverage_fraction,
            best_match,
        })
    }
}

/// Per-source evidence of a consolidated region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_finder: Option<SourceEvidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<SourceEvidence>,
}

impl SourceSummary {
    #[must_use]
    pub fn sources(&self) -> Vec<AnnotationSource> {
        let mut sources = Vec::with_capacity(2);
        if self.period_finder.is_some() {
            sources.push(AnnotationSource::PeriodFinder);
        }
        if self.classifier.is_some() {
            sources.push(AnnotationSource::Classifier);
        }
        sources
    }

    /// Whether the two detectors' best matches disagree on boundaries.
    /// Always false unless both detectors contributed.
    #[must_use]
    pub fn boundaries_conflict(&self, tolerance: u64) -> bool {
        match (&self.period_finder, &self.classifier) {
            (Some(pf), Some(cls)) => {
                boundaries_differ(&pf.best_match.interval, &cls.best_match.interval, tolerance)
            }
            _ => false,
        }
    }
}

/// True if either boundary differs by more than `tolerance` bp
#[must_use]
pub fn boundaries_differ(a: &GenomicInterval, b: &GenomicInterval, tolerance: u64) -> bool {
    a.start.abs_diff(b.start) > tolerance || a.end.abs_diff(b.end) > tolerance
}

/// Final catalog record of one kept, annotated region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedAnnotation {
    pub region_id: RegionId,
    pub interval: GenomicInterval,
    pub source_summary: SourceSummary,
    pub coverage_fraction: f64,
    /// Both detectors annotated the region and their boundaries disagree
    pub conflict_flag: bool,
    /// Only one of the two queried detectors annotated the region
    pub partial_detection: bool,
}

impl ConsolidatedAnnotation {
    /// Recompute the conflict flag from the stored source summary
    #[must_use]
    pub fn rederive_conflict(&self, tolerance: u64) -> bool {
        self.source_summary.boundaries_conflict(tolerance)
    }
}

/// Number of calls per detector overlapping one region
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapCounts {
    pub period_finder: usize,
    pub classifier: usize,
    pub period_finder_reciprocal: usize,
    pub classifier_reciprocal: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Annotated(ConsolidatedAnnotation),
    Dropped(DropReason),
}

/// Result of consolidating one region
#[derive(Debug, Clone, PartialEq)]
pub struct RegionOutcome {
    pub region_id: RegionId,
    pub interval: GenomicInterval,
    pub counts: OverlapCounts,
    pub decision: Decision,
}

/// Result of consolidating every kept region
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// Consolidated records in canonical order
    pub catalog: Vec<ConsolidatedAnnotation>,
    /// Dropped regions in canonical order
    pub dropped: Vec<(RegionId, DropReason)>,
    pub drop_counts: BTreeMap<DropReason, usize>,
    /// Overlap counts of every considered region, in canonical order
    pub overlap_counts: Vec<OverlapCounts>,
    pub regions_considered: usize,
}

impl MergeOutcome {
    #[must_use]
    pub fn dropped_for(&self, reason: DropReason) -> usize {
        self.drop_counts.get(&reason).copied().unwrap_or(0)
    }
}

/// Resolves both detectors' calls into one record per kept region.
///
/// Pure: all inputs are already parsed and indexed. Regions are independent,
/// so [`AnnotationMerger::merge`] processes them in parallel and restores the
/// canonical order afterwards.
pub struct AnnotationMerger<'a> {
    contigs: &'a ContigTable,
    period_finder: &'a AnnotationIndex,
    classifier: &'a AnnotationIndex,
    config: &'a MergeConfig,
}

impl<'a> AnnotationMerger<'a> {
    /// # Errors
    ///
    /// Returns `MergeError::WrongIndex` if the indexes are swapped.
    pub fn new(
        contigs: &'a ContigTable,
        period_finder: &'a AnnotationIndex,
        classifier: &'a AnnotationIndex,
        config: &'a MergeConfig,
    ) -> Result<Self, MergeError> {
        for (index, expected) in [
            (period_finder, AnnotationSource::PeriodFinder),
            (classifier, AnnotationSource::Classifier),
        ] {
            if index.source() != expected {
                return Err(MergeError::WrongIndex {
                    expected,
                    found: index.source(),
                });
            }
        }
        Ok(Self {
            contigs,
            period_finder,
            classifier,
            config,
        })
    }

    /// Consolidate a single kept region
    ///
    /// # Errors
    ///
    /// Returns `MergeError::NotKept` for rejected regions,
    /// `MergeError::UnknownContig` for regions off the contig table,
    /// `MergeError::MalformedRegion` for inverted or out-of-range coordinates,
    /// or `MergeError::CoverageAnomaly` if a coverage computation exceeds 1.0.
    pub fn merge_region(&self, region: &Region) -> Result<RegionOutcome, MergeError> {
        if !region.is_kept() {
            return Err(MergeError::NotKept(region.id.clone()));
        }
        let contig_length = self
            .contigs
            .length(&region.interval.contig)
            .ok_or_else(|| MergeError::UnknownContig(region.id.clone()))?;
        self.contigs
            .validate(&region.interval)
            .map_err(|reason| MergeError::MalformedRegion {
                region_id: region.id.clone(),
                reason,
            })?;
        let region = region.with_slop(self.config.slop, contig_length);

        let outcome = |counts, decision| RegionOutcome {
            region_id: region.id.clone(),
            interval: region.interval.clone(),
            counts,
            decision,
        };

        let contig = &region.interval.contig;
        if self.period_finder.is_failed(contig) || self.classifier.is_failed(contig) {
            return Ok(outcome(
                OverlapCounts::default(),
                Decision::Dropped(DropReason::FailedContig),
            ));
        }

        let pf_intersector = Intersector::new(self.period_finder);
        let cls_intersector = Intersector::new(self.classifier);
        let pf = pf_intersector.intersect(&region)?;
        let cls = cls_intersector.intersect(&region)?;

        let fraction = self.config.reciprocal_fraction;
        let counts = OverlapCounts {
            period_finder: pf.count(),
            classifier: cls.count(),
            period_finder_reciprocal: pf_intersector.count_reciprocal_overlaps(&region, fraction),
            classifier_reciprocal: cls_intersector.count_reciprocal_overlaps(&region, fraction),
        };

        let consolidated = match (pf.is_empty(), cls.is_empty()) {
            (true, true) => {
                return Ok(outcome(counts, Decision::Dropped(DropReason::Unannotated)));
            }
            (false, false) => {
                let (_, coverage) = combined_coverage(&region, &[&pf, &cls])?;
                let source_summary = SourceSummary {
                    period_finder: SourceEvidence::from_result(pf),
                    classifier: SourceEvidence::from_result(cls),
                };
                let conflict_flag =
                    source_summary.boundaries_conflict(self.config.boundary_tolerance);
                ConsolidatedAnnotation {
                    region_id: region.id.clone(),
                    interval: region.interval.clone(),
                    source_summary,
                    coverage_fraction: coverage,
                    conflict_flag,
                    partial_detection: false,
                }
            }
            (pf_empty, _) => {
                let (result, summary_slot) = if pf_empty {
                    (cls, AnnotationSource::Classifier)
                } else {
                    (pf, AnnotationSource::PeriodFinder)
                };
                let coverage = result.coverage_fraction;
                let evidence = SourceEvidence::from_result(result);
                let source_summary = match summary_slot {
                    AnnotationSource::PeriodFinder => SourceSummary {
                        period_finder: evidence,
                        classifier: None,
                    },
                    AnnotationSource::Classifier => SourceSummary {
                        period_finder: None,
                        classifier: evidence,
                    },
                };
                ConsolidatedAnnotation {
                    region_id: region.id.clone(),
                    interval: region.interval.clone(),
                    source_summary,
                    coverage_fraction: coverage,
                    conflict_flag: false,
                    partial_detection: true,
                }
            }
        };

        if consolidated.coverage_fraction < self.config.min_coverage {
            return Ok(outcome(counts, Decision::Dropped(DropReason::LowCoverage)));
        }

        Ok(outcome(counts, Decision::Annotated(consolidated)))
    }

    /// Consolidate all kept regions. Output is in canonical order regardless
    /// of worker completion order.
    ///
    /// # Errors
    ///
    /// Returns `MergeError::DuplicateRegion` if two regions share an id, or the
    /// first error of [`AnnotationMerger::merge_region`].
    pub fn merge(&self, regions: &[Region]) -> Result<MergeOutcome, MergeError> {
        let mut seen = HashSet::with_capacity(regions.len());
        for region in regions {
            if !seen.insert(&region.id) {
                return Err(MergeError::DuplicateRegion(region.id.clone()));
            }
        }

        let mut outcomes: Vec<RegionOutcome> = regions
            .par_iter()
            .map(|region| self.merge_region(region))
            .collect::<Result<_, _>>()?;
        outcomes.sort_by(|a, b| self.contigs.compare(&a.interval, &b.interval));

        let mut merged = MergeOutcome {
            regions_considered: outcomes.len(),
            ..MergeOutcome::default()
        };
        for outcome in outcomes {
            merged.overlap_counts.push(outcome.counts);
            match outcome.decision {
                Decision::Annotated(record) => merged.catalog.push(record),
                Decision::Dropped(reason) => {
                    debug!(region = %outcome.region_id, %reason, "Dropped region");
                    *merged.drop_counts.entry(reason).or_default() += 1;
                    merged.dropped.push((outcome.region_id, reason));
                }
            }
        }

        info!(
            regions = merged.regions_considered,
            catalog = merged.catalog.len(),
            dropped = merged.dropped.len(),
            "Consolidated annotations"
        );

        Ok(merged)
    }
}
