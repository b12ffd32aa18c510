use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::annotation::AnnotationRecord;
use crate::core::region::Region;
use crate::core::types::{AnnotationId, AnnotationSource, RegionId};
use crate::index::annotation_index::AnnotationIndex;

/// A computed coverage above 1.0. This means the span union is wrong, not the
/// input, so it is reported and never clamped.
#[derive(Error, Debug, Clone, PartialEq)]
#[error(
    "Coverage anomaly for region {region_id}: {covered_bp} bp covered of {region_bp} bp"
)]
pub struct CoverageAnomaly {
    pub region_id: RegionId,
    pub covered_bp: u64,
    pub region_bp: u64,
}

/// Overlap of one region with the calls of one detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntersectionResult {
    pub region_id: RegionId,
    pub source: AnnotationSource,
    /// Calls found through the padded interval, in (start, end, input) order
    pub annotation_ids: Vec<AnnotationId>,
    /// Bases each call shares with the unpadded region; 0 for slop-only hits
    pub overlap_bp: Vec<u64>,
    /// Union of call bases inside the unpadded region
    pub covered_bp: u64,
    pub coverage_fraction: f64,
    /// Largest overlap; ties go to the earliest start, then end, then input order
    pub best_match: Option<AnnotationRecord>,
    /// Call spans clipped to the unpadded region
    #[serde(skip)]
    pub clipped_spans: Vec<(u64, u64)>,
}

impl IntersectionResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.annotation_ids.is_empty()
    }

    /// Number of overlapping calls
    #[must_use]
    pub fn count(&self) -> usize {
        self.annotation_ids.len()
    }
}

/// Sort and merge half-open spans. Adjacent spans are merged.
#[must_use]
pub fn merge_spans(mut spans: Vec<(u64, u64)>) -> Vec<(u64, u64)> {
    spans.retain(|(s, e)| s < e);
    spans.sort_unstable();

    let mut merged: Vec<(u64, u64)> = Vec::with_capacity(spans.len());
    for (start, end) in spans {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Total length of the union of `spans`
#[must_use]
pub fn union_length(spans: Vec<(u64, u64)>) -> u64 {
    merge_spans(spans).iter().map(|(s, e)| e - s).sum()
}

/// `covered_bp / region_bp`, refusing anything outside `[0, 1]`
///
/// # Errors
///
/// Returns `CoverageAnomaly` when `covered_bp > region_bp` or the region is empty.
#[allow(clippy::cast_precision_loss)]
pub fn coverage_fraction(
    region_id: &RegionId,
    covered_bp: u64,
    region_bp: u64,
) -> Result<f64, CoverageAnomaly> {
    if region_bp == 0 || covered_bp > region_bp {
        return Err(CoverageAnomaly {
            region_id: region_id.clone(),
            covered_bp,
            region_bp,
        });
    }
    Ok(covered_bp as f64 / region_bp as f64)
}

/// Coverage of a region by the union of several intersections' clipped spans
///
/// # Errors
///
/// Returns `CoverageAnomaly` if the union exceeds the region.
pub fn combined_coverage(
    region: &Region,
    results: &[&IntersectionResult],
) -> Result<(u64, f64), CoverageAnomaly> {
    let spans: Vec<(u64, u64)> = results
        .iter()
        .flat_map(|r| r.clipped_spans.iter().copied())
        .collect();
    let covered = union_length(spans);
    let fraction = coverage_fraction(&region.id, covered, region.span())?;
    Ok((covered, fraction))
}

/// Joins regions against one detector's index
pub struct Intersector<'a> {
    index: &'a AnnotationIndex,
}

impl<'a> Intersector<'a> {
    pub fn new(index: &'a AnnotationIndex) -> Self {
        Self { index }
    }

    #[must_use]
    pub fn source(&self) -> AnnotationSource {
        self.index.source()
    }

    /// Look up calls with the padded interval and measure them against the
    /// unpadded one. No overlapping calls gives an empty result, not an error.
    ///
    /// # Errors
    ///
    /// Returns `CoverageAnomaly` if the computed coverage exceeds 1.0.
    pub fn intersect(&self, region: &Region) -> Result<IntersectionResult, CoverageAnomaly> {
        let original = &region.interval;
        let hits = self.index.find(&region.padded);

        let mut annotation_ids = Vec::with_capacity(hits.len());
        let mut overlap_bp = Vec::with_capacity(hits.len());
        let mut clipped_spans = Vec::with_capacity(hits.len());
        let mut best: Option<(&AnnotationRecord, u64)> = None;

        for entry in hits {
            let record = &entry.value;
            let overlap = original.overlap_len(&record.interval);

            annotation_ids.push(record.id);
            overlap_bp.push(overlap);
            if overlap > 0 {
                clipped_spans.push((
                    record.interval.start.max(original.start),
                    record.interval.end.min(original.end),
                ));
            }

            let better = match best {
                None => true,
                Some((current, current_overlap)) => {
                    best_match_key(record, overlap) < best_match_key(current, current_overlap)
                }
            };
            if better {
                best = Some((record, overlap));
            }
        }

        let covered_bp = union_length(clipped_spans.clone());
        let coverage = coverage_fraction(&region.id, covered_bp, original.len())?;

        Ok(IntersectionResult {
            region_id: region.id.clone(),
            source: self.index.source(),
            annotation_ids,
            overlap_bp,
            covered_bp,
            coverage_fraction: coverage,
            best_match: best.map(|(record, _)| record.clone()),
            clipped_spans,
        })
    }

    /// Calls where the shared bases cover at least `min_fraction` of both the
    /// unpadded region and the call
    #[must_use]
    pub fn count_reciprocal_overlaps(&self, region: &Region, min_fraction: f64) -> usize {
        let original = &region.interval;
        self.index
            .find(&region.padded)
            .into_iter()
            .filter(|entry| {
                let shared = original.overlap_len(&entry.value.interval);
                shared > 0
                    && reaches_fraction(shared, original.len(), min_fraction)
                    && reaches_fraction(shared, entry.value.interval.len(), min_fraction)
            })
            .count()
    }
}

fn best_match_key(record: &AnnotationRecord, overlap: u64) -> (Reverse<u64>, u64, u64, usize) {
    (
        Reverse(overlap),
        record.interval.start,
        record.interval.end,
        record.id.ordinal,
    )
}

#[allow(clippy::cast_precision_loss)]
fn reaches_fraction(shared: u64, length: u64, min_fraction: f64) -> bool {
    length > 0 && shared as f64 >= min_fraction * length as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::annotation::test_support::{class, period};
    use crate::core::contig::{Contig, ContigTable};
    use crate::core::interval::GenomicInterval;

    fn contigs() -> ContigTable {
        ContigTable::new(vec![Contig::new("chr21", 100_000), Contig::new("chr22", 100_000)])
            .unwrap()
    }

    fn region(start: u64, end: u64, slop: u64) -> Region {
        Region::kept(GenomicInterval::new("chr21", start, end)).with_slop(slop, 100_000)
    }

    fn index(records: Vec<AnnotationRecord>) -> AnnotationIndex {
        let source = records[0].source();
        AnnotationIndex::build(source, records, &contigs())
    }

    #[test]
    fn test_merge_spans() {
        assert_eq!(
            merge_spans(vec![(50, 60), (10, 20), (15, 30), (30, 40)]),
            vec![(10, 40), (50, 60)]
        );
        assert_eq!(union_length(vec![(0, 10), (5, 15), (20, 25)]), 20);
        assert!(merge_spans(vec![]).is_empty());
    }

    #[test]
    fn test_full_coverage() {
        let index = index(vec![period(0, "chr21", 100, 200)]);
        let result = Intersector::new(&index).intersect(&region(100, 200, 0)).unwrap();
        assert_eq!(result.coverage_fraction, 1.0);
        assert_eq!(result.overlap_bp, vec![100]);
        assert_eq!(result.best_match.unwrap().id.to_string(), "pf:0");
    }

    #[test]
    fn test_overlapping_calls_are_unioned_not_summed() {
        let index = index(vec![
            period(0, "chr21", 1000, 1080),
            period(1, "chr21", 1020, 1100),
            period(2, "chr21", 1010, 1050),
        ]);
        let result = Intersector::new(&index)
            .intersect(&region(1000, 1100, 0))
            .unwrap();
        assert_eq!(result.covered_bp, 100);
        assert_eq!(result.coverage_fraction, 1.0);
        assert_eq!(result.count(), 3);
    }

    #[test]
    fn test_coverage_uses_unpadded_region() {
        // Call hangs 20 bp past each end; padding must not inflate coverage
        let index = index(vec![period(0, "chr21", 80, 150)]);
        let result = Intersector::new(&index)
            .intersect(&region(100, 200, 25))
            .unwrap();
        assert_eq!(result.overlap_bp, vec![50]);
        assert!((result.coverage_fraction - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_slop_only_hit_is_reported_with_zero_overlap() {
        let index = index(vec![period(0, "chr21", 205, 220)]);
        let intersector = Intersector::new(&index);

        let padded = intersector.intersect(&region(100, 200, 25)).unwrap();
        assert_eq!(padded.count(), 1);
        assert_eq!(padded.overlap_bp, vec![0]);
        assert_eq!(padded.coverage_fraction, 0.0);

        let unpadded = intersector.intersect(&region(100, 200, 0)).unwrap();
        assert!(unpadded.is_empty());
        assert!(unpadded.best_match.is_none());
    }

    #[test]
    fn test_best_match_tie_breaks() {
        // Equal overlap of 50 bp: earliest start wins
        let index = index(vec![
            period(0, "chr21", 150, 250),
            period(1, "chr21", 50, 150),
            period(2, "chr21", 120, 140),
        ]);
        let result = Intersector::new(&index).intersect(&region(100, 200, 0)).unwrap();
        assert_eq!(result.best_match.unwrap().id.ordinal, 1);
    }

    #[test]
    fn test_best_match_prefers_largest_overlap() {
        let index = index(vec![period(0, "chr21", 90, 120), period(1, "chr21", 130, 200)]);
        let result = Intersector::new(&index).intersect(&region(100, 200, 0)).unwrap();
        assert_eq!(result.best_match.unwrap().id.ordinal, 1);
    }

    #[test]
    fn test_no_cross_contig_annotations() {
        let index = index(vec![class(0, "chr22", 100, 200)]);
        let result = Intersector::new(&index).intersect(&region(100, 200, 25)).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.source, AnnotationSource::Classifier);
    }

    #[test]
    fn test_coverage_anomaly_not_clamped() {
        let id = RegionId::new("chr21:0-10");
        let err = coverage_fraction(&id, 11, 10).unwrap_err();
        assert_eq!(err.covered_bp, 11);
        assert_eq!(coverage_fraction(&id, 10, 10).unwrap(), 1.0);
    }

    #[test]
    fn test_combined_coverage() {
        let pf = index(vec![period(0, "chr21", 100, 150)]);
        let cls = index(vec![class(0, "chr21", 140, 180)]);
        let r = region(100, 200, 0);
        let a = Intersector::new(&pf).intersect(&r).unwrap();
        let b = Intersector::new(&cls).intersect(&r).unwrap();
        let (covered, fraction) = combined_coverage(&r, &[&a, &b]).unwrap();
        assert_eq!(covered, 80);
        assert!((fraction - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_reciprocal_overlap_count() {
        let index = index(vec![
            period(0, "chr21", 100, 200),
            period(1, "chr21", 100, 130),
            period(2, "chr21", 50, 1_000),
        ]);
        let intersector = Intersector::new(&index);
        let r = region(100, 200, 0);
        assert_eq!(intersector.intersect(&r).unwrap().count(), 3);
        // pf:1 covers only 30% of the region; pf:2 is covered only ~10% by it
        assert_eq!(intersector.count_reciprocal_overlaps(&r, 0.5), 1);
    }
}
