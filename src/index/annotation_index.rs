use std::collections::{BTreeMap, HashMap};

use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::core::annotation::AnnotationRecord;
use crate::core::contig::ContigTable;
use crate::core::interval::{GenomicInterval, IntervalError};
use crate::core::types::{AnnotationId, AnnotationSource};
use crate::index::interval_set::{ContigIntervals, ContigIntervalsBuilder, Entry, IntervalSet};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnnotationError {
    #[error("Malformed {detector} annotation {id} at {interval}: {reason}")]
    Malformed {
        detector: AnnotationSource,
        id: AnnotationId,
        interval: GenomicInterval,
        reason: IntervalError,
    },

    #[error("Annotation {id} does not belong in a {expected} index")]
    SourceMismatch {
        expected: AnnotationSource,
        id: AnnotationId,
    },
}

/// Per-contig overlap index over the calls of one detector.
///
/// Each contig is built independently: a malformed record fails only its own
/// contig, which is then reported by [`AnnotationIndex::failures`] and absent
/// from queries. Callers decide whether any failure aborts the run
/// ([`AnnotationIndex::into_complete`]) or only that contig's regions.
#[derive(Debug)]
pub struct AnnotationIndex {
    source: AnnotationSource,
    set: IntervalSet<AnnotationRecord>,
    failures: BTreeMap<String, AnnotationError>,
}

impl AnnotationIndex {
    /// Build the index. Every contig partition is complete when this returns.
    #[must_use]
    pub fn build(
        source: AnnotationSource,
        records: Vec<AnnotationRecord>,
        contigs: &ContigTable,
    ) -> Self {
        let mut by_contig: HashMap<String, Vec<AnnotationRecord>> = HashMap::new();
        for record in records {
            by_contig
                .entry(record.interval.contig.clone())
                .or_default()
                .push(record);
        }

        let built: Vec<(String, Result<ContigIntervals<AnnotationRecord>, AnnotationError>)> =
            by_contig
                .into_par_iter()
                .map(|(contig, records)| {
                    let result = build_contig(source, records, contigs);
                    (contig, result)
                })
                .collect();

        let mut partitions = HashMap::new();
        let mut failures = BTreeMap::new();
        for (contig, result) in built {
            match result {
                Ok(intervals) => {
                    debug!(%source, contig = %contig, records = intervals.len(), "Indexed contig");
                    partitions.insert(contig, intervals);
                }
                Err(e) => {
                    failures.insert(contig, e);
                }
            }
        }

        Self {
            source,
            set: IntervalSet::from_contigs(partitions),
            failures,
        }
    }

    /// Fail on the first contig (by name) whose build failed
    ///
    /// # Errors
    ///
    /// Returns the recorded `AnnotationError` of the first failed contig.
    pub fn into_complete(self) -> Result<Self, AnnotationError> {
        match self.failures.values().next() {
            Some(e) => Err(e.clone()),
            None => Ok(self),
        }
    }

    #[must_use]
    pub fn source(&self) -> AnnotationSource {
        self.source
    }

    /// Calls overlapping `query`, sorted by (start, end, input order)
    #[must_use]
    pub fn find(&self, query: &GenomicInterval) -> Vec<&Entry<AnnotationRecord>> {
        self.set.find(query)
    }

    /// Contigs whose partition failed to build, with the first offending record
    #[must_use]
    pub fn failures(&self) -> &BTreeMap<String, AnnotationError> {
        &self.failures
    }

    #[must_use]
    pub fn is_failed(&self, contig: &str) -> bool {
        self.failures.contains_key(contig)
    }

    /// Number of indexed calls
    #[must_use]
    pub fn len(&self) -> usize {
        self.set.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

fn build_contig(
    source: AnnotationSource,
    records: Vec<AnnotationRecord>,
    contigs: &ContigTable,
) -> Result<ContigIntervals<AnnotationRecord>, AnnotationError> {
    let mut builder = ContigIntervalsBuilder::new();
    for record in records {
        if record.source() != source {
            return Err(AnnotationError::SourceMismatch {
                expected: source,
                id: record.id,
            });
        }
        if let Err(reason) = contigs.validate(&record.interval) {
            return Err(AnnotationError::Malformed {
                detector: source,
                id: record.id,
                interval: record.interval,
                reason,
            });
        }
        builder.insert(record.interval.start, record.interval.end, record);
    }
    Ok(builder.build())
}
