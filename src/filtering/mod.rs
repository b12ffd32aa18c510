//! Size and contig eligibility rules for candidate regions.
//!
//! [`RegionFilter`] partitions raw candidate intervals into kept and rejected
//! regions. Rules, checked in order:
//!
//! 1. Coordinates must be valid against the contig table (`start < end`, known
//!    contig, `end <= length`); anything else aborts with
//!    [`FilterError::MalformedInterval`].
//! 2. Contig must be in the accepted set, else `excluded_contig`.
//! 3. Span must be at least `min_span`, else `too_short`.
//! 4. Span must be at most `max_span`, else `too_long`.
//! 5. Coordinates must not repeat an earlier kept region, else `duplicate`.
//!
//! Output order follows input order, so the same input and configuration always
//! give the same partition. Filtering an already kept set returns it unchanged.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::ConfigError;
use crate::core::contig::ContigTable;
use crate::core::interval::{GenomicInterval, IntervalError};
use crate::core::region::Region;
use crate::core::types::RejectionReason;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Malformed region {interval} (input row {row}): {reason}")]
    MalformedInterval {
        row: usize,
        interval: GenomicInterval,
        reason: IntervalError,
    },
}

/// Thresholds and accepted contigs for the region filter
#[derive(Debug, Clone)]
pub struct FilterConfig {
    min_span: u64,
    max_span: u64,
    accepted_contigs: HashSet<String>,
}

impl FilterConfig {
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidSpanRange` if `min_span >= max_span`, or
    /// `ConfigError::EmptyContigSet` if no contig is accepted.
    pub fn new(
        min_span: u64,
        max_span: u64,
        accepted_contigs: impl IntoIterator<Item = String>,
    ) -> Result<Self, ConfigError> {
        if min_span >= max_span {
            return Err(ConfigError::InvalidSpanRange { min_span, max_span });
        }
        let accepted_contigs: HashSet<String> = accepted_contigs.into_iter().collect();
        if accepted_contigs.is_empty() {
            return Err(ConfigError::EmptyContigSet);
        }
        Ok(Self {
            min_span,
            max_span,
            accepted_contigs,
        })
    }

    #[must_use]
    pub fn min_span(&self) -> u64 {
        self.min_span
    }

    #[must_use]
    pub fn max_span(&self) -> u64 {
        self.max_span
    }

    #[must_use]
    pub fn accepts(&self, contig: &str) -> bool {
        self.accepted_contigs.contains(contig)
    }
}

/// Counts from one filter run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSummary {
    pub total: usize,
    pub kept: usize,
    pub removed: usize,
    /// Rejections per reason; every reason is present, possibly with 0
    pub by_reason: BTreeMap<RejectionReason, usize>,
    pub span_total: u64,
    pub span_kept: u64,
    pub span_removed: u64,
}

impl FilterSummary {
    fn new() -> Self {
        Self {
            by_reason: RejectionReason::ALL.iter().map(|&r| (r, 0)).collect(),
            ..Self::default()
        }
    }

    /// Recount a summary from already-filtered regions, e.g. a filtered table
    /// read back from disk
    #[must_use]
    pub fn from_regions<'r>(regions: impl IntoIterator<Item = &'r Region>) -> Self {
        let mut summary = Self::new();
        for region in regions {
            let span = region.span();
            summary.total += 1;
            summary.span_total += span;
            match region.rejection_reason() {
                Some(reason) => {
                    summary.removed += 1;
                    summary.span_removed += span;
                    *summary.by_reason.entry(reason).or_default() += 1;
                }
                None => {
                    summary.kept += 1;
                    summary.span_kept += span;
                }
            }
        }
        summary
    }

    #[must_use]
    pub fn rejected(&self, reason: RejectionReason) -> usize {
        self.by_reason.get(&reason).copied().unwrap_or(0)
    }

    /// Percentage of regions removed
    #[must_use]
    pub fn removed_pct(&self) -> f64 {
        percent(self.removed as f64, self.total as f64)
    }

    /// Percentage of total span removed
    #[must_use]
    pub fn span_removed_pct(&self) -> f64 {
        percent(self.span_removed as f64, self.span_total as f64)
    }
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

/// Kept and rejected regions plus counts
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub kept: Vec<Region>,
    pub rejected: Vec<Region>,
    pub summary: FilterSummary,
}

/// Applies [`FilterConfig`] to candidate intervals
pub struct RegionFilter<'a> {
    contigs: &'a ContigTable,
    config: &'a FilterConfig,
}

impl<'a> RegionFilter<'a> {
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownContig` if an accepted contig is missing
    /// from the contig table.
    pub fn new(contigs: &'a ContigTable, config: &'a FilterConfig) -> Result<Self, ConfigError> {
        let mut unknown: Vec<&String> = config
            .accepted_contigs
            .iter()
            .filter(|name| !contigs.contains(name))
            .collect();
        unknown.sort();
        if let Some(name) = unknown.first() {
            return Err(ConfigError::UnknownContig((*name).clone()));
        }
        Ok(Self { contigs, config })
    }

    /// Partition `intervals` into kept and rejected regions
    ///
    /// # Errors
    ///
    /// Returns `FilterError::MalformedInterval` for the first interval that is
    /// inverted, on an unknown contig, or past the contig end.
    pub fn filter(
        &self,
        intervals: impl IntoIterator<Item = GenomicInterval>,
    ) -> Result<FilterOutcome, FilterError> {
        let mut kept = Vec::new();
        let mut rejected = Vec::new();
        let mut summary = FilterSummary::new();
        let mut seen: HashSet<GenomicInterval> = HashSet::new();

        for (row, interval) in intervals.into_iter().enumerate() {
            if let Err(reason) = self.contigs.validate(&interval) {
                return Err(FilterError::MalformedInterval {
                    row: row + 1,
                    interval,
                    reason,
                });
            }

            let span = interval.len();
            summary.total += 1;
            summary.span_total += span;

            match self.rejection_reason(&interval, &seen) {
                Some(reason) => {
                    summary.removed += 1;
                    summary.span_removed += span;
                    *summary.by_reason.entry(reason).or_default() += 1;
                    rejected.push(Region::rejected(interval, reason));
                }
                None => {
                    summary.kept += 1;
                    summary.span_kept += span;
                    seen.insert(interval.clone());
                    kept.push(Region::kept(interval));
                }
            }
        }

        info!(
            total = summary.total,
            kept = summary.kept,
            removed = summary.removed,
            "Filtered candidate regions"
        );

        Ok(FilterOutcome {
            kept,
            rejected,
            summary,
        })
    }

    fn rejection_reason(
        &self,
        interval: &GenomicInterval,
        seen: &HashSet<GenomicInterval>,
    ) -> Option<RejectionReason> {
        let span = interval.len();
        if !self.config.accepts(&interval.contig) {
            Some(RejectionReason::ExcludedContig)
        } else if span < self.config.min_span {
            Some(RejectionReason::TooShort)
        } else if span > self.config.max_span {
            Some(RejectionReason::TooLong)
        } else if seen.contains(interval) {
            Some(RejectionReason::Duplicate)
        } else {
            None
        }
    }
}
