use serde::{Deserialize, Serialize};

use crate::core::interval::GenomicInterval;

/// Stable identifier of a region, derived from its unpadded coordinates
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionId(pub String);

impl RegionId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn from_interval(interval: &GenomicInterval) -> Self {
        Self(interval.to_string())
    }
}

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which external detector produced an annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationSource {
    /// Repeat-period / copy-number detector (TRF)
    PeriodFinder,
    /// Repeat family / class detector (RepeatMasker)
    Classifier,
}

impl AnnotationSource {
    /// Short prefix used in annotation identifiers
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::PeriodFinder => "pf",
            Self::Classifier => "cls",
        }
    }
}

impl std::fmt::Display for AnnotationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PeriodFinder => write!(f, "period_finder"),
            Self::Classifier => write!(f, "classifier"),
        }
    }
}

/// Identifier of an annotation record: its source plus its position in the parsed input
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnnotationId {
    pub source: AnnotationSource,
    pub ordinal: usize,
}

impl AnnotationId {
    #[must_use]
    pub fn new(source: AnnotationSource, ordinal: usize) -> Self {
        Self { source, ordinal }
    }
}

impl std::fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.source.prefix(), self.ordinal)
    }
}

/// Why the region filter rejected a candidate region
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// Span below the configured minimum
    TooShort,
    /// Span above the configured maximum
    TooLong,
    /// Contig outside the accepted set (alt, decoy, unplaced, mitochondrial...)
    ExcludedContig,
    /// Same coordinates as an earlier kept region
    Duplicate,
}

impl RejectionReason {
    pub const ALL: [RejectionReason; 4] = [
        Self::TooShort,
        Self::TooLong,
        Self::ExcludedContig,
        Self::Duplicate,
    ];
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooShort => write!(f, "too_short"),
            Self::TooLong => write!(f, "too_long"),
            Self::ExcludedContig => write!(f, "excluded_contig"),
            Self::Duplicate => write!(f, "duplicate"),
        }
    }
}

/// Filter outcome of a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum RegionStatus {
    Kept,
    Rejected(RejectionReason),
}

impl std::fmt::Display for RegionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Kept => write!(f, "kept"),
            Self::Rejected(_) => write!(f, "rejected"),
        }
    }
}

/// Why the merger left a kept region out of the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// No annotation from either source
    Unannotated,
    /// Coverage below the configured minimum
    LowCoverage,
    /// Annotation index for the region's contig failed to build
    FailedContig,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unannotated => write!(f, "unannotated"),
            Self::LowCoverage => write!(f, "low_coverage"),
            Self::FailedContig => write!(f, "failed_contig"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_id_display() {
        assert_eq!(
            AnnotationId::new(AnnotationSource::PeriodFinder, 12).to_string(),
            "pf:12"
        );
        assert_eq!(
            AnnotationId::new(AnnotationSource::Classifier, 0).to_string(),
            "cls:0"
        );
    }

    #[test]
    fn test_region_id_from_interval() {
        let id = RegionId::from_interval(&GenomicInterval::new("chr21", 100, 200));
        assert_eq!(id.0, "chr21:100-200");
    }

    #[test]
    fn test_rejection_reason_serde_matches_display() {
        for reason in RejectionReason::ALL {
            let json = serde_json::to_string(&reason).unwrap();
            assert_eq!(json, format!("\"{reason}\""));
        }
    }
}
