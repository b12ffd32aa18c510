use serde::{Deserialize, Serialize};

use crate::core::interval::GenomicInterval;
use crate::core::types::{AnnotationId, AnnotationSource};

/// Attributes reported by the period finder (TRF)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodFields {
    /// Repeat period in bp
    pub period: f64,
    /// Number of copies of the motif
    pub copies: f64,
    /// Alignment score
    pub score: u32,
    /// Entropy of the repeat (0-2)
    pub entropy: f64,
    /// Consensus motif
    pub motif: String,
}

/// Attributes reported by the repeat classifier (RepeatMasker)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassFields {
    /// Class/family string, e.g. `Satellite/centr`
    pub family: String,
    /// Percent divergence from the consensus
    pub divergence: f64,
    /// Smith-Waterman score, when the input reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

impl ClassFields {
    /// Repeat class: the family string up to the first `/`
    #[must_use]
    pub fn class(&self) -> &str {
        self.family.split('/').next().unwrap_or(&self.family)
    }
}

/// Source-specific payload; the variant determines the record's source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum AnnotationFields {
    PeriodFinder(PeriodFields),
    Classifier(ClassFields),
}

impl AnnotationFields {
    #[must_use]
    pub fn source(&self) -> AnnotationSource {
        match self {
            Self::PeriodFinder(_) => AnnotationSource::PeriodFinder,
            Self::Classifier(_) => AnnotationSource::Classifier,
        }
    }
}

/// One parsed detector call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub id: AnnotationId,
    pub interval: GenomicInterval,
    pub fields: AnnotationFields,
}

impl AnnotationRecord {
    /// Create a record; the id's source is taken from `fields`
    #[must_use]
    pub fn new(ordinal: usize, interval: GenomicInterval, fields: AnnotationFields) -> Self {
        Self {
            id: AnnotationId::new(fields.source(), ordinal),
            interval,
            fields,
        }
    }

    #[must_use]
    pub fn source(&self) -> AnnotationSource {
        self.fields.source()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn period(ordinal: usize, contig: &str, start: u64, end: u64) -> AnnotationRecord {
        AnnotationRecord::new(
            ordinal,
            GenomicInterval::new(contig, start, end),
            AnnotationFields::PeriodFinder(PeriodFields {
                period: 2.0,
                copies: ((end - start) / 2) as f64,
                score: 100,
                entropy: 1.0,
                motif: "AC".to_string(),
            }),
        )
    }

    pub fn class(ordinal: usize, contig: &str, start: u64, end: u64) -> AnnotationRecord {
        AnnotationRecord::new(
            ordinal,
            GenomicInterval::new(contig, start, end),
            AnnotationFields::Classifier(ClassFields {
                family: "Simple_repeat".to_string(),
                divergence: 5.0,
                score: Some(300),
            }),
        )
    }
}
