use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntervalError {
    #[error("start {start} is not less than end {end}")]
    Inverted { start: u64, end: u64 },

    #[error("unknown contig '{0}'")]
    UnknownContig(String),

    #[error("end {end} exceeds contig length {length}")]
    OutOfBounds { end: u64, length: u64 },
}

/// A half-open, 0-based genomic interval
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenomicInterval {
    pub contig: String,
    pub start: u64,
    pub end: u64,
}

impl GenomicInterval {
    pub fn new(contig: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            contig: contig.into(),
            start,
            end,
        }
    }

    /// Span in bp (saturating, so an inverted interval reports 0)
    #[must_use]
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Half-open overlap test; intervals that only touch do not overlap
    #[must_use]
    pub fn overlaps(&self, other: &GenomicInterval) -> bool {
        self.contig == other.contig && self.start < other.end && other.start < self.end
    }

    /// Number of shared bases, 0 when disjoint or on different contigs
    #[must_use]
    pub fn overlap_len(&self, other: &GenomicInterval) -> u64 {
        if self.contig != other.contig {
            return 0;
        }
        self.end
            .min(other.end)
            .saturating_sub(self.start.max(other.start))
    }

    /// Symmetric extension by `slop`, clamped to `[0, contig_length]`
    #[must_use]
    pub fn padded(&self, slop: u64, contig_length: u64) -> Self {
        Self {
            contig: self.contig.clone(),
            start: self.start.saturating_sub(slop),
            end: self.end.saturating_add(slop).min(contig_length),
        }
    }
}

impl std::fmt::Display for GenomicInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}-{}", self.contig, self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_len() {
        let a = GenomicInterval::new("chr1", 100, 200);
        assert_eq!(a.overlap_len(&GenomicInterval::new("chr1", 150, 300)), 50);
        assert_eq!(a.overlap_len(&GenomicInterval::new("chr1", 200, 300)), 0);
        assert_eq!(a.overlap_len(&GenomicInterval::new("chr2", 100, 200)), 0);
        assert_eq!(a.overlap_len(&GenomicInterval::new("chr1", 120, 130)), 10);
    }

    #[test]
    fn test_touching_intervals_do_not_overlap() {
        let a = GenomicInterval::new("chr1", 100, 200);
        assert!(!a.overlaps(&GenomicInterval::new("chr1", 200, 210)));
        assert!(!a.overlaps(&GenomicInterval::new("chr1", 90, 100)));
        assert!(a.overlaps(&GenomicInterval::new("chr1", 199, 210)));
    }

    #[test]
    fn test_padded_clamps_to_contig() {
        let a = GenomicInterval::new("chr1", 10, 990);
        let padded = a.padded(25, 1_000);
        assert_eq!(padded.start, 0);
        assert_eq!(padded.end, 1_000);

        let b = GenomicInterval::new("chr1", 100, 200).padded(25, 1_000);
        assert_eq!((b.start, b.end), (75, 225));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            GenomicInterval::new("chr21", 100, 200).to_string(),
            "chr21:100-200"
        );
    }
}
