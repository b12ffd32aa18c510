use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::interval::{GenomicInterval, IntervalError};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ContigError {
    #[error("Contig '{0}' is declared more than once")]
    Duplicate(String),

    #[error("Contig '{0}' has zero length")]
    ZeroLength(String),

    #[error("Contig table is empty")]
    Empty,
}

/// A single contig/sequence in a reference genome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contig {
    /// Sequence name as it appears in the reference index
    pub name: String,

    /// Sequence length in bp
    pub length: u64,
}

impl Contig {
    pub fn new(name: impl Into<String>, length: u64) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }

    /// Check if this contig is a primary chromosome (1-22, X, Y)
    /// Matches both UCSC (chr1) and NCBI (1) naming conventions exactly
    pub fn is_primary_chromosome(&self) -> bool {
        let autosome = self.name.strip_prefix("chr").unwrap_or(&self.name);
        match autosome {
            "X" | "Y" => true,
            digits => {
                !digits.starts_with('0')
                    && digits.bytes().all(|b| b.is_ascii_digit())
                    && digits.parse::<u8>().is_ok_and(|n| (1..=22).contains(&n))
            }
        }
    }
}

/// Contig lengths of a reference in declaration order.
///
/// Declaration order defines the canonical ordering of every interval in the
/// crate, so intervals are compared through the table rather than by name.
#[derive(Debug, Clone)]
pub struct ContigTable {
    contigs: Vec<Contig>,
    name_to_rank: HashMap<String, usize>,
}

impl ContigTable {
    /// Build a table, rejecting duplicate names and zero-length contigs
    ///
    /// # Errors
    ///
    /// Returns `ContigError::Empty` for an empty list, `ContigError::Duplicate`
    /// when a name repeats, or `ContigError::ZeroLength` for a zero-length contig.
    pub fn new(contigs: Vec<Contig>) -> Result<Self, ContigError> {
        if contigs.is_empty() {
            return Err(ContigError::Empty);
        }

        let mut name_to_rank = HashMap::with_capacity(contigs.len());
        for (rank, contig) in contigs.iter().enumerate() {
            if contig.length == 0 {
                return Err(ContigError::ZeroLength(contig.name.clone()));
            }
            if name_to_rank.insert(contig.name.clone(), rank).is_some() {
                return Err(ContigError::Duplicate(contig.name.clone()));
            }
        }

        Ok(Self {
            contigs,
            name_to_rank,
        })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Contig> {
        self.name_to_rank.get(name).map(|&rank| &self.contigs[rank])
    }

    #[must_use]
    pub fn length(&self, name: &str) -> Option<u64> {
        self.get(name).map(|c| c.length)
    }

    /// Declaration index of a contig
    #[must_use]
    pub fn rank(&self, name: &str) -> Option<usize> {
        self.name_to_rank.get(name).copied()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.name_to_rank.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contig> {
        self.contigs.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.contigs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }

    /// Names of primary chromosomes, in declaration order
    #[must_use]
    pub fn primary_names(&self) -> Vec<String> {
        self.contigs
            .iter()
            .filter(|c| c.is_primary_chromosome())
            .map(|c| c.name.clone())
            .collect()
    }

    /// Canonical sort key: (declaration rank, start, end).
    /// Unknown contigs sort after every known one.
    #[must_use]
    pub fn sort_key(&self, interval: &GenomicInterval) -> (usize, u64, u64) {
        let rank = self.rank(&interval.contig).unwrap_or(usize::MAX);
        (rank, interval.start, interval.end)
    }

    #[must_use]
    pub fn compare(&self, a: &GenomicInterval, b: &GenomicInterval) -> Ordering {
        self.sort_key(a)
            .cmp(&self.sort_key(b))
            .then_with(|| a.contig.cmp(&b.contig))
    }

    /// Check an interval against the table: known contig, `start < end`,
    /// `end <= contig length`.
    ///
    /// # Errors
    ///
    /// Returns the first violated `IntervalError`.
    pub fn validate(&self, interval: &GenomicInterval) -> Result<(), IntervalError> {
        if interval.start >= interval.end {
            return Err(IntervalError::Inverted {
                start: interval.start,
                end: interval.end,
            });
        }
        let length = self
            .length(&interval.contig)
            .ok_or_else(|| IntervalError::UnknownContig(interval.contig.clone()))?;
        if interval.end > length {
            return Err(IntervalError::OutOfBounds {
                end: interval.end,
                length,
            });
        }
        Ok(())
    }
}
