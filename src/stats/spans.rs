use serde::{Deserialize, Serialize};

use crate::config::{check_histogram_edges, ConfigError};
use crate::core::interval::GenomicInterval;

#[allow(clippy::cast_precision_loss)]
fn to_f64(value: u64) -> f64 {
    value as f64
}

/// Summary of a span distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanStats {
    pub count: usize,
    /// Sum of all spans (bp)
    pub total: u64,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    /// Sample standard deviation; 0.0 for a single value
    pub std: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
}

impl SpanStats {
    /// Stats over raw span lengths, `None` when there are none
    #[must_use]
    pub fn from_lengths(lengths: impl IntoIterator<Item = u64>) -> Option<Self> {
        let mut sorted: Vec<u64> = lengths.into_iter().collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_unstable();

        let count = sorted.len();
        let total: u64 = sorted.iter().sum();
        #[allow(clippy::cast_precision_loss)]
        let n = count as f64;
        let mean = to_f64(total) / n;
        let std = if count > 1 {
            let sum_sq: f64 = sorted.iter().map(|&v| (to_f64(v) - mean).powi(2)).sum();
            (sum_sq / (n - 1.0)).sqrt()
        } else {
            0.0
        };

        Some(Self {
            count,
            total,
            min: sorted[0],
            max: sorted[count - 1],
            mean,
            std,
            q25: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
        })
    }

    #[must_use]
    pub fn from_intervals<'a>(intervals: impl IntoIterator<Item = &'a GenomicInterval>) -> Option<Self> {
        Self::from_lengths(intervals.into_iter().map(GenomicInterval::len))
    }
}

/// Linear interpolation between closest ranks over a sorted, non-empty slice
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn quantile(sorted: &[u64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    to_f64(sorted[lower]) + (to_f64(sorted[upper]) - to_f64(sorted[lower])) * weight
}

/// Fixed-bucket span histogram.
///
/// Bucket `i` counts values in `[edges[i], edges[i + 1])`, except that the last
/// bucket also takes values equal to the last edge. Values outside the edges go
/// to `underflow` or `overflow`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Histogram {
    edges: Vec<u64>,
    counts: Vec<usize>,
    underflow: usize,
    overflow: usize,
}

impl Histogram {
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidHistogramEdges` unless there are at least
    /// two strictly increasing edges.
    pub fn new(edges: Vec<u64>) -> Result<Self, ConfigError> {
        check_histogram_edges(&edges)?;
        let counts = vec![0; edges.len() - 1];
        Ok(Self {
            edges,
            counts,
            underflow: 0,
            overflow: 0,
        })
    }

    pub fn add(&mut self, value: u64) {
        let first = self.edges[0];
        let last = self.edges[self.edges.len() - 1];
        if value < first {
            self.underflow += 1;
        } else if value > last {
            self.overflow += 1;
        } else if value == last {
            let idx = self.counts.len() - 1;
            self.counts[idx] += 1;
        } else {
            let idx = self.edges.partition_point(|&edge| edge <= value) - 1;
            self.counts[idx] += 1;
        }
    }

    pub fn extend(&mut self, values: impl IntoIterator<Item = u64>) {
        for value in values {
            self.add(value);
        }
    }

    #[must_use]
    pub fn edges(&self) -> &[u64] {
        &self.edges
    }

    #[must_use]
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    #[must_use]
    pub fn underflow(&self) -> usize {
        self.underflow
    }

    #[must_use]
    pub fn overflow(&self) -> usize {
        self.overflow
    }

    /// `(low, high, count)` per bucket
    pub fn buckets(&self) -> impl Iterator<Item = (u64, u64, usize)> + '_ {
        self.edges
            .windows(2)
            .zip(&self.counts)
            .map(|(pair, &count)| (pair[0], pair[1], count))
    }

    /// All values seen, including underflow and overflow
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().sum::<usize>() + self.underflow + self.overflow
    }
}
