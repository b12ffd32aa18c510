use std::collections::{BTreeMap, HashMap};

use rust_lapper::{Interval, Lapper};

use crate::core::interval::GenomicInterval;

/// An interval stored in an [`IntervalSet`] together with its payload
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<T> {
    pub start: u64,
    pub end: u64,
    pub value: T,
    /// Insertion order, used as the final tie-break in sorted output
    order: usize,
}

impl<T> Entry<T> {
    #[must_use]
    pub fn order(&self) -> usize {
        self.order
    }
}

/// Incremental build phase of one contig: O(log n) insertion into an ordered
/// map keyed by (start, end, insertion order).
#[derive(Debug)]
pub struct ContigIntervalsBuilder<T> {
    tree: BTreeMap<(u64, u64, usize), T>,
}

impl<T> ContigIntervalsBuilder<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: BTreeMap::new(),
        }
    }

    /// Callers validate `start < end`
    pub fn insert(&mut self, start: u64, end: u64, value: T) {
        let order = self.tree.len();
        self.tree.insert((start, end, order), value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Freeze into a query-only partition
    #[must_use]
    pub fn build(self) -> ContigIntervals<T> {
        let entries: Vec<Entry<T>> = self
            .tree
            .into_iter()
            .map(|((start, end, order), value)| Entry {
                start,
                end,
                value,
                order,
            })
            .collect();

        // the lapper payload is the entry's rank in canonical order
        let lapper = Lapper::new(
            entries
                .iter()
                .enumerate()
                .map(|(rank, e)| Interval {
                    start: e.start,
                    stop: e.end,
                    val: rank,
                })
                .collect(),
        );

        ContigIntervals { entries, lapper }
    }
}

impl<T> Default for ContigIntervalsBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Frozen intervals of a single contig, queried through a [`Lapper`].
#[derive(Debug, Clone)]
pub struct ContigIntervals<T> {
    entries: Vec<Entry<T>>,
    lapper: Lapper<u64, usize>,
}

impl<T> ContigIntervals<T> {
    /// Entries overlapping `[start, end)`, in (start, end, insertion) order
    #[must_use]
    pub fn find(&self, start: u64, end: u64) -> Vec<&Entry<T>> {
        let mut ranks: Vec<usize> = self.lapper.find(start, end).map(|iv| iv.val).collect();
        ranks.sort_unstable();
        ranks.into_iter().map(|rank| &self.entries[rank]).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read-only intervals partitioned by contig.
///
/// Queries only ever consult the partition of the query's contig, so intervals
/// on different contigs can never be reported as overlapping.
#[derive(Debug, Clone)]
pub struct IntervalSet<T> {
    contigs: HashMap<String, ContigIntervals<T>>,
}

impl<T> IntervalSet<T> {
    /// Assemble a set from independently built contig partitions
    #[must_use]
    pub fn from_contigs(contigs: HashMap<String, ContigIntervals<T>>) -> Self {
        Self { contigs }
    }

    /// All entries overlapping `query`
    #[must_use]
    pub fn find(&self, query: &GenomicInterval) -> Vec<&Entry<T>> {
        self.contigs
            .get(&query.contig)
            .map(|c| c.find(query.start, query.end))
            .unwrap_or_default()
    }

    /// Total number of stored intervals
    #[must_use]
    pub fn len(&self) -> usize {
        self.contigs.values().map(ContigIntervals::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(intervals: &[(&str, u64, u64)]) -> IntervalSet<usize> {
        let mut builders: HashMap<String, ContigIntervalsBuilder<usize>> = HashMap::new();
        for (i, (contig, start, end)) in intervals.iter().enumerate() {
            builders
                .entry((*contig).to_string())
                .or_default()
                .insert(*start, *end, i);
        }
        IntervalSet::from_contigs(
            builders
                .into_iter()
                .map(|(contig, builder)| (contig, builder.build()))
                .collect(),
        )
    }

    fn values(set: &IntervalSet<usize>, contig: &str, start: u64, end: u64) -> Vec<usize> {
        set.find(&GenomicInterval::new(contig, start, end))
            .into_iter()
            .map(|e| e.value)
            .collect()
    }

    #[test]
    fn test_find_overlaps() {
        let set = build(&[
            ("chr1", 1000, 2000),
            ("chr1", 1500, 2500),
            ("chr1", 5000, 6000),
        ]);
        assert_eq!(values(&set, "chr1", 1800, 2200), vec![0, 1]);
        assert_eq!(values(&set, "chr1", 2600, 4000), Vec::<usize>::new());
        assert_eq!(values(&set, "chr1", 0, 10_000), vec![0, 1, 2]);
    }

    #[test]
    fn test_no_cross_contig_hits() {
        let set = build(&[("chr1", 100, 200), ("chr2", 100, 200)]);
        assert_eq!(values(&set, "chr2", 150, 160), vec![1]);
        assert_eq!(values(&set, "chr3", 150, 160), Vec::<usize>::new());
    }

    #[test]
    fn test_half_open_boundaries() {
        let set = build(&[("chr1", 100, 200)]);
        assert!(values(&set, "chr1", 200, 300).is_empty());
        assert!(values(&set, "chr1", 50, 100).is_empty());
        assert_eq!(values(&set, "chr1", 199, 200), vec![0]);
    }

    #[test]
    fn test_long_interval_found_from_far_query() {
        // A long interval starting well before many short ones must still be found
        let mut intervals = vec![("chr1", 0, 100_000)];
        for i in 0..100u64 {
            intervals.push(("chr1", 50_000 + i * 10, 50_000 + i * 10 + 5));
        }
        let set = build(&intervals);
        let hits = values(&set, "chr1", 90_000, 90_001);
        assert_eq!(hits, vec![0]);
    }

    #[test]
    fn test_sorted_by_start_then_insertion() {
        let set = build(&[
            ("chr1", 300, 400),
            ("chr1", 100, 400),
            ("chr1", 100, 400),
            ("chr1", 100, 200),
        ]);
        assert_eq!(values(&set, "chr1", 150, 350), vec![3, 1, 2, 0]);
    }

    #[test]
    fn test_builder_records_insertion_order() {
        let mut builder = ContigIntervalsBuilder::new();
        builder.insert(50, 60, 'b');
        builder.insert(10, 20, 'a');
        builder.insert(10, 20, 'c');
        assert_eq!(builder.len(), 3);

        let contig = builder.build();
        let found: Vec<(char, usize)> = contig
            .find(0, 100)
            .into_iter()
            .map(|e| (e.value, e.order()))
            .collect();
        assert_eq!(found, vec![('a', 1), ('c', 2), ('b', 0)]);
    }

    #[test]
    fn test_len() {
        let set = build(&[("chr1", 0, 10), ("chr1", 5, 15), ("chr2", 0, 10)]);
        assert_eq!(set.len(), 3);
        assert_eq!(values(&set, "chr1", 8, 9).len(), 2);
        assert!(build(&[]).is_empty());
    }
}
