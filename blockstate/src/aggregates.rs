//! Aggregate statistics of a partition.
//!
//! * `mrs(r, s)`: edge weight between blocks `r` and `s`
//! * `mrp(r)`: out-degree sum of block `r` (total degree when undirected)
//! * `mrm(r)`: in-degree sum of block `r` (same as `mrp` when undirected)
//! * `wr(r)`: vertex weight of block `r`
//!
//! For undirected graphs an edge inside a block adds its weight once to
//! `mrs(r, r)` and twice to `mrp(r)`. A block-pair record is dropped from
//! the index as soon as its weight returns to zero.

use crate::block_index::{BlockEdge, BlockPairIndex};
use crate::options::IndexBackend;
use crate::Block;

/// Aggregate edge weight between two blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPairRecord {
    /// Source block (smaller id when undirected)
    pub source: Block,
    /// Target block
    pub target: Block,
    /// Total edge weight
    pub weight: i64,
}

/// Block-pair weights plus per-block degree and vertex-weight sums
#[derive(Debug, Clone)]
pub struct Aggregates {
    directed: bool,
    index: BlockPairIndex,
    records: Vec<Option<BlockPairRecord>>,
    free: Vec<BlockEdge>,
    mrp: Vec<i64>,
    mrm: Vec<i64>,
    wr: Vec<i64>,
}

/// Order-independent copy of every aggregate, for comparisons
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateSnapshot {
    /// `(r, s, weight)` for every non-empty pair, sorted
    pub mrs: Vec<(Block, Block, i64)>,
    /// Out-degree sums
    pub mrp: Vec<i64>,
    /// In-degree sums
    pub mrm: Vec<i64>,
    /// Vertex weights
    pub wr: Vec<i64>,
}

impl Aggregates {
    /// All-zero aggregates over `num_blocks` blocks
    pub fn new(num_blocks: usize, directed: bool, backend: IndexBackend) -> Self {
        Aggregates {
            directed,
            index: BlockPairIndex::new(backend, num_blocks, directed),
            records: Vec::new(),
            free: Vec::new(),
            mrp: vec![0; num_blocks],
            mrm: if directed { vec![0; num_blocks] } else { Vec::new() },
            wr: vec![0; num_blocks],
        }
    }

    /// Number of blocks
    pub fn num_blocks(&self) -> usize {
        self.wr.len()
    }

    /// Append an empty block and return its id
    pub fn add_block(&mut self) -> Block {
        let r = self.wr.len();
        self.index.add_block();
        self.mrp.push(0);
        if self.directed {
            self.mrm.push(0);
        }
        self.wr.push(0);
        r
    }

    /// Handle of `(r, s)` if the pair has weight
    #[inline]
    pub fn get_me(&self, r: Block, s: Block) -> Option<BlockEdge> {
        self.index.get(r, s)
    }

    /// Handle of `(r, s)`, creating a zero-weight record if needed
    pub fn get_or_create(&mut self, r: Block, s: Block) -> BlockEdge {
        if let Some(me) = self.index.get(r, s) {
            return me;
        }
        let (source, target) = if self.directed || r <= s { (r, s) } else { (s, r) };
        let record = BlockPairRecord {
            source,
            target,
            weight: 0,
        };
        let me = match self.free.pop() {
            Some(me) => {
                self.records[me] = Some(record);
                me
            }
            None => {
                self.records.push(Some(record));
                self.records.len() - 1
            }
        };
        self.index.insert(r, s, me);
        me
    }

    #[inline]
    fn record(&self, me: BlockEdge) -> &BlockPairRecord {
        self.records[me]
            .as_ref()
            .unwrap_or_else(|| panic!("block edge {} was already removed", me))
    }

    /// Weight of a live record
    #[inline]
    pub fn weight_of(&self, me: BlockEdge) -> i64 {
        self.record(me).weight
    }

    /// Weight between `r` and `s` (zero when absent)
    #[inline]
    pub fn get_mrs(&self, r: Block, s: Block) -> i64 {
        self.index.get(r, s).map_or(0, |me| self.weight_of(me))
    }

    /// Add `w` to a record
    #[inline]
    pub fn add_weight(&mut self, me: BlockEdge, w: i64) {
        if let Some(rec) = self.records[me].as_mut() {
            rec.weight += w;
        } else {
            panic!("block edge {} was already removed", me);
        }
    }

    /// Subtract `w` from a record, dropping it once it reaches zero
    #[inline]
    pub fn remove_weight(&mut self, me: BlockEdge, w: i64) {
        let rec = match self.records[me].as_mut() {
            Some(rec) => rec,
            None => panic!("block edge {} was already removed", me),
        };
        rec.weight -= w;
        assert!(
            rec.weight >= 0,
            "negative weight {} on block pair ({}, {})",
            rec.weight,
            rec.source,
            rec.target
        );
        if rec.weight == 0 {
            let (r, s) = (rec.source, rec.target);
            self.records[me] = None;
            self.index.remove(r, s);
            self.free.push(me);
        }
    }

    /// Out-degree sum of `r`
    #[inline]
    pub fn mrp(&self, r: Block) -> i64 {
        self.mrp[r]
    }

    /// In-degree sum of `r`
    #[inline]
    pub fn mrm(&self, r: Block) -> i64 {
        if self.directed {
            self.mrm[r]
        } else {
            self.mrp[r]
        }
    }

    /// Vertex weight of `r`
    #[inline]
    pub fn wr(&self, r: Block) -> i64 {
        self.wr[r]
    }

    /// Add `w` (possibly negative) to the out-degree sum of `r`
    #[inline]
    pub fn shift_mrp(&mut self, r: Block, w: i64) {
        self.mrp[r] += w;
        assert!(self.mrp[r] >= 0, "negative out-degree sum on block {}", r);
    }

    /// Add `w` (possibly negative) to the in-degree sum of `r`
    #[inline]
    pub fn shift_mrm(&mut self, r: Block, w: i64) {
        let m = if self.directed {
            &mut self.mrm[r]
        } else {
            &mut self.mrp[r]
        };
        *m += w;
        assert!(*m >= 0, "negative in-degree sum on block {}", r);
    }

    /// Add `w` (possibly negative) to the vertex weight of `r`
    #[inline]
    pub fn shift_wr(&mut self, r: Block, w: i64) {
        self.wr[r] += w;
        assert!(self.wr[r] >= 0, "negative vertex weight on block {}", r);
    }

    /// Every live record
    pub fn block_edges(&self) -> impl Iterator<Item = &BlockPairRecord> + '_ {
        self.records.iter().flatten()
    }

    /// Number of live block-pair records
    pub fn num_block_edges(&self) -> usize {
        self.records.len() - self.free.len()
    }

    /// Number of blocks with positive vertex weight
    pub fn num_nonempty_blocks(&self) -> usize {
        self.wr.iter().filter(|&&w| w > 0).count()
    }

    /// Comparable copy of every aggregate
    pub fn snapshot(&self) -> AggregateSnapshot {
        let mut mrs: Vec<_> = self
            .block_edges()
            .map(|rec| (rec.source, rec.target, rec.weight))
            .collect();
        mrs.sort_unstable();
        AggregateSnapshot {
            mrs,
            mrp: self.mrp.clone(),
            mrm: (0..self.num_blocks()).map(|r| self.mrm(r)).collect(),
            wr: self.wr.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_removed_at_zero() {
        for backend in [IndexBackend::Hash, IndexBackend::Dense] {
            let mut agg = Aggregates::new(2, false, backend);
            let me = agg.get_or_create(1, 0);
            agg.add_weight(me, 3);
            assert_eq!(agg.get_mrs(0, 1), 3);
            assert_eq!(agg.get_me(0, 1), Some(me));

            agg.remove_weight(me, 3);
            assert_eq!(agg.get_me(0, 1), None);
            assert_eq!(agg.get_mrs(1, 0), 0);
            assert_eq!(agg.num_block_edges(), 0);

            // freed slot gets reused
            let me2 = agg.get_or_create(1, 1);
            assert_eq!(me2, me);
        }
    }

    #[test]
    #[should_panic(expected = "negative weight")]
    fn test_negative_weight_panics() {
        let mut agg = Aggregates::new(2, true, IndexBackend::Hash);
        let me = agg.get_or_create(0, 1);
        agg.add_weight(me, 1);
        agg.remove_weight(me, 2);
    }

    #[test]
    fn test_undirected_mrm_is_mrp() {
        let mut agg = Aggregates::new(2, false, IndexBackend::Hash);
        agg.shift_mrp(0, 2);
        agg.shift_mrm(0, 3);
        assert_eq!(agg.mrp(0), 5);
        assert_eq!(agg.mrm(0), 5);
        let r = agg.add_block();
        assert_eq!(r, 2);
        assert_eq!(agg.mrm(2), 0);
    }
}
