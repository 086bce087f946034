//! Block-pair weight deltas caused by a pending single-vertex move.
//!
//! Every entry touches the source or the destination block, so a move of
//! a vertex with `k` incident edges produces at most `2k` entries. The set
//! is shared by the virtual-move evaluator and the proposal probability,
//! which guarantees both see the same post-move picture.

use crate::Block;
use fnv::FnvHashMap as HashMap;

/// Sparse `(r, s) -> delta` map with insertion order
#[derive(Debug, Clone, Default)]
pub struct EntrySet {
    directed: bool,
    pos: HashMap<(Block, Block), usize>,
    entries: Vec<(Block, Block, i64)>,
}

impl EntrySet {
    /// Empty set for a directed or undirected graph
    pub fn new(directed: bool) -> Self {
        EntrySet {
            directed,
            pos: HashMap::default(),
            entries: Vec::new(),
        }
    }

    #[inline]
    fn key(&self, r: Block, s: Block) -> (Block, Block) {
        if self.directed || r <= s {
            (r, s)
        } else {
            (s, r)
        }
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.pos.clear();
        self.entries.clear();
    }

    /// Accumulate `delta` on `(r, s)`
    #[inline]
    pub fn insert_delta(&mut self, r: Block, s: Block, delta: i64) {
        let (r, s) = self.key(r, s);
        let n = self.entries.len();
        let i = *self.pos.entry((r, s)).or_insert(n);
        if i == n {
            self.entries.push((r, s, 0));
        }
        self.entries[i].2 += delta;
    }

    /// Accumulated delta on `(r, s)`; zero when untouched
    #[inline]
    pub fn get_delta(&self, r: Block, s: Block) -> i64 {
        self.pos
            .get(&self.key(r, s))
            .map_or(0, |&i| self.entries[i].2)
    }

    /// Entries as `(r, s, delta)`, canonical order for undirected pairs
    pub fn iter(&self) -> impl Iterator<Item = (Block, Block, i64)> + '_ {
        self.entries.iter().copied()
    }

    /// Number of touched pairs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is touched
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
