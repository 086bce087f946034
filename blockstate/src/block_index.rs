//! Block-pair index: `(r, s) -> handle` of the aggregate edge record.
//!
//! Undirected pairs are canonicalised to `(min, max)` so both orders hit
//! the same record. Absent pairs have zero weight.

use crate::options::IndexBackend;
use crate::Block;
use fnv::FnvHashMap as HashMap;

/// Handle of an aggregate block-pair record
pub type BlockEdge = usize;

/// Hash or dense lookup from block pair to [`BlockEdge`]
#[derive(Debug, Clone)]
pub enum BlockPairIndex {
    /// Sparse map over non-empty pairs
    Hash {
        /// Directed pairs are kept ordered
        directed: bool,
        /// Canonical pair -> handle
        map: HashMap<(Block, Block), BlockEdge>,
    },
    /// Row-major `num_blocks x num_blocks` table
    Dense {
        /// Directed pairs are kept ordered
        directed: bool,
        /// Side length of the table
        num_blocks: usize,
        /// `table[r * num_blocks + s]`
        table: Vec<Option<BlockEdge>>,
    },
}

impl BlockPairIndex {
    /// Empty index over `num_blocks` blocks
    pub fn new(backend: IndexBackend, num_blocks: usize, directed: bool) -> Self {
        match backend {
            IndexBackend::Hash => BlockPairIndex::Hash {
                directed,
                map: HashMap::default(),
            },
            IndexBackend::Dense => BlockPairIndex::Dense {
                directed,
                num_blocks,
                table: vec![None; num_blocks * num_blocks],
            },
        }
    }

    #[inline]
    fn canonical(directed: bool, r: Block, s: Block) -> (Block, Block) {
        if directed || r <= s {
            (r, s)
        } else {
            (s, r)
        }
    }

    /// Handle for `(r, s)`, if that pair currently has a record
    #[inline]
    pub fn get(&self, r: Block, s: Block) -> Option<BlockEdge> {
        match self {
            BlockPairIndex::Hash { directed, map } => {
                map.get(&Self::canonical(*directed, r, s)).copied()
            }
            BlockPairIndex::Dense {
                directed,
                num_blocks,
                table,
            } => {
                let (r, s) = Self::canonical(*directed, r, s);
                table[r * num_blocks + s]
            }
        }
    }

    /// Register `me` as the record of `(r, s)`
    #[inline]
    pub fn insert(&mut self, r: Block, s: Block, me: BlockEdge) {
        match self {
            BlockPairIndex::Hash { directed, map } => {
                map.insert(Self::canonical(*directed, r, s), me);
            }
            BlockPairIndex::Dense {
                directed,
                num_blocks,
                table,
            } => {
                let (r, s) = Self::canonical(*directed, r, s);
                table[r * *num_blocks + s] = Some(me);
            }
        }
    }

    /// Forget the record of `(r, s)` and return its handle
    #[inline]
    pub fn remove(&mut self, r: Block, s: Block) -> Option<BlockEdge> {
        match self {
            BlockPairIndex::Hash { directed, map } => map.remove(&Self::canonical(*directed, r, s)),
            BlockPairIndex::Dense {
                directed,
                num_blocks,
                table,
            } => {
                let (r, s) = Self::canonical(*directed, r, s);
                table[r * *num_blocks + s].take()
            }
        }
    }

    /// Make room for one more block id
    pub fn add_block(&mut self) {
        if let BlockPairIndex::Dense {
            num_blocks, table, ..
        } = self
        {
            let old = *num_blocks;
            let new = old + 1;
            let mut grown = vec![None; new * new];
            for r in 0..old {
                grown[r * new..r * new + old].copy_from_slice(&table[r * old..(r + 1) * old]);
            }
            *table = grown;
            *num_blocks = new;
        }
    }

    /// Number of registered pairs
    pub fn len(&self) -> usize {
        match self {
            BlockPairIndex::Hash { map, .. } => map.len(),
            BlockPairIndex::Dense { table, .. } => table.iter().filter(|x| x.is_some()).count(),
        }
    }

    /// True when no pair is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
