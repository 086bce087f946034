//! Incremental block state for stochastic block model (SBM) inference.
//!
//! Keeps a partition of graph vertices into blocks together with the
//! aggregate statistics needed to score it: edge weight between every pair
//! of blocks, per-block in/out degree sums and per-block vertex weight.
//! All of it is updated in O(degree) when a vertex moves, so an MCMC driver
//! can ask three questions cheaply:
//!
//! * what would the description length change by if `v` moved to `nr`
//!   ([`BlockState::virtual_move`]),
//! * which block should `v` try next ([`BlockState::sample_block`]),
//! * how likely was that proposal, forward and backward
//!   ([`BlockState::get_move_prob`]).
//!
//! # Entropy
//!
//! ```text
//! S = sum_{rs} eterm(r, s, m_rs) + sum_r vterm(m_r+, m_r-, w_r)
//!     [+ degree entropy] [+ parallel edge entropy]
//!     [+ partition DL] [+ degree DL] [+ edges DL]
//! ```
//!
//! The driver loop, the acceptance decision and the graph storage itself
//! live outside this crate. The graph is reached through [`BlockGraph`].

#![deny(missing_docs)]
#![deny(warnings)]

/// Error type for recoverable failures
pub mod error;

/// Graph abstraction and an adjacency-list multigraph
pub mod graph;

/// Construction options and entropy flags
pub mod options;

/// Log-gamma, binomials and per-term entropy formulas
pub mod util;

/// Block-pair lookup (hash or dense matrix)
pub mod block_index;

/// Block-pair edge weights and per-block degree/weight sums
pub mod aggregates;

/// Block-pair weight deltas for a pending move
pub mod entry_set;

/// Per-vertex degree lists
pub mod degs;

/// Description-length bookkeeping per constraint label
pub mod partition_stats;

/// Neighbour and edge-group samplers for proposals
pub mod sampler;

/// The block state and its mutation engine
pub mod state;

/// Entropy and virtual-move evaluation
pub mod virtual_move;

/// Block proposals and their probabilities
pub mod proposal;

#[cfg(test)]
mod test;

pub use error::{BlockStateError, Result};
pub use graph::{BlockGraph, Edge, MergeableGraph, Multigraph, WeightMap};
pub use options::{BlockStateOptions, DegreeCacheKind, DegreeDlKind, EntropyArgs, IndexBackend};
pub use state::BlockState;

/// Vertex id in the underlying graph
pub type Vertex = usize;

/// Block (group) id
pub type Block = usize;

/// Stable edge id in the underlying graph
pub type EdgeId = usize;
