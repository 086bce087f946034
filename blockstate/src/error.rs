//! Recoverable errors of the block state.
//!
//! Bookkeeping invariant violations (a negative aggregate weight, an edge
//! without a cached block edge) are not represented here: they mean the
//! graph was mutated behind the state's back and they panic.

use crate::{Block, Vertex};
use thiserror::Error;

/// Errors reported by block state operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockStateError {
    /// Source and destination blocks carry different constraint labels
    #[error("cannot move vertex {vertex} across clabel barriers ({from} -> {to})")]
    CrossLabelMove {
        /// Vertex being moved
        vertex: Vertex,
        /// Its current block
        from: Block,
        /// Requested block
        to: Block,
    },
    /// Vertex is already in a block
    #[error("vertex {vertex} is already attached to a block")]
    VertexAttached {
        /// Offending vertex
        vertex: Vertex,
    },
    /// Vertex was removed and not re-added
    #[error("vertex {vertex} is not attached to any block")]
    VertexDetached {
        /// Offending vertex
        vertex: Vertex,
    },
    /// Merging needs explicit vertex and edge weights
    #[error("cannot merge vertices of unweighted graph")]
    UnweightedMerge,
    /// Batch inputs of different lengths
    #[error("vertex and group lists do not have the same size ({vertices} != {blocks})")]
    SizeMismatch {
        /// Number of vertices supplied
        vertices: usize,
        /// Number of blocks (or labels) supplied
        blocks: usize,
    },
    /// A block id outside `0..num_blocks`
    #[error("block {block} out of range (B = {num_blocks})")]
    InvalidBlock {
        /// Offending block id
        block: Block,
        /// Current number of blocks
        num_blocks: usize,
    },
    /// Dense entropy has no degree-corrected form
    #[error("dense entropy for degree corrected model not implemented")]
    DenseDegreeCorrected,
}

impl BlockStateError {
    /// Rejected request that would violate a precondition
    pub fn is_invalid_operation(&self) -> bool {
        !self.is_unsupported_configuration()
    }

    /// Request for a model combination that has no implementation
    pub fn is_unsupported_configuration(&self) -> bool {
        matches!(self, BlockStateError::DenseDegreeCorrected)
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, BlockStateError>;
