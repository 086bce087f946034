//! Construction options and the entropy flags shared by full and
//! incremental evaluation.

/// Storage for the block-pair lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexBackend {
    /// Hash map keyed by block pair; memory grows with the number of
    /// non-empty block pairs
    #[default]
    Hash,
    /// B x B table; branch-free lookups, memory grows with B^2
    Dense,
}

/// How per-vertex degrees are remembered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegreeCacheKind {
    /// Read degrees from the graph on demand
    #[default]
    Simple,
    /// Keep an explicit (in, out, count) list per vertex, so merged
    /// vertices keep the degree sequence of their constituents
    Explicit,
}

/// Prior used for the degree-sequence description length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegreeDlKind {
    /// Degree sums first, then the degree histogram, then the sequence
    #[default]
    Distributed,
    /// Degree sums only; every sequence with those sums equally likely
    Uniform,
    /// Empirical entropy of the degree histogram
    Entropy,
}

/// Options for [`crate::BlockState::new`]
#[derive(Debug, Clone)]
pub struct BlockStateOptions {
    /// Use the degree-corrected model. Default: true
    pub deg_corr: bool,
    /// Block-pair index storage. Default: Hash
    pub index_backend: IndexBackend,
    /// Degree cache kind. Default: Simple
    pub degree_cache: DegreeCacheKind,
}

impl Default for BlockStateOptions {
    fn default() -> Self {
        BlockStateOptions {
            deg_corr: true,
            index_backend: IndexBackend::Hash,
            degree_cache: DegreeCacheKind::Simple,
        }
    }
}

/// Terms making up the objective.
///
/// The same flags drive [`crate::BlockState::entropy`] and
/// [`crate::BlockState::virtual_move`], so a committed move changes the
/// former by exactly what the latter predicted.
#[derive(Debug, Clone)]
pub struct EntropyArgs {
    /// Dense (Bernoulli / multigraph) edge model instead of the sparse
    /// Poisson one. Not available with degree correction. Default: false
    pub dense: bool,
    /// Multigraph ensemble: parallel-edge entropy (sparse) and
    /// multiset counting (dense). Default: true
    pub multigraph: bool,
    /// Per-vertex degree entropy (degree-corrected sparse only). Default: true
    pub deg_entropy: bool,
    /// Partition description length. Default: false
    pub partition_dl: bool,
    /// Degree-sequence description length (degree-corrected only). Default: false
    pub degree_dl: bool,
    /// Prior for the degree-sequence description length. Default: Distributed
    pub degree_dl_kind: DegreeDlKind,
    /// Edge-count description length. Default: false
    pub edges_dl: bool,
}

impl Default for EntropyArgs {
    fn default() -> Self {
        EntropyArgs {
            dense: false,
            multigraph: true,
            deg_entropy: true,
            partition_dl: false,
            degree_dl: false,
            degree_dl_kind: DegreeDlKind::Distributed,
            edges_dl: false,
        }
    }
}

impl EntropyArgs {
    /// Sparse objective with every description-length term switched on
    pub fn full_dl() -> Self {
        EntropyArgs {
            partition_dl: true,
            degree_dl: true,
            edges_dl: true,
            ..EntropyArgs::default()
        }
    }

    /// Whether any term needs partition statistics
    pub fn needs_partition_stats(&self) -> bool {
        self.partition_dl || self.degree_dl || self.edges_dl
    }
}
