//! Block state: partition, aggregates and the vertex mutation engine.
//!
//! Vertices move one at a time (`move_vertex`), in batches
//! (`add_vertices` / `remove_vertices`, which account edges internal to
//! the batch exactly once) or merge into each other (`merge_vertices`).
//! Each mutation keeps the aggregates, the block-pair index, the per-edge
//! block-edge cache, the edge groups and, when enabled, the partition
//! statistics in step.
//!
//! A removed vertex is detached: it keeps its last block id in
//! [`BlockState::partition`] but contributes to nothing until re-added.

use crate::aggregates::{AggregateSnapshot, Aggregates, BlockPairRecord};
use crate::block_index::BlockEdge;
use crate::degs::{masked, DegreeCache, DegreeEntry, DegreeMask};
use crate::entry_set::EntrySet;
use crate::error::{BlockStateError, Result};
use crate::graph::{BlockGraph, Edge, MergeableGraph};
use crate::options::{BlockStateOptions, IndexBackend};
use crate::partition_stats::PartitionStats;
use crate::sampler::{EdgeGroups, NeighbourSampler};
use crate::{Block, EdgeId, Vertex};
use fnv::{FnvHashMap as HashMap, FnvHashSet as HashSet};
use log::{debug, info};

/// Partition of a graph's vertices into blocks, with incremental statistics.
///
/// `G` is usually `&Graph` (cloneable, one graph shared by many chains) or
/// `&mut Graph` (needed by [`BlockState::merge_vertices`]). The graph must
/// not be modified by anyone else while the state is alive.
#[derive(Clone)]
pub struct BlockState<G: BlockGraph> {
    pub(crate) g: G,
    pub(crate) b: Vec<Block>,
    pub(crate) attached: Vec<bool>,
    pub(crate) agg: Aggregates,
    pub(crate) bedge: Vec<Option<BlockEdge>>,
    pub(crate) deg_corr: bool,
    pub(crate) backend: IndexBackend,
    pub(crate) bclabel: Vec<i64>,
    pub(crate) pclabel: Vec<usize>,
    pub(crate) degree_mask: Vec<DegreeMask>,
    pub(crate) degs: DegreeCache,
    pub(crate) merge_map: Vec<Vertex>,
    pub(crate) egroups: Option<EdgeGroups>,
    pub(crate) neighbour_sampler: Vec<Option<NeighbourSampler>>,
    pub(crate) partition_stats: Option<PartitionStats>,
    pub(crate) m_entries: EntrySet,
}

/// Add edge weight `w` from block `r` to block `s`
#[inline]
fn attach_edge(agg: &mut Aggregates, r: Block, s: Block, w: i64) -> BlockEdge {
    let me = agg.get_or_create(r, s);
    agg.add_weight(me, w);
    agg.shift_mrp(r, w);
    agg.shift_mrm(s, w);
    me
}

/// Subtract edge weight `w` from block `r` to block `s`
#[inline]
fn detach_edge(agg: &mut Aggregates, me: BlockEdge, r: Block, s: Block, w: i64) {
    agg.remove_weight(me, w);
    agg.shift_mrp(r, -w);
    agg.shift_mrm(s, -w);
}

#[inline]
fn cached(bedge: &[Option<BlockEdge>], e: EdgeId) -> BlockEdge {
    match bedge.get(e).copied().flatten() {
        Some(me) => me,
        None => panic!("edge {} has no cached block edge", e),
    }
}

/// Aggregates and edge cache of partition `b` over the attached vertices
fn build_aggregates<G: BlockGraph>(
    g: &G,
    b: &[Block],
    attached: &[bool],
    num_blocks: usize,
    backend: IndexBackend,
) -> (Aggregates, Vec<Option<BlockEdge>>) {
    let mut agg = Aggregates::new(num_blocks, g.is_directed(), backend);
    let mut bedge = vec![None; g.edge_bound()];
    for (v, &r) in b.iter().enumerate() {
        if attached[v] {
            agg.shift_wr(r, g.vertex_weight(v));
        }
    }
    for e in g.edges() {
        let w = g.edge_weight(e.id);
        if w == 0 || !attached[e.source] || !attached[e.target] {
            continue;
        }
        bedge[e.id] = Some(attach_edge(&mut agg, b[e.source], b[e.target], w));
    }
    (agg, bedge)
}

/// Distinct edges grouped by `(far endpoint, label)`, in first-seen order
fn group_edges<G: BlockGraph>(
    g: &G,
    edges: impl Iterator<Item = Edge>,
    far: impl Fn(&Edge) -> Vertex,
) -> Vec<((Vertex, i64), Vec<EdgeId>)> {
    let mut seen: HashSet<EdgeId> = HashSet::default();
    let mut pos: HashMap<(Vertex, i64), usize> = HashMap::default();
    let mut groups: Vec<((Vertex, i64), Vec<EdgeId>)> = Vec::new();
    for e in edges {
        if !seen.insert(e.id) {
            continue;
        }
        let key = (far(&e), g.edge_label(e.id));
        let n = groups.len();
        let i = *pos.entry(key).or_insert(n);
        if i == n {
            groups.push((key, Vec::new()));
        }
        groups[i].1.push(e.id);
    }
    groups
}

impl<G: BlockGraph> BlockState<G> {
    /// Build the state of partition `b` over `num_blocks` blocks.
    ///
    /// * `g` - Graph (borrowed)
    /// * `b` - Block of every vertex, each in `0..num_blocks`
    /// * `num_blocks` - Number of blocks B, empty ones included
    /// * `options` - Model and storage options
    pub fn new(
        g: G,
        b: Vec<Block>,
        num_blocks: usize,
        options: &BlockStateOptions,
    ) -> Result<Self> {
        let n = g.num_vertices();
        if b.len() != n {
            return Err(BlockStateError::SizeMismatch {
                vertices: n,
                blocks: b.len(),
            });
        }
        if let Some(&r) = b.iter().find(|&&r| r >= num_blocks) {
            return Err(BlockStateError::InvalidBlock {
                block: r,
                num_blocks,
            });
        }

        let attached = vec![true; n];
        let (agg, bedge) = build_aggregates(&g, &b, &attached, num_blocks, options.index_backend);
        let neighbour_sampler = (0..n).map(|v| NeighbourSampler::build(&g, v)).collect();
        let degs = DegreeCache::new(options.degree_cache, &g);
        let directed = g.is_directed();

        info!(
            "BlockState: n={}, B={}, directed={}, deg_corr={}, block pairs={}, index={:?}",
            n,
            num_blocks,
            directed,
            options.deg_corr,
            agg.num_block_edges(),
            options.index_backend
        );

        Ok(BlockState {
            g,
            b,
            attached,
            agg,
            bedge,
            deg_corr: options.deg_corr,
            backend: options.index_backend,
            bclabel: vec![0; num_blocks],
            pclabel: vec![0; n],
            degree_mask: vec![DegreeMask::Counted; n],
            degs,
            merge_map: (0..n).collect(),
            egroups: None,
            neighbour_sampler,
            partition_stats: None,
            m_entries: EntrySet::new(directed),
        })
    }

    /// Attach constraint labels.
    ///
    /// * `bclabel` - Label per block; moves between differently labelled
    ///   blocks are forbidden
    /// * `pclabel` - Label per vertex; partition statistics are kept
    ///   separately for each label
    pub fn with_constraints(mut self, bclabel: Vec<i64>, pclabel: Vec<usize>) -> Result<Self> {
        if bclabel.len() != self.num_blocks() {
            return Err(BlockStateError::SizeMismatch {
                vertices: self.num_blocks(),
                blocks: bclabel.len(),
            });
        }
        if pclabel.len() != self.num_vertices() {
            return Err(BlockStateError::SizeMismatch {
                vertices: self.num_vertices(),
                blocks: pclabel.len(),
            });
        }
        self.bclabel = bclabel;
        self.pclabel = pclabel;
        self.rebuild_partition_stats();
        Ok(self)
    }

    /// Attach per-vertex degree masks
    pub fn with_degree_mask(mut self, mask: Vec<DegreeMask>) -> Result<Self> {
        if mask.len() != self.num_vertices() {
            return Err(BlockStateError::SizeMismatch {
                vertices: self.num_vertices(),
                blocks: mask.len(),
            });
        }
        self.degree_mask = mask;
        self.rebuild_partition_stats();
        Ok(self)
    }

    /// Underlying graph
    pub fn graph(&self) -> &G {
        &self.g
    }

    /// Whether the graph is directed
    pub fn is_directed(&self) -> bool {
        self.g.is_directed()
    }

    /// Whether the model is degree corrected
    pub fn is_degree_corrected(&self) -> bool {
        self.deg_corr
    }

    /// Number of vertices
    pub fn num_vertices(&self) -> usize {
        self.b.len()
    }

    /// Number of blocks B, empty ones included
    pub fn num_blocks(&self) -> usize {
        self.agg.num_blocks()
    }

    /// Number of blocks with positive vertex weight
    pub fn num_nonempty_blocks(&self) -> usize {
        self.agg.num_nonempty_blocks()
    }

    /// Block of `v`
    #[inline]
    pub fn block_of(&self, v: Vertex) -> Block {
        self.b[v]
    }

    /// Block of every vertex
    pub fn partition(&self) -> &[Block] {
        &self.b
    }

    /// Edge weight between blocks `r` and `s`
    #[inline]
    pub fn mrs(&self, r: Block, s: Block) -> i64 {
        self.agg.get_mrs(r, s)
    }

    /// Out-degree sum of `r` (total degree when undirected)
    #[inline]
    pub fn mrp(&self, r: Block) -> i64 {
        self.agg.mrp(r)
    }

    /// In-degree sum of `r` (same as `mrp` when undirected)
    #[inline]
    pub fn mrm(&self, r: Block) -> i64 {
        self.agg.mrm(r)
    }

    /// Vertex weight of `r`
    #[inline]
    pub fn wr(&self, r: Block) -> i64 {
        self.agg.wr(r)
    }

    /// Every non-empty block pair
    pub fn block_edges(&self) -> impl Iterator<Item = &BlockPairRecord> + '_ {
        self.agg.block_edges()
    }

    /// Read access to every aggregate
    pub fn aggregates(&self) -> &Aggregates {
        &self.agg
    }

    /// Comparable copy of every aggregate
    pub fn snapshot(&self) -> AggregateSnapshot {
        self.agg.snapshot()
    }

    /// Block constraint label of `r`
    pub fn bclabel(&self, r: Block) -> i64 {
        self.bclabel[r]
    }

    /// Partition-statistics label of `v`
    pub fn pclabel(&self, v: Vertex) -> usize {
        self.pclabel[v]
    }

    /// `merge_map[u] = v` once `u` was merged into `v`; identity otherwise
    pub fn merge_map(&self) -> &[Vertex] {
        &self.merge_map
    }

    /// Weight of `v`'s block without `v`
    pub fn virtual_remove_size(&self, v: Vertex) -> i64 {
        self.agg.wr(self.b[v]) - self.g.vertex_weight(v)
    }

    /// Whether `v` is the only weight in its block
    pub fn is_last(&self, v: Vertex) -> bool {
        self.agg.wr(self.b[v]) == self.g.vertex_weight(v)
    }

    /// Vertex weight of `v`
    pub fn node_weight(&self, v: Vertex) -> i64 {
        self.g.vertex_weight(v)
    }

    /// Append an empty block with constraint label `label`
    pub fn add_block(&mut self, label: i64) -> Block {
        let r = self.agg.add_block();
        self.bclabel.push(label);
        if let Some(eg) = self.egroups.as_mut() {
            eg.add_block();
        }
        if let Some(ps) = self.partition_stats.as_mut() {
            ps.add_block();
        }
        debug!("add_block: r={}, label={}", r, label);
        r
    }

    /// Whether `v` currently belongs to a block
    pub fn is_attached(&self, v: Vertex) -> bool {
        self.attached[v]
    }

    pub(crate) fn check_attached(&self, v: Vertex) -> Result<()> {
        if !self.attached[v] {
            return Err(BlockStateError::VertexDetached { vertex: v });
        }
        Ok(())
    }

    pub(crate) fn check_block(&self, r: Block) -> Result<()> {
        if r >= self.num_blocks() {
            return Err(BlockStateError::InvalidBlock {
                block: r,
                num_blocks: self.num_blocks(),
            });
        }
        Ok(())
    }

    /// Degree list of `v` after masking
    pub(crate) fn masked_degrees(&self, v: Vertex) -> Vec<DegreeEntry> {
        masked(self.degs.entries(&self.g, v), self.degree_mask[v])
    }

    /// Weighted `(kin, kout)` of `v`; `kin == kout` when undirected
    pub(crate) fn move_degrees(&self, v: Vertex) -> (i64, i64) {
        let kout: i64 = self.g.out_edges(v).map(|e| self.g.edge_weight(e.id)).sum();
        let kin = if self.g.is_directed() {
            self.g.in_edges(v).map(|e| self.g.edge_weight(e.id)).sum()
        } else {
            kout
        };
        (kin, kout)
    }

    fn update_partition_stats(&mut self, v: Vertex, r: Block, add: bool) {
        if self.partition_stats.is_none() {
            return;
        }
        let label = self.pclabel[v];
        let w = self.g.vertex_weight(v);
        let degs = if self.deg_corr {
            self.masked_degrees(v)
        } else {
            Vec::new()
        };
        if let Some(ps) = self.partition_stats.as_mut() {
            if add {
                ps.add_vertex(label, r, w, &degs, self.deg_corr);
            } else {
                ps.remove_vertex(label, r, w, &degs, self.deg_corr);
            }
        }
    }

    fn remove_vertex_filtered(&mut self, v: Vertex, skip: impl Fn(EdgeId) -> bool) {
        let r = self.b[v];
        let directed = self.g.is_directed();
        let BlockState {
            g,
            b,
            agg,
            bedge,
            attached,
            ..
        } = self;

        // edges to detached vertices are already out of the aggregates
        let mut self_weight = 0;
        for e in g.out_edges(v) {
            if skip(e.id) || !attached[e.target] {
                continue;
            }
            let w = g.edge_weight(e.id);
            if w == 0 {
                continue;
            }
            if e.target == v && !directed {
                self_weight += w;
                continue;
            }
            detach_edge(agg, cached(bedge, e.id), r, b[e.target], w);
        }

        if self_weight > 0 {
            assert!(self_weight % 2 == 0, "odd self-loop weight on vertex {}", v);
            let me = match agg.get_me(r, r) {
                Some(me) => me,
                None => panic!("block {} has self-loop weight but no record", r),
            };
            detach_edge(agg, me, r, r, self_weight / 2);
        }

        for e in g.in_edges(v) {
            if skip(e.id) || e.source == v || !attached[e.source] {
                continue;
            }
            let w = g.edge_weight(e.id);
            if w == 0 {
                continue;
            }
            detach_edge(agg, cached(bedge, e.id), b[e.source], r, w);
        }

        agg.shift_wr(r, -g.vertex_weight(v));
        attached[v] = false;

        if let Some(eg) = self.egroups.as_mut() {
            eg.remove_vertex(v);
        }
        self.update_partition_stats(v, r, false);
    }

    fn add_vertex_filtered(&mut self, v: Vertex, r: Block, skip: impl Fn(EdgeId) -> bool) {
        let directed = self.g.is_directed();
        let BlockState {
            g,
            b,
            agg,
            bedge,
            attached,
            ..
        } = self;

        // edges to detached vertices join when their far end is re-added
        let mut self_weight = 0;
        for e in g.out_edges(v) {
            if skip(e.id) || (e.target != v && !attached[e.target]) {
                continue;
            }
            let w = g.edge_weight(e.id);
            if w == 0 {
                continue;
            }
            if e.target == v {
                if directed {
                    bedge[e.id] = Some(attach_edge(agg, r, r, w));
                } else {
                    bedge[e.id] = Some(agg.get_or_create(r, r));
                    self_weight += w;
                }
                continue;
            }
            bedge[e.id] = Some(attach_edge(agg, r, b[e.target], w));
        }

        if self_weight > 0 {
            assert!(self_weight % 2 == 0, "odd self-loop weight on vertex {}", v);
            attach_edge(agg, r, r, self_weight / 2);
        }

        for e in g.in_edges(v) {
            if skip(e.id) || e.source == v || !attached[e.source] {
                continue;
            }
            let w = g.edge_weight(e.id);
            if w == 0 {
                continue;
            }
            bedge[e.id] = Some(attach_edge(agg, b[e.source], r, w));
        }

        agg.shift_wr(r, g.vertex_weight(v));
        b[v] = r;
        attached[v] = true;

        if let Some(eg) = self.egroups.as_mut() {
            eg.add_vertex(&self.g, v, r);
        }
        self.update_partition_stats(v, r, true);
    }

    /// Detach `v` from its block; fails if it is already detached
    pub fn remove_vertex(&mut self, v: Vertex) -> Result<()> {
        self.check_attached(v)?;
        self.remove_vertex_filtered(v, |_| false);
        Ok(())
    }

    /// Attach a detached `v` to block `r`
    pub fn add_vertex(&mut self, v: Vertex, r: Block) -> Result<()> {
        self.check_block(r)?;
        if self.attached[v] {
            return Err(BlockStateError::VertexAttached { vertex: v });
        }
        self.add_vertex_filtered(v, r, |_| false);
        Ok(())
    }

    /// Move `v` to block `nr`.
    ///
    /// No-op when `v` is already there; fails when the two blocks carry
    /// different constraint labels.
    pub fn move_vertex(&mut self, v: Vertex, nr: Block) -> Result<()> {
        self.check_block(nr)?;
        self.check_attached(v)?;
        let r = self.b[v];
        if r == nr {
            return Ok(());
        }
        if self.bclabel[r] != self.bclabel[nr] {
            return Err(BlockStateError::CrossLabelMove {
                vertex: v,
                from: r,
                to: nr,
            });
        }
        self.remove_vertex_filtered(v, |_| false);
        self.add_vertex_filtered(v, nr, |_| false);
        Ok(())
    }

    /// Move `vs[i]` to `nrs[i]` in order
    pub fn move_vertices(&mut self, vs: &[Vertex], nrs: &[Block]) -> Result<()> {
        if vs.len() != nrs.len() {
            return Err(BlockStateError::SizeMismatch {
                vertices: vs.len(),
                blocks: nrs.len(),
            });
        }
        for (&v, &nr) in vs.iter().zip(nrs) {
            self.move_vertex(v, nr)?;
        }
        Ok(())
    }

    /// Move every vertex to `b[v]`
    pub fn set_partition(&mut self, b: &[Block]) -> Result<()> {
        if b.len() != self.num_vertices() {
            return Err(BlockStateError::SizeMismatch {
                vertices: self.num_vertices(),
                blocks: b.len(),
            });
        }
        for (v, &r) in b.iter().enumerate() {
            self.move_vertex(v, r)?;
        }
        Ok(())
    }

    /// Distinct vertices of `vs` in first-seen order, and the edges with
    /// both endpoints among them
    fn internal_edges(&self, vs: &[Vertex]) -> (Vec<Vertex>, HashSet<EdgeId>, Vec<EdgeId>) {
        let mut vset: HashSet<Vertex> = HashSet::default();
        let order: Vec<Vertex> = vs.iter().copied().filter(|&v| vset.insert(v)).collect();

        let mut eset: HashSet<EdgeId> = HashSet::default();
        let mut internal = Vec::new();
        for &v in &order {
            for e in self.g.incident_edges(v) {
                if vset.contains(&e.other(v)) && eset.insert(e.id) {
                    internal.push(e.id);
                }
            }
        }
        (order, eset, internal)
    }

    /// Detach every vertex of `vs`; edges inside the set are removed once.
    ///
    /// Nothing changes if any of them is already detached.
    pub fn remove_vertices(&mut self, vs: &[Vertex]) -> Result<()> {
        for &v in vs {
            self.check_attached(v)?;
        }
        let (order, eset, internal) = self.internal_edges(vs);
        for &v in &order {
            self.remove_vertex_filtered(v, |e| eset.contains(&e));
        }
        for e in internal {
            let w = self.g.edge_weight(e);
            if w == 0 {
                continue;
            }
            let (s, t) = self.g.endpoints(e);
            let me = cached(&self.bedge, e);
            detach_edge(&mut self.agg, me, self.b[s], self.b[t], w);
        }
        Ok(())
    }

    /// Attach `vs[i]` to `rs[i]`; edges inside the set are added once
    pub fn add_vertices(&mut self, vs: &[Vertex], rs: &[Block]) -> Result<()> {
        if vs.len() != rs.len() {
            return Err(BlockStateError::SizeMismatch {
                vertices: vs.len(),
                blocks: rs.len(),
            });
        }
        for &r in rs {
            self.check_block(r)?;
        }
        if let Some(&v) = vs.iter().find(|&&v| self.attached[v]) {
            return Err(BlockStateError::VertexAttached { vertex: v });
        }

        let mut target: HashMap<Vertex, Block> = HashMap::default();
        for (&v, &r) in vs.iter().zip(rs) {
            target.insert(v, r);
        }
        let (order, eset, internal) = self.internal_edges(vs);
        for &v in &order {
            self.add_vertex_filtered(v, target[&v], |e| eset.contains(&e));
        }
        for e in internal {
            let w = self.g.edge_weight(e);
            if w == 0 {
                continue;
            }
            let (s, t) = self.g.endpoints(e);
            self.bedge[e] = Some(attach_edge(&mut self.agg, self.b[s], self.b[t], w));
        }
        Ok(())
    }

    /// Build partition statistics if they are not there yet
    pub fn enable_partition_stats(&mut self) {
        if self.partition_stats.is_some() {
            return;
        }
        let edges: i64 = self.g.edges().map(|e| self.g.edge_weight(e.id)).sum();
        let num_labels = self.pclabel.iter().max().map_or(1, |&c| c + 1);
        let mut ps = PartitionStats::new(
            num_labels,
            self.num_blocks(),
            self.g.is_directed(),
            edges,
        );
        for v in (0..self.num_vertices()).filter(|&v| self.attached[v]) {
            let degs = if self.deg_corr {
                self.masked_degrees(v)
            } else {
                Vec::new()
            };
            ps.add_vertex(
                self.pclabel[v],
                self.b[v],
                self.g.vertex_weight(v),
                &degs,
                self.deg_corr,
            );
        }
        debug!(
            "partition stats enabled: E={}, B={}, labels={}",
            edges,
            ps.total_b(),
            num_labels
        );
        self.partition_stats = Some(ps);
    }

    /// Drop partition statistics
    pub fn disable_partition_stats(&mut self) {
        if self.partition_stats.take().is_some() {
            debug!("partition stats disabled");
        }
    }

    /// Whether partition statistics are being maintained
    pub fn is_partition_stats_enabled(&self) -> bool {
        self.partition_stats.is_some()
    }

    /// Current partition statistics, if enabled
    pub fn partition_stats(&self) -> Option<&PartitionStats> {
        self.partition_stats.as_ref()
    }

    fn rebuild_partition_stats(&mut self) {
        if self.partition_stats.take().is_some() {
            self.enable_partition_stats();
        }
    }

    pub(crate) fn ensure_egroups(&mut self) {
        if self.egroups.is_none() {
            debug!("edge groups initialised over {} blocks", self.num_blocks());
            let members = self
                .b
                .iter()
                .enumerate()
                .filter(|&(v, _)| self.attached[v])
                .map(|(v, &r)| (v, r));
            self.egroups = Some(EdgeGroups::new(&self.g, self.num_blocks(), members));
        }
    }

    /// Prepare for a sweep with proposal parameter `c`.
    ///
    /// Edge groups are built unless `c` is infinite (purely uniform
    /// proposals never use them); partition statistics follow `dl`.
    pub fn init_mcmc(&mut self, c: f64, dl: bool) {
        if c.is_infinite() {
            if self.egroups.take().is_some() {
                debug!("edge groups cleared");
            }
        } else {
            self.ensure_egroups();
        }
        if dl {
            self.enable_partition_stats();
        } else {
            self.disable_partition_stats();
        }
    }

    /// Recompute every aggregate from scratch and compare.
    ///
    /// Detached vertices and their edges are left out of the rebuild.
    pub fn validate_aggregates(&self) -> bool {
        let (fresh, _) = build_aggregates(
            &self.g,
            &self.b,
            &self.attached,
            self.num_blocks(),
            self.backend,
        );
        let (expected, actual) = (fresh.snapshot(), self.agg.snapshot());
        if expected != actual {
            debug!(
                "aggregate mismatch: expected {:?}, found {:?}",
                expected, actual
            );
            return false;
        }
        true
    }
}

impl<G: MergeableGraph> BlockState<G> {
    /// Absorb `u` into `v`.
    ///
    /// `u` first moves into `v`'s block, then its edges are folded onto
    /// `v`: parallel edges with the same far endpoint and label add their
    /// weight onto `v`'s edge, the rest are re-created from `v`. `u` keeps
    /// existing with zero weight and no edges. Requires explicit vertex and
    /// edge weights.
    pub fn merge_vertices(&mut self, u: Vertex, v: Vertex) -> Result<()> {
        if u == v {
            return Ok(());
        }
        if self.g.vertex_weights_are_unity() || self.g.edge_weights_are_unity() {
            return Err(BlockStateError::UnweightedMerge);
        }
        self.check_attached(u)?;
        self.check_attached(v)?;
        if self.b[u] != self.b[v] {
            self.move_vertex(u, self.b[v])?;
        }

        let mut touched: Vec<Vertex> = self.g.incident_edges(u).map(|e| e.other(u)).collect();
        touched.push(u);
        touched.push(v);

        let ns_u = group_edges(&self.g, self.g.out_edges(u), |e| e.target);
        let ns_v = group_edges(&self.g, self.g.out_edges(v), |e| e.target);
        self.fold_edges(u, v, ns_u, ns_v, false);

        if self.g.is_directed() {
            let ns_u = group_edges(&self.g, self.g.in_edges(u), |e| e.source);
            let ns_v = group_edges(&self.g, self.g.in_edges(v), |e| e.source);
            self.fold_edges(u, v, ns_u, ns_v, true);
        }

        let wu = self.g.vertex_weight(u);
        let wv = self.g.vertex_weight(v);
        self.g.set_vertex_weight(v, wv + wu);
        self.g.set_vertex_weight(u, 0);

        let detached: Vec<EdgeId> = self.g.incident_edges(u).map(|e| e.id).collect();
        for e in detached {
            self.g.set_edge_weight(e, 0);
            self.bedge[e] = None;
        }
        self.g.clear_vertex(u);
        self.merge_map[u] = v;
        self.degs.merge(u, v);

        for x in touched {
            self.neighbour_sampler[x] = NeighbourSampler::build(&self.g, x);
        }
        self.egroups = None;
        self.rebuild_partition_stats();

        debug!("merged vertex {} into {} (weight {})", u, v, wv + wu);
        Ok(())
    }

    /// Fold `u`'s grouped edges onto `v`; `incoming` selects in-edges
    fn fold_edges(
        &mut self,
        u: Vertex,
        v: Vertex,
        ns_u: Vec<((Vertex, i64), Vec<EdgeId>)>,
        ns_v: Vec<((Vertex, i64), Vec<EdgeId>)>,
        incoming: bool,
    ) {
        let mut first_v: HashMap<(Vertex, i64), EdgeId> =
            ns_v.into_iter().map(|(key, es)| (key, es[0])).collect();

        for ((t, l), es) in ns_u {
            if incoming && t == u {
                // already folded as an out-edge
                continue;
            }
            let w: i64 = es.iter().map(|&e| self.g.edge_weight(e)).sum();
            if w == 0 {
                continue;
            }
            let me = es
                .iter()
                .find(|&&e| self.g.edge_weight(e) != 0)
                .and_then(|&e| self.bedge[e]);
            let t = if t == u { v } else { t };
            match first_v.get(&(t, l)) {
                Some(&ev) => {
                    let old = self.g.edge_weight(ev);
                    self.g.set_edge_weight(ev, old + w);
                    if old == 0 {
                        self.bedge[ev] = me;
                    }
                }
                None => {
                    let ne = if incoming {
                        self.g.add_edge(t, v, w, l)
                    } else {
                        self.g.add_edge(v, t, w, l)
                    };
                    if self.bedge.len() < self.g.edge_bound() {
                        self.bedge.resize(self.g.edge_bound(), None);
                    }
                    self.bedge[ne] = me;
                    first_v.insert((t, l), ne);
                }
            }
        }
    }
}
