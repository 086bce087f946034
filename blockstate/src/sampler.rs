//! Samplers behind block proposals.
//!
//! * [`NeighbourSampler`]: static, per vertex; draws a neighbour with
//!   probability proportional to edge weight in O(1) (alias table).
//! * [`EdgeGroups`]: dynamic, per block; draws an edge endpoint incident on
//!   the block with probability proportional to edge weight. Entries are
//!   inserted and removed as vertices join and leave blocks.

use crate::graph::BlockGraph;
use crate::{Block, Vertex};
use rand::Rng;
use rand_distr::weighted::{WeightedAliasIndex, WeightedTreeIndex};
use rand_distr::Distribution;

/// Weighted neighbour list of one vertex
#[derive(Clone)]
pub struct NeighbourSampler {
    neighbours: Vec<Vertex>,
    alias: WeightedAliasIndex<f64>,
}

impl NeighbourSampler {
    /// Sampler over the neighbours of `v`; `None` if `v` has no
    /// positive-weight edge
    pub fn build<G: BlockGraph>(g: &G, v: Vertex) -> Option<Self> {
        let mut neighbours = Vec::new();
        let mut weights = Vec::new();
        let mut push = |u: Vertex, w: i64| {
            if w > 0 {
                neighbours.push(u);
                weights.push(w as f64);
            }
        };
        for e in g.out_edges(v) {
            push(e.target, g.edge_weight(e.id));
        }
        for e in g.in_edges(v) {
            push(e.source, g.edge_weight(e.id));
        }
        if neighbours.is_empty() {
            return None;
        }
        let alias = WeightedAliasIndex::new(weights).ok()?;
        Some(NeighbourSampler { neighbours, alias })
    }

    /// Draw a neighbour
    #[inline]
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vertex {
        self.neighbours[self.alias.sample(rng)]
    }

    /// Number of (vertex, edge) entries
    pub fn len(&self) -> usize {
        self.neighbours.len()
    }

    /// True when there is nothing to sample
    pub fn is_empty(&self) -> bool {
        self.neighbours.is_empty()
    }
}

#[derive(Clone)]
struct EdgeGroup {
    tree: WeightedTreeIndex<f64>,
    far: Vec<Vertex>,
    free: Vec<usize>,
}

impl EdgeGroup {
    fn new() -> Self {
        EdgeGroup {
            tree: WeightedTreeIndex::new(std::iter::empty::<f64>())
                .unwrap_or_else(|_| panic!("empty weighted tree")),
            far: Vec::new(),
            free: Vec::new(),
        }
    }

    fn insert(&mut self, far: Vertex, w: f64) -> usize {
        match self.free.pop() {
            Some(slot) => {
                self.far[slot] = far;
                self.update(slot, w);
                slot
            }
            None => {
                self.far.push(far);
                if self.tree.push(w).is_err() {
                    panic!("invalid edge weight {}", w);
                }
                self.far.len() - 1
            }
        }
    }

    fn remove(&mut self, slot: usize) {
        self.update(slot, 0.0);
        self.free.push(slot);
    }

    fn update(&mut self, slot: usize, w: f64) {
        if self.tree.update(slot, w).is_err() {
            panic!("invalid edge weight {}", w);
        }
    }
}

/// Per-block weighted edge-endpoint groups
#[derive(Clone)]
pub struct EdgeGroups {
    groups: Vec<EdgeGroup>,
    slots: Vec<Vec<(Block, usize)>>,
}

impl EdgeGroups {
    /// Groups over `num_blocks` blocks holding every `(vertex, block)` of
    /// `members`
    pub fn new<G: BlockGraph>(
        g: &G,
        num_blocks: usize,
        members: impl IntoIterator<Item = (Vertex, Block)>,
    ) -> Self {
        let mut egroups = EdgeGroups {
            groups: (0..num_blocks).map(|_| EdgeGroup::new()).collect(),
            slots: vec![Vec::new(); g.num_vertices()],
        };
        for (v, r) in members {
            egroups.add_vertex(g, v, r);
        }
        egroups
    }

    /// Extend by one empty block
    pub fn add_block(&mut self) {
        self.groups.push(EdgeGroup::new());
    }

    /// Insert every edge of `v` into the group of block `r`
    pub fn add_vertex<G: BlockGraph>(&mut self, g: &G, v: Vertex, r: Block) {
        let group = &mut self.groups[r];
        let slots = &mut self.slots[v];
        for e in g.out_edges(v).chain(g.in_edges(v)) {
            let w = g.edge_weight(e.id);
            if w <= 0 {
                continue;
            }
            slots.push((r, group.insert(e.other(v), w as f64)));
        }
    }

    /// Drop every entry contributed by `v`
    pub fn remove_vertex(&mut self, v: Vertex) {
        for (r, slot) in self.slots[v].drain(..) {
            self.groups[r].remove(slot);
        }
    }

    /// Far endpoint of a random edge incident on block `t`
    pub fn sample<R: Rng + ?Sized>(&self, t: Block, rng: &mut R) -> Option<Vertex> {
        let group = &self.groups[t];
        group.tree.try_sample(rng).ok().map(|slot| group.far[slot])
    }
}
