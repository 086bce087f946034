//! Graph access used by the block state.
//!
//! The state never owns the graph. It reads it through [`BlockGraph`] and,
//! for merges only, writes weights and edges through [`MergeableGraph`].
//! Holding `&G` lets several cloned states share one graph; holding
//! `&mut G` enables merges and makes the state non-cloneable.
//!
//! # Orientation
//!
//! For undirected graphs `out_edges(v)` yields every incident edge oriented
//! `v -> other`, listing a self-loop twice, and `in_edges(v)` is empty.
//! For directed graphs a self-loop shows up once in each direction.

use crate::{EdgeId, Vertex};

/// An oriented view of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    /// Stable edge id
    pub id: EdgeId,
    /// Tail, as seen from the traversal
    pub source: Vertex,
    /// Head, as seen from the traversal
    pub target: Vertex,
}

impl Edge {
    /// Endpoint opposite to `v`
    #[inline]
    pub fn other(&self, v: Vertex) -> Vertex {
        if self.source == v {
            self.target
        } else {
            self.source
        }
    }

    /// True for an edge `v -> v`
    #[inline]
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Read access to a (multi)graph with integer vertex/edge weights
pub trait BlockGraph {
    /// Whether edges are directed
    fn is_directed(&self) -> bool;

    /// Number of vertices; ids are `0..num_vertices()`
    fn num_vertices(&self) -> usize;

    /// Upper bound on edge ids ever handed out
    fn edge_bound(&self) -> usize;

    /// Endpoints `(source, target)` of an edge as stored
    fn endpoints(&self, e: EdgeId) -> (Vertex, Vertex);

    /// Out-edges of `v` (all incident edges when undirected)
    fn out_edges(&self, v: Vertex) -> impl Iterator<Item = Edge> + '_;

    /// In-edges of `v` (empty when undirected)
    fn in_edges(&self, v: Vertex) -> impl Iterator<Item = Edge> + '_;

    /// Every edge incident on `v`, each edge id once
    fn incident_edges(&self, v: Vertex) -> impl Iterator<Item = Edge> + '_;

    /// Every edge of the graph once, in stored orientation
    fn edges(&self) -> impl Iterator<Item = Edge> + '_;

    /// Vertex multiplicity
    fn vertex_weight(&self, v: Vertex) -> i64;

    /// Edge multiplicity
    fn edge_weight(&self, e: EdgeId) -> i64;

    /// Edge label used to keep parallel edges apart during merges
    fn edge_label(&self, e: EdgeId) -> i64;

    /// True when every vertex weight is the constant 1
    fn vertex_weights_are_unity(&self) -> bool;

    /// True when every edge weight is the constant 1
    fn edge_weights_are_unity(&self) -> bool;
}

/// Write access needed by vertex merges
pub trait MergeableGraph: BlockGraph {
    /// Overwrite a vertex weight
    fn set_vertex_weight(&mut self, v: Vertex, w: i64);

    /// Overwrite an edge weight
    fn set_edge_weight(&mut self, e: EdgeId, w: i64);

    /// Insert an edge and return its id
    fn add_edge(&mut self, source: Vertex, target: Vertex, weight: i64, label: i64) -> EdgeId;

    /// Detach every edge incident on `v`; `v` itself stays
    fn clear_vertex(&mut self, v: Vertex);
}

impl<G: BlockGraph> BlockGraph for &G {
    fn is_directed(&self) -> bool {
        (**self).is_directed()
    }
    fn num_vertices(&self) -> usize {
        (**self).num_vertices()
    }
    fn edge_bound(&self) -> usize {
        (**self).edge_bound()
    }
    fn endpoints(&self, e: EdgeId) -> (Vertex, Vertex) {
        (**self).endpoints(e)
    }
    fn out_edges(&self, v: Vertex) -> impl Iterator<Item = Edge> + '_ {
        (**self).out_edges(v)
    }
    fn in_edges(&self, v: Vertex) -> impl Iterator<Item = Edge> + '_ {
        (**self).in_edges(v)
    }
    fn incident_edges(&self, v: Vertex) -> impl Iterator<Item = Edge> + '_ {
        (**self).incident_edges(v)
    }
    fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        (**self).edges()
    }
    fn vertex_weight(&self, v: Vertex) -> i64 {
        (**self).vertex_weight(v)
    }
    fn edge_weight(&self, e: EdgeId) -> i64 {
        (**self).edge_weight(e)
    }
    fn edge_label(&self, e: EdgeId) -> i64 {
        (**self).edge_label(e)
    }
    fn vertex_weights_are_unity(&self) -> bool {
        (**self).vertex_weights_are_unity()
    }
    fn edge_weights_are_unity(&self) -> bool {
        (**self).edge_weights_are_unity()
    }
}

impl<G: BlockGraph> BlockGraph for &mut G {
    fn is_directed(&self) -> bool {
        (**self).is_directed()
    }
    fn num_vertices(&self) -> usize {
        (**self).num_vertices()
    }
    fn edge_bound(&self) -> usize {
        (**self).edge_bound()
    }
    fn endpoints(&self, e: EdgeId) -> (Vertex, Vertex) {
        (**self).endpoints(e)
    }
    fn out_edges(&self, v: Vertex) -> impl Iterator<Item = Edge> + '_ {
        (**self).out_edges(v)
    }
    fn in_edges(&self, v: Vertex) -> impl Iterator<Item = Edge> + '_ {
        (**self).in_edges(v)
    }
    fn incident_edges(&self, v: Vertex) -> impl Iterator<Item = Edge> + '_ {
        (**self).incident_edges(v)
    }
    fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        (**self).edges()
    }
    fn vertex_weight(&self, v: Vertex) -> i64 {
        (**self).vertex_weight(v)
    }
    fn edge_weight(&self, e: EdgeId) -> i64 {
        (**self).edge_weight(e)
    }
    fn edge_label(&self, e: EdgeId) -> i64 {
        (**self).edge_label(e)
    }
    fn vertex_weights_are_unity(&self) -> bool {
        (**self).vertex_weights_are_unity()
    }
    fn edge_weights_are_unity(&self) -> bool {
        (**self).edge_weights_are_unity()
    }
}

impl<G: MergeableGraph> MergeableGraph for &mut G {
    fn set_vertex_weight(&mut self, v: Vertex, w: i64) {
        (**self).set_vertex_weight(v, w)
    }
    fn set_edge_weight(&mut self, e: EdgeId, w: i64) {
        (**self).set_edge_weight(e, w)
    }
    fn add_edge(&mut self, source: Vertex, target: Vertex, weight: i64, label: i64) -> EdgeId {
        (**self).add_edge(source, target, weight, label)
    }
    fn clear_vertex(&mut self, v: Vertex) {
        (**self).clear_vertex(v)
    }
}

/// Vertex or edge weights: the constant 1, or one value per element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeightMap {
    /// Every element weighs 1
    Unity,
    /// Explicit weights indexed by element id
    Explicit(Vec<i64>),
}

impl WeightMap {
    /// Weight of element `i`
    #[inline]
    pub fn get(&self, i: usize) -> i64 {
        match self {
            WeightMap::Unity => 1,
            WeightMap::Explicit(w) => w[i],
        }
    }

    /// Whether this is the constant map
    pub fn is_unity(&self) -> bool {
        matches!(self, WeightMap::Unity)
    }

    fn set(&mut self, i: usize, w: i64) {
        match self {
            WeightMap::Unity => panic!("cannot assign weight {} to a unity weight map", w),
            WeightMap::Explicit(ws) => {
                if i >= ws.len() {
                    ws.resize(i + 1, 0);
                }
                ws[i] = w;
            }
        }
    }
}

/// Adjacency-list multigraph with optional weights and edge labels.
///
/// Edge ids are never reused; edges detached by `clear_vertex` keep their
/// id but disappear from every traversal.
#[derive(Debug, Clone)]
pub struct Multigraph {
    directed: bool,
    endpoints: Vec<(Vertex, Vertex)>,
    alive: Vec<bool>,
    out_adj: Vec<Vec<EdgeId>>,
    in_adj: Vec<Vec<EdgeId>>,
    vweight: WeightMap,
    eweight: WeightMap,
    elabel: Vec<i64>,
}

impl Multigraph {
    /// Empty graph on `n` vertices with unit weights
    pub fn new(n: usize, directed: bool) -> Self {
        Multigraph {
            directed,
            endpoints: Vec::new(),
            alive: Vec::new(),
            out_adj: vec![Vec::new(); n],
            in_adj: if directed {
                vec![Vec::new(); n]
            } else {
                Vec::new()
            },
            vweight: WeightMap::Unity,
            eweight: WeightMap::Unity,
            elabel: Vec::new(),
        }
    }

    /// Build from an edge list with unit weights
    pub fn from_edges(n: usize, directed: bool, edges: &[(Vertex, Vertex)]) -> Self {
        let mut g = Multigraph::new(n, directed);
        for &(s, t) in edges {
            g.push_edge(s, t);
        }
        g
    }

    /// Attach explicit vertex weights (one per vertex)
    pub fn with_vertex_weights(mut self, weights: Vec<i64>) -> Self {
        assert_eq!(weights.len(), self.out_adj.len(), "one weight per vertex");
        self.vweight = WeightMap::Explicit(weights);
        self
    }

    /// Attach explicit edge weights (one per edge id)
    pub fn with_edge_weights(mut self, weights: Vec<i64>) -> Self {
        assert_eq!(weights.len(), self.endpoints.len(), "one weight per edge");
        self.eweight = WeightMap::Explicit(weights);
        self
    }

    /// Attach edge labels (one per edge id)
    pub fn with_edge_labels(mut self, labels: Vec<i64>) -> Self {
        assert_eq!(labels.len(), self.endpoints.len(), "one label per edge");
        self.elabel = labels;
        self
    }

    /// Append an edge of weight 1 and label 0
    pub fn push_edge(&mut self, source: Vertex, target: Vertex) -> EdgeId {
        let e = self.endpoints.len();
        self.endpoints.push((source, target));
        self.alive.push(true);
        self.elabel.push(0);
        if let WeightMap::Explicit(ws) = &mut self.eweight {
            ws.push(1);
        }
        self.out_adj[source].push(e);
        if self.directed {
            self.in_adj[target].push(e);
        } else {
            // a self-loop is listed twice on purpose
            self.out_adj[target].push(e);
        }
        e
    }

    /// Number of live edges
    pub fn num_edges(&self) -> usize {
        self.alive.iter().filter(|&&a| a).count()
    }

    fn oriented(&self, e: EdgeId, v: Vertex) -> Edge {
        let (s, t) = self.endpoints[e];
        if self.directed || s == v {
            Edge {
                id: e,
                source: s,
                target: t,
            }
        } else {
            Edge {
                id: e,
                source: v,
                target: s,
            }
        }
    }
}

impl BlockGraph for Multigraph {
    fn is_directed(&self) -> bool {
        self.directed
    }

    fn num_vertices(&self) -> usize {
        self.out_adj.len()
    }

    fn edge_bound(&self) -> usize {
        self.endpoints.len()
    }

    fn endpoints(&self, e: EdgeId) -> (Vertex, Vertex) {
        self.endpoints[e]
    }

    fn out_edges(&self, v: Vertex) -> impl Iterator<Item = Edge> + '_ {
        self.out_adj[v].iter().map(move |&e| self.oriented(e, v))
    }

    fn in_edges(&self, v: Vertex) -> impl Iterator<Item = Edge> + '_ {
        let adj: &[EdgeId] = if self.directed { &self.in_adj[v] } else { &[] };
        adj.iter().map(move |&e| self.oriented(e, v))
    }

    fn incident_edges(&self, v: Vertex) -> impl Iterator<Item = Edge> + '_ {
        let directed = self.directed;
        let outs = self.out_adj[v]
            .iter()
            .enumerate()
            .filter(move |&(i, &e)| {
                // undirected self-loops: keep the first of the two copies
                directed || self.endpoints[e] != (v, v) || !self.out_adj[v][..i].contains(&e)
            })
            .map(move |(_, &e)| self.oriented(e, v));
        let ins = self
            .in_edges(v)
            .filter(move |e| e.source != v);
        outs.chain(ins)
    }

    fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.endpoints
            .iter()
            .enumerate()
            .filter(move |&(e, _)| self.alive[e])
            .map(|(e, &(s, t))| Edge {
                id: e,
                source: s,
                target: t,
            })
    }

    fn vertex_weight(&self, v: Vertex) -> i64 {
        self.vweight.get(v)
    }

    fn edge_weight(&self, e: EdgeId) -> i64 {
        self.eweight.get(e)
    }

    fn edge_label(&self, e: EdgeId) -> i64 {
        self.elabel[e]
    }

    fn vertex_weights_are_unity(&self) -> bool {
        self.vweight.is_unity()
    }

    fn edge_weights_are_unity(&self) -> bool {
        self.eweight.is_unity()
    }
}

impl MergeableGraph for Multigraph {
    fn set_vertex_weight(&mut self, v: Vertex, w: i64) {
        self.vweight.set(v, w);
    }

    fn set_edge_weight(&mut self, e: EdgeId, w: i64) {
        self.eweight.set(e, w);
    }

    fn add_edge(&mut self, source: Vertex, target: Vertex, weight: i64, label: i64) -> EdgeId {
        let e = self.push_edge(source, target);
        self.elabel[e] = label;
        if weight != 1 || !self.eweight.is_unity() {
            self.eweight.set(e, weight);
        }
        e
    }

    fn clear_vertex(&mut self, v: Vertex) {
        let mut detached: Vec<EdgeId> = self.out_adj[v].drain(..).collect();
        if self.directed {
            detached.append(&mut self.in_adj[v]);
        }
        for &e in &detached {
            if !self.alive[e] {
                continue;
            }
            self.alive[e] = false;
            let (s, t) = self.endpoints[e];
            let other = if s == v { t } else { s };
            if other == v {
                continue;
            }
            if self.directed {
                if s == v {
                    self.in_adj[t].retain(|&x| x != e);
                } else {
                    self.out_adj[s].retain(|&x| x != e);
                }
            } else {
                self.out_adj[other].retain(|&x| x != e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undirected_self_loop_listed_twice() {
        let g = Multigraph::from_edges(2, false, &[(0, 0), (0, 1)]);
        let outs: Vec<Edge> = g.out_edges(0).collect();
        assert_eq!(outs.len(), 3);
        assert_eq!(outs.iter().filter(|e| e.is_self_loop()).count(), 2);
        assert_eq!(g.incident_edges(0).count(), 2);
        assert_eq!(g.in_edges(0).count(), 0);
        // oriented away from the queried vertex
        let e = g.out_edges(1).next().unwrap();
        assert_eq!((e.source, e.target), (1, 0));
    }

    #[test]
    fn test_directed_incident_edges() {
        let g = Multigraph::from_edges(3, true, &[(0, 1), (2, 0), (0, 0)]);
        assert_eq!(g.out_edges(0).count(), 2);
        assert_eq!(g.in_edges(0).count(), 2);
        assert_eq!(g.incident_edges(0).count(), 3);
        assert_eq!(g.edges().count(), 3);
    }

    #[test]
    fn test_clear_vertex() {
        let mut g = Multigraph::from_edges(3, false, &[(0, 1), (1, 2), (1, 1)])
            .with_edge_weights(vec![1, 2, 2])
            .with_vertex_weights(vec![1, 1, 1]);
        g.clear_vertex(1);
        assert_eq!(g.out_edges(0).count(), 0);
        assert_eq!(g.out_edges(2).count(), 0);
        assert_eq!(g.out_edges(1).count(), 0);
        assert_eq!(g.num_edges(), 0);

        let e = g.add_edge(0, 2, 3, 7);
        assert_eq!(g.edge_weight(e), 3);
        assert_eq!(g.edge_label(e), 7);
        assert_eq!(g.edges().count(), 1);
    }
}
