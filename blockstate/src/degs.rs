//! Per-vertex degree lists used by the degree-corrected terms.
//!
//! A vertex normally carries one `(kin, kout)` pair with multiplicity equal
//! to its weight. After merges a vertex stands for several original
//! vertices, and the explicit cache keeps one entry per distinct pair.
//! Undirected degrees are stored as `(0, k)`.

use crate::graph::BlockGraph;
use crate::options::DegreeCacheKind;
use crate::util::lgamma;
use crate::Vertex;
use fnv::FnvHashMap as HashMap;

/// How much of a vertex's degree enters degree entropy and degree DL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegreeMask {
    /// In- and out-degree both count
    #[default]
    Counted,
    /// The vertex contributes no degree terms
    Ignored,
    /// Only the in-degree counts; out-degree is taken as zero
    InOnly,
}

/// `count` vertices with in-degree `kin` and out-degree `kout`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DegreeEntry {
    /// Weighted in-degree
    pub kin: i64,
    /// Weighted out-degree
    pub kout: i64,
    /// Multiplicity
    pub count: i64,
}

/// Weighted `(kin, kout)` of `v`; `(0, k)` for undirected graphs
pub fn weighted_degrees<G: BlockGraph>(g: &G, v: Vertex) -> (i64, i64) {
    let kout: i64 = g.out_edges(v).map(|e| g.edge_weight(e.id)).sum();
    if g.is_directed() {
        let kin: i64 = g.in_edges(v).map(|e| g.edge_weight(e.id)).sum();
        (kin, kout)
    } else {
        (0, kout)
    }
}

/// Apply a mask to a degree list
pub fn masked(entries: Vec<DegreeEntry>, mask: DegreeMask) -> Vec<DegreeEntry> {
    match mask {
        DegreeMask::Counted => entries,
        DegreeMask::Ignored => Vec::new(),
        DegreeMask::InOnly => entries
            .into_iter()
            .map(|d| DegreeEntry { kout: 0, ..d })
            .collect(),
    }
}

/// `-sum count * (lgamma(kin + 1) + lgamma(kout + 1))`
pub fn degree_entropy(entries: &[DegreeEntry]) -> f64 {
    entries
        .iter()
        .map(|d| {
            -(d.count as f64) * (lgamma(d.kin as f64 + 1.0) + lgamma(d.kout as f64 + 1.0))
        })
        .sum()
}

/// Degree source: the graph itself, or an explicit per-vertex list
#[derive(Debug, Clone)]
pub enum DegreeCache {
    /// Read from the graph
    Simple,
    /// Explicit list per vertex
    Explicit(Vec<Vec<DegreeEntry>>),
}

impl DegreeCache {
    /// Cache of the requested kind, seeded from the graph
    pub fn new<G: BlockGraph>(kind: DegreeCacheKind, g: &G) -> Self {
        match kind {
            DegreeCacheKind::Simple => DegreeCache::Simple,
            DegreeCacheKind::Explicit => DegreeCache::Explicit(
                (0..g.num_vertices())
                    .map(|v| Self::from_graph(g, v))
                    .collect(),
            ),
        }
    }

    fn from_graph<G: BlockGraph>(g: &G, v: Vertex) -> Vec<DegreeEntry> {
        let count = g.vertex_weight(v);
        if count == 0 {
            return Vec::new();
        }
        let (kin, kout) = weighted_degrees(g, v);
        vec![DegreeEntry { kin, kout, count }]
    }

    /// Degree list of `v`, before masking
    pub fn entries<G: BlockGraph>(&self, g: &G, v: Vertex) -> Vec<DegreeEntry> {
        match self {
            DegreeCache::Simple => Self::from_graph(g, v),
            DegreeCache::Explicit(degs) => degs[v].clone(),
        }
    }

    /// Fold `u`'s list into `v`'s, leaving `u` empty
    pub fn merge(&mut self, u: Vertex, v: Vertex) {
        let DegreeCache::Explicit(degs) = self else {
            return;
        };
        let mut hist: HashMap<(i64, i64), i64> = HashMap::default();
        let du = std::mem::take(&mut degs[u]);
        let dv = std::mem::take(&mut degs[v]);
        for d in du.into_iter().chain(dv) {
            *hist.entry((d.kin, d.kout)).or_insert(0) += d.count;
        }
        let mut merged: Vec<DegreeEntry> = hist
            .into_iter()
            .map(|((kin, kout), count)| DegreeEntry { kin, kout, count })
            .collect();
        merged.sort_unstable_by_key(|d| (d.kin, d.kout));
        degs[v] = merged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Multigraph;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_weighted_degrees() {
        let g = Multigraph::from_edges(3, false, &[(0, 1), (0, 0), (0, 2)])
            .with_edge_weights(vec![2, 1, 1]);
        // self-loop counts twice
        assert_eq!(weighted_degrees(&g, 0), (0, 5));

        let d = Multigraph::from_edges(3, true, &[(0, 1), (2, 0), (0, 0)]);
        assert_eq!(weighted_degrees(&d, 0), (2, 2));
    }

    #[test]
    fn test_merge_explicit() {
        let g = Multigraph::from_edges(3, true, &[(0, 1), (1, 2), (2, 0)]);
        let mut cache = DegreeCache::new(DegreeCacheKind::Explicit, &g);
        cache.merge(0, 1);
        assert!(cache.entries(&g, 0).is_empty());
        assert_eq!(
            cache.entries(&g, 1),
            vec![DegreeEntry {
                kin: 1,
                kout: 1,
                count: 2
            }]
        );
    }

    #[test]
    fn test_mask_and_entropy() {
        let e = vec![DegreeEntry {
            kin: 2,
            kout: 3,
            count: 2,
        }];
        let expected = -2.0 * (lgamma(3.0) + lgamma(4.0));
        assert_abs_diff_eq!(degree_entropy(&e), expected, epsilon = 1e-12);
        assert!(masked(e.clone(), DegreeMask::Ignored).is_empty());
        assert_eq!(masked(e, DegreeMask::InOnly)[0].kout, 0);
    }
}
