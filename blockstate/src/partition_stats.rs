//! Description-length terms of the partition, kept per constraint label.
//!
//! # Partition DL (per label segment with `N` vertices in `B` blocks)
//!
//! ```text
//! lbinom(B + N - 1, N) + lgamma(N + 1) - sum_r lgamma(n_r + 1)
//! ```
//!
//! # Degree DL (per block with `n` vertices, degree sums `e+`, `e-` and
//! degree histogram `n_k`)
//!
//! ```text
//! distributed: lbinom(n + e+ - 1, e+) + lbinom(n + e- - 1, e-)
//!              + lgamma(n + 1) - sum_k lgamma(n_k + 1)
//! uniform:     lbinom(n + e+ - 1, e+) + lbinom(n + e- - 1, e-)
//! entropy:     xlogx(n) - sum_k xlogx(n_k)
//! ```
//!
//! # Edges DL (global, `E` total edge weight over `B` non-empty blocks)
//!
//! ```text
//! lbinom(x(B) + E - 1, E),  x(B) = B^2 (directed), B(B+1)/2 (undirected)
//! ```
//!
//! Every `get_delta_*` is a closed-form update touching only the source
//! and destination blocks.

use crate::degs::DegreeEntry;
use crate::options::DegreeDlKind;
use crate::util::{lbinom, lgamma, xlogx};
use crate::Block;
use fnv::FnvHashMap as HashMap;

/// Counts of one constraint label
#[derive(Debug, Clone)]
struct Segment {
    n: i64,
    actual_b: usize,
    total: Vec<i64>,
    ep: Vec<i64>,
    em: Vec<i64>,
    hist: Vec<HashMap<(i64, i64), i64>>,
}

impl Segment {
    fn new(num_blocks: usize) -> Self {
        Segment {
            n: 0,
            actual_b: 0,
            total: vec![0; num_blocks],
            ep: vec![0; num_blocks],
            em: vec![0; num_blocks],
            hist: vec![HashMap::default(); num_blocks],
        }
    }

    fn add_block(&mut self) {
        self.total.push(0);
        self.ep.push(0);
        self.em.push(0);
        self.hist.push(HashMap::default());
    }

    fn partition_dl(&self) -> f64 {
        let n = self.n as f64;
        let mut dl = lbinom(self.actual_b as f64 + n - 1.0, n) + lgamma(n + 1.0);
        for &nr in &self.total {
            dl -= lgamma(nr as f64 + 1.0);
        }
        dl
    }

    fn delta_b(&self, r: Block, nr: Block, w: i64) -> i64 {
        let mut db = 0;
        if self.total[r] == w {
            db -= 1;
        }
        if self.total[nr] == 0 {
            db += 1;
        }
        db
    }

    fn deg_dl(&self, kind: DegreeDlKind) -> f64 {
        let mut dl = 0.0;
        for r in 0..self.total.len() {
            dl += block_base(kind, self.total[r], self.ep[r], self.em[r]);
            for &c in self.hist[r].values() {
                dl += hist_term(kind, c);
            }
        }
        dl
    }

    /// Degree DL change of block `r` when `sign * w` weight and the given
    /// degree entries enter (`sign = 1`) or leave (`sign = -1`) it
    fn block_deg_delta(
        &self,
        kind: DegreeDlKind,
        r: Block,
        w: i64,
        degs: &[DegreeEntry],
        sign: i64,
    ) -> f64 {
        let (mut dep, mut dem) = (0, 0);
        let mut delta = 0.0;
        for d in degs {
            dep += d.kout * d.count;
            dem += d.kin * d.count;
            let c = self.hist[r].get(&(d.kin, d.kout)).copied().unwrap_or(0);
            delta += hist_term(kind, c + sign * d.count) - hist_term(kind, c);
        }
        let (n, ep, em) = (self.total[r], self.ep[r], self.em[r]);
        delta += block_base(kind, n + sign * w, ep + sign * dep, em + sign * dem);
        delta -= block_base(kind, n, ep, em);
        delta
    }
}

fn block_base(kind: DegreeDlKind, n: i64, ep: i64, em: i64) -> f64 {
    let (n, ep, em) = (n as f64, ep as f64, em as f64);
    match kind {
        DegreeDlKind::Distributed => {
            lbinom(n + ep - 1.0, ep) + lbinom(n + em - 1.0, em) + lgamma(n + 1.0)
        }
        DegreeDlKind::Uniform => lbinom(n + ep - 1.0, ep) + lbinom(n + em - 1.0, em),
        DegreeDlKind::Entropy => xlogx(n),
    }
}

fn hist_term(kind: DegreeDlKind, count: i64) -> f64 {
    match kind {
        DegreeDlKind::Distributed => -lgamma(count as f64 + 1.0),
        DegreeDlKind::Uniform => 0.0,
        DegreeDlKind::Entropy => -xlogx(count as f64),
    }
}

/// Partition statistics over every constraint label
#[derive(Debug, Clone)]
pub struct PartitionStats {
    directed: bool,
    edges: i64,
    total_b: usize,
    occupancy: Vec<i64>,
    segments: Vec<Segment>,
}

impl PartitionStats {
    /// Empty statistics; vertices are added with [`PartitionStats::add_vertex`]
    pub fn new(num_labels: usize, num_blocks: usize, directed: bool, edges: i64) -> Self {
        PartitionStats {
            directed,
            edges,
            total_b: 0,
            occupancy: vec![0; num_blocks],
            segments: (0..num_labels.max(1))
                .map(|_| Segment::new(num_blocks))
                .collect(),
        }
    }

    /// Number of non-empty blocks, whatever the labels of their vertices
    pub fn total_b(&self) -> usize {
        self.total_b
    }

    /// Total edge weight
    pub fn num_edges(&self) -> i64 {
        self.edges
    }

    /// Number of label segments
    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    /// Vertex weight of block `r` within segment `label`
    pub fn block_total(&self, label: usize, r: Block) -> i64 {
        self.segments[label].total[r]
    }

    /// Extend every segment by one empty block
    pub fn add_block(&mut self) {
        self.occupancy.push(0);
        for seg in &mut self.segments {
            seg.add_block();
        }
    }

    /// Account a vertex of weight `w` entering block `r`
    pub fn add_vertex(
        &mut self,
        label: usize,
        r: Block,
        w: i64,
        degs: &[DegreeEntry],
        deg_corr: bool,
    ) {
        if w == 0 {
            return;
        }
        if self.occupancy[r] == 0 {
            self.total_b += 1;
        }
        self.occupancy[r] += w;
        let seg = &mut self.segments[label];
        if seg.total[r] == 0 {
            seg.actual_b += 1;
        }
        seg.total[r] += w;
        seg.n += w;
        if deg_corr {
            for d in degs {
                *seg.hist[r].entry((d.kin, d.kout)).or_insert(0) += d.count;
                seg.ep[r] += d.kout * d.count;
                seg.em[r] += d.kin * d.count;
            }
        }
    }

    /// Account a vertex of weight `w` leaving block `r`
    pub fn remove_vertex(
        &mut self,
        label: usize,
        r: Block,
        w: i64,
        degs: &[DegreeEntry],
        deg_corr: bool,
    ) {
        if w == 0 {
            return;
        }
        self.occupancy[r] -= w;
        assert!(self.occupancy[r] >= 0, "negative vertex count on block {}", r);
        if self.occupancy[r] == 0 {
            self.total_b -= 1;
        }
        let seg = &mut self.segments[label];
        seg.total[r] -= w;
        seg.n -= w;
        assert!(seg.total[r] >= 0, "negative vertex count on block {}", r);
        if seg.total[r] == 0 {
            seg.actual_b -= 1;
        }
        if deg_corr {
            for d in degs {
                let key = (d.kin, d.kout);
                let c = seg.hist[r].entry(key).or_insert(0);
                *c -= d.count;
                assert!(*c >= 0, "negative degree count on block {}", r);
                if *c == 0 {
                    seg.hist[r].remove(&key);
                }
                seg.ep[r] -= d.kout * d.count;
                seg.em[r] -= d.kin * d.count;
            }
        }
    }

    /// Partition DL change of moving weight `w` from `r` to `nr`
    pub fn get_delta_dl(&self, label: usize, r: Block, nr: Block, w: i64) -> f64 {
        if r == nr || w == 0 {
            return 0.0;
        }
        let seg = &self.segments[label];
        let (tr, tnr) = (seg.total[r] as f64, seg.total[nr] as f64);
        let wf = w as f64;
        let mut s_b = -lgamma(tr + 1.0) - lgamma(tnr + 1.0);
        let mut s_a = -lgamma(tr - wf + 1.0) - lgamma(tnr + wf + 1.0);

        let db = seg.delta_b(r, nr, w);
        if db != 0 {
            let n = seg.n as f64;
            let b = seg.actual_b as f64;
            s_b += lbinom(b + n - 1.0, n);
            s_a += lbinom(b + db as f64 + n - 1.0, n);
        }
        s_a - s_b
    }

    /// Degree DL change of moving a vertex with degree list `degs`
    pub fn get_delta_deg_dl(
        &self,
        label: usize,
        r: Block,
        nr: Block,
        w: i64,
        degs: &[DegreeEntry],
        kind: DegreeDlKind,
    ) -> f64 {
        if r == nr || w == 0 {
            return 0.0;
        }
        let seg = &self.segments[label];
        seg.block_deg_delta(kind, r, w, degs, -1) + seg.block_deg_delta(kind, nr, w, degs, 1)
    }

    fn edge_slots(&self, b: usize) -> f64 {
        let b = b as f64;
        if self.directed {
            b * b
        } else {
            (b * (b + 1.0)) / 2.0
        }
    }

    /// Edges DL change of moving weight `w` from `r` to `nr`
    pub fn get_delta_edges_dl(&self, r: Block, nr: Block, w: i64) -> f64 {
        if r == nr || w == 0 {
            return 0.0;
        }
        let mut db = 0_i64;
        if self.occupancy[r] == w {
            db -= 1;
        }
        if self.occupancy[nr] == 0 {
            db += 1;
        }
        if db == 0 {
            return 0.0;
        }
        let e = self.edges as f64;
        let before = self.edge_slots(self.total_b);
        let after = self.edge_slots((self.total_b as i64 + db) as usize);
        lbinom(after + e - 1.0, e) - lbinom(before + e - 1.0, e)
    }

    /// Partition DL summed over segments
    pub fn get_partition_dl(&self) -> f64 {
        self.segments.iter().map(Segment::partition_dl).sum()
    }

    /// Degree DL summed over segments
    pub fn get_deg_dl(&self, kind: DegreeDlKind) -> f64 {
        self.segments.iter().map(|seg| seg.deg_dl(kind)).sum()
    }

    /// Edges DL
    pub fn get_edges_dl(&self) -> f64 {
        let e = self.edges as f64;
        lbinom(self.edge_slots(self.total_b) + e - 1.0, e)
    }
}
