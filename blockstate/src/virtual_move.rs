//! Entropy of the current state and the change caused by a single move.
//!
//! # Sparse
//!
//! Only the block pairs touched by `v`'s edges (the entry set) and the
//! source/destination vertex terms change, so the delta costs O(degree).
//!
//! # Dense
//!
//! The dense edge term depends on block sizes, so every pair involving the
//! source or destination block is re-evaluated: O(B). Not defined for the
//! degree-corrected model.
//!
//! Each delta equals the change of the matching full entropy after the
//! move is committed. A move to the current block is exactly 0, a move
//! across constraint labels is `+inf`.

use crate::degs::degree_entropy;
use crate::entry_set::EntrySet;
use crate::error::{BlockStateError, Result};
use crate::graph::BlockGraph;
use crate::options::{DegreeDlKind, EntropyArgs};
use crate::state::BlockState;
use crate::util::{eterm, eterm_dense, lgamma, vterm};
use crate::{Block, Vertex};
use fnv::FnvHashMap as HashMap;

impl<G: BlockGraph> BlockState<G> {
    /// Fill `entries` with the block-pair deltas of moving `v` to `nr`
    pub(crate) fn fill_move_entries(&self, v: Vertex, nr: Block, entries: &mut EntrySet) {
        entries.clear();
        let r = self.b[v];
        let directed = self.g.is_directed();

        let mut self_weight = 0;
        for e in self.g.out_edges(v) {
            let w = self.g.edge_weight(e.id);
            if w == 0 {
                continue;
            }
            if e.target == v {
                if directed {
                    entries.insert_delta(r, r, -w);
                    entries.insert_delta(nr, nr, w);
                } else {
                    self_weight += w;
                }
                continue;
            }
            let s = self.b[e.target];
            entries.insert_delta(r, s, -w);
            entries.insert_delta(nr, s, w);
        }
        if self_weight > 0 {
            entries.insert_delta(r, r, -self_weight / 2);
            entries.insert_delta(nr, nr, self_weight / 2);
        }

        for e in self.g.in_edges(v) {
            if e.source == v {
                continue;
            }
            let w = self.g.edge_weight(e.id);
            if w == 0 {
                continue;
            }
            let s = self.b[e.source];
            entries.insert_delta(s, r, -w);
            entries.insert_delta(s, nr, w);
        }
    }

    fn entries_ds(&self, entries: &EntrySet) -> f64 {
        let directed = self.g.is_directed();
        let mut ds = 0.0;
        for (r, s, d) in entries.iter() {
            if d == 0 {
                continue;
            }
            let ers = self.agg.get_mrs(r, s);
            ds += eterm(r, s, ers + d, directed) - eterm(r, s, ers, directed);
        }
        ds
    }

    fn sparse_delta(&self, v: Vertex, nr: Block, entries: &mut EntrySet) -> f64 {
        let r = self.b[v];
        if r == nr {
            return 0.0;
        }
        self.fill_move_entries(v, nr, entries);
        let (kin, kout) = self.move_degrees(v);
        let directed = self.g.is_directed();
        let dw = self.g.vertex_weight(v);
        let agg = &self.agg;

        let mut ds = self.entries_ds(entries);
        ds += vterm(
            agg.mrp(r) - kout,
            agg.mrm(r) - kin,
            agg.wr(r) - dw,
            self.deg_corr,
            directed,
        );
        ds += vterm(
            agg.mrp(nr) + kout,
            agg.mrm(nr) + kin,
            agg.wr(nr) + dw,
            self.deg_corr,
            directed,
        );
        ds -= vterm(agg.mrp(r), agg.mrm(r), agg.wr(r), self.deg_corr, directed);
        ds -= vterm(agg.mrp(nr), agg.mrm(nr), agg.wr(nr), self.deg_corr, directed);
        ds
    }

    fn dense_delta(&self, v: Vertex, nr: Block, multigraph: bool) -> Result<f64> {
        if self.deg_corr {
            return Err(BlockStateError::DenseDegreeCorrected);
        }
        let r = self.b[v];
        if r == nr {
            return Ok(0.0);
        }

        let num_blocks = self.num_blocks();
        let directed = self.g.is_directed();
        let mut deltap = vec![0_i64; num_blocks];
        let mut deltam = vec![0_i64; num_blocks];
        let mut deltal = 0_i64;
        for e in self.g.out_edges(v) {
            let w = self.g.edge_weight(e.id);
            if e.target == v {
                deltal += w;
            } else {
                deltap[self.b[e.target]] += w;
            }
        }
        if !directed {
            deltal /= 2;
        }
        for e in self.g.in_edges(v) {
            if e.source != v {
                deltam[self.b[e.source]] += self.g.edge_weight(e.id);
            }
        }

        let agg = &self.agg;
        let dw = self.g.vertex_weight(v);
        let (wr_r, wr_nr) = (agg.wr(r), agg.wr(nr));
        let term = |a: Block, c: Block, m: i64, wa: i64, wc: i64| {
            eterm_dense(a, c, m, wa, wc, multigraph, directed)
        };

        let (mut si, mut sf) = (0.0, 0.0);
        for s in 0..num_blocks {
            let ers = agg.get_mrs(r, s);
            let enrs = agg.get_mrs(nr, s);
            let wr_s = agg.wr(s);

            if !directed {
                if s != nr && s != r {
                    si += term(r, s, ers, wr_r, wr_s);
                    sf += term(r, s, ers - deltap[s], wr_r - dw, wr_s);
                    si += term(nr, s, enrs, wr_nr, wr_s);
                    sf += term(nr, s, enrs + deltap[s], wr_nr + dw, wr_s);
                }
                if s == r {
                    si += term(r, r, ers, wr_r, wr_r);
                    sf += term(r, r, ers - deltap[r] - deltal, wr_r - dw, wr_r - dw);
                }
                if s == nr {
                    si += term(nr, nr, enrs, wr_nr, wr_nr);
                    sf += term(nr, nr, enrs + deltap[nr] + deltal, wr_nr + dw, wr_nr + dw);

                    si += term(r, nr, ers, wr_r, wr_nr);
                    sf += term(r, nr, ers - deltap[nr] + deltap[r], wr_r - dw, wr_nr + dw);
                }
            } else {
                let esr = agg.get_mrs(s, r);
                let esnr = agg.get_mrs(s, nr);

                if s != nr && s != r {
                    si += term(r, s, ers, wr_r, wr_s);
                    sf += term(r, s, ers - deltap[s], wr_r - dw, wr_s);
                    si += term(s, r, esr, wr_s, wr_r);
                    sf += term(s, r, esr - deltam[s], wr_s, wr_r - dw);

                    si += term(nr, s, enrs, wr_nr, wr_s);
                    sf += term(nr, s, enrs + deltap[s], wr_nr + dw, wr_s);
                    si += term(s, nr, esnr, wr_s, wr_nr);
                    sf += term(s, nr, esnr + deltam[s], wr_s, wr_nr + dw);
                }
                if s == r {
                    si += term(r, r, ers, wr_r, wr_r);
                    sf += term(
                        r,
                        r,
                        ers - deltap[r] - deltam[r] - deltal,
                        wr_r - dw,
                        wr_r - dw,
                    );

                    si += term(r, nr, esnr, wr_r, wr_nr);
                    sf += term(r, nr, esnr - deltap[nr] + deltam[r], wr_r - dw, wr_nr + dw);
                }
                if s == nr {
                    si += term(nr, nr, esnr, wr_nr, wr_nr);
                    sf += term(
                        nr,
                        nr,
                        esnr + deltap[nr] + deltam[nr] + deltal,
                        wr_nr + dw,
                        wr_nr + dw,
                    );

                    si += term(nr, r, esr, wr_nr, wr_r);
                    sf += term(nr, r, esr + deltap[r] - deltam[nr], wr_nr + dw, wr_r - dw);
                }
            }
        }
        Ok(sf - si)
    }

    /// Sparse entropy change of moving `v` to `nr`
    pub fn virtual_move_sparse(&mut self, v: Vertex, nr: Block) -> Result<f64> {
        self.check_block(nr)?;
        self.check_attached(v)?;
        let mut entries = std::mem::take(&mut self.m_entries);
        let ds = self.sparse_delta(v, nr, &mut entries);
        self.m_entries = entries;
        Ok(ds)
    }

    /// Dense entropy change of moving `v` to `nr`
    pub fn virtual_move_dense(&mut self, v: Vertex, nr: Block, multigraph: bool) -> Result<f64> {
        self.check_block(nr)?;
        self.check_attached(v)?;
        self.dense_delta(v, nr, multigraph)
    }

    /// Change of the objective selected by `args` if `v` moved to `nr`.
    ///
    /// Nothing observable is mutated; partition statistics are built on
    /// first use when a description-length term is requested.
    pub fn virtual_move(&mut self, v: Vertex, nr: Block, args: &EntropyArgs) -> Result<f64> {
        self.check_block(nr)?;
        self.check_attached(v)?;
        let r = self.b[v];
        if self.bclabel[r] != self.bclabel[nr] {
            return Ok(f64::INFINITY);
        }

        let mut ds = if args.dense {
            self.virtual_move_dense(v, nr, args.multigraph)?
        } else {
            self.virtual_move_sparse(v, nr)?
        };

        if args.needs_partition_stats() {
            self.enable_partition_stats();
            if let Some(ps) = self.partition_stats.as_ref() {
                let label = self.pclabel[v];
                let w = self.g.vertex_weight(v);
                if args.partition_dl {
                    ds += ps.get_delta_dl(label, r, nr, w);
                }
                if self.deg_corr && args.degree_dl {
                    let degs = self.masked_degrees(v);
                    ds += ps.get_delta_deg_dl(label, r, nr, w, &degs, args.degree_dl_kind);
                }
                if args.edges_dl {
                    ds += ps.get_delta_edges_dl(r, nr, w);
                }
            }
        }
        Ok(ds)
    }

    /// Partition DL change of moving `v` to `nr`
    pub fn get_delta_dl(&mut self, v: Vertex, nr: Block) -> Result<f64> {
        self.check_block(nr)?;
        self.check_attached(v)?;
        self.enable_partition_stats();
        let r = self.b[v];
        let label = self.pclabel[v];
        let w = self.g.vertex_weight(v);
        Ok(self
            .partition_stats
            .as_ref()
            .map_or(0.0, |ps| ps.get_delta_dl(label, r, nr, w)))
    }

    /// Sparse entropy of the current state.
    ///
    /// * `multigraph` - Add the parallel-edge term
    /// * `deg_entropy` - Add per-vertex degree entropy (degree corrected only)
    pub fn sparse_entropy(&self, multigraph: bool, deg_entropy: bool) -> f64 {
        let directed = self.g.is_directed();
        let mut s = 0.0;
        for rec in self.agg.block_edges() {
            s += eterm(rec.source, rec.target, rec.weight, directed);
        }
        for r in 0..self.num_blocks() {
            s += vterm(
                self.agg.mrp(r),
                self.agg.mrm(r),
                self.agg.wr(r),
                self.deg_corr,
                directed,
            );
        }
        if self.deg_corr && deg_entropy {
            for v in 0..self.num_vertices() {
                s += degree_entropy(&self.masked_degrees(v));
            }
        }
        if multigraph {
            s += self.get_parallel_entropy();
        }
        s
    }

    /// Dense entropy of the current state
    pub fn dense_entropy(&self, multigraph: bool) -> Result<f64> {
        if self.deg_corr {
            return Err(BlockStateError::DenseDegreeCorrected);
        }
        let directed = self.g.is_directed();
        Ok(self
            .agg
            .block_edges()
            .map(|rec| {
                eterm_dense(
                    rec.source,
                    rec.target,
                    rec.weight,
                    self.agg.wr(rec.source),
                    self.agg.wr(rec.target),
                    multigraph,
                    directed,
                )
            })
            .sum())
    }

    /// Full objective selected by `args`
    pub fn entropy(&mut self, args: &EntropyArgs) -> Result<f64> {
        let mut s = if args.dense {
            self.dense_entropy(args.multigraph)?
        } else {
            self.sparse_entropy(args.multigraph, args.deg_entropy)
        };
        if args.needs_partition_stats() {
            self.enable_partition_stats();
            if let Some(ps) = self.partition_stats.as_ref() {
                if args.partition_dl {
                    s += ps.get_partition_dl();
                }
                if self.deg_corr && args.degree_dl {
                    s += ps.get_deg_dl(args.degree_dl_kind);
                }
                if args.edges_dl {
                    s += ps.get_edges_dl();
                }
            }
        }
        Ok(s)
    }

    /// `sum lgamma(m + 1)` over vertex pairs joined by `m > 1` edge weight
    pub fn get_parallel_entropy(&self) -> f64 {
        let directed = self.g.is_directed();
        let mut s = 0.0;
        let mut us: HashMap<Vertex, i64> = HashMap::default();
        for v in 0..self.num_vertices() {
            us.clear();
            for e in self.g.out_edges(v) {
                if !directed && e.target < v {
                    continue;
                }
                *us.entry(e.target).or_insert(0) += self.g.edge_weight(e.id);
            }
            for (&u, &m) in &us {
                if m <= 1 {
                    continue;
                }
                if u == v && !directed {
                    // listed twice per self-loop
                    s += lgamma((m / 2) as f64 + 1.0);
                } else {
                    s += lgamma(m as f64 + 1.0);
                }
            }
        }
        s
    }

    /// Partition DL of the current state
    pub fn get_partition_dl(&mut self) -> f64 {
        self.enable_partition_stats();
        self.partition_stats
            .as_ref()
            .map_or(0.0, |ps| ps.get_partition_dl())
    }

    /// Degree-sequence DL of the current state
    pub fn get_deg_dl(&mut self, kind: DegreeDlKind) -> f64 {
        self.enable_partition_stats();
        self.partition_stats
            .as_ref()
            .map_or(0.0, |ps| ps.get_deg_dl(kind))
    }

    /// Edge-count DL of the current state
    pub fn get_edges_dl(&mut self) -> f64 {
        self.enable_partition_stats();
        self.partition_stats
            .as_ref()
            .map_or(0.0, |ps| ps.get_edges_dl())
    }
}
