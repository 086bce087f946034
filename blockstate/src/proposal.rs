//! Block proposals for MCMC moves and their probabilities.
//!
//! With mixing weight `c`, a proposal for `v` either picks a block
//! uniformly or follows the block structure: pick a neighbour `u`
//! (weighted by edge weight), pick a random edge incident on `u`'s block
//! `t`, and propose the block at its far end. The probability of
//! proposing `s` is
//!
//! ```text
//! p(s | v) = sum_{e ~ v} w_e / k_v * (m_ts + c) / (m_t + c B)
//! ```
//!
//! where `t` is the block of `e`'s far end (directed graphs count both
//! directions of `m_ts` and `m_t`; undirected graphs double `m_tt`).

use crate::error::Result;
use crate::graph::BlockGraph;
use crate::state::BlockState;
use crate::{Block, Vertex};
use rand::Rng;

impl<G: BlockGraph> BlockState<G> {
    /// Random neighbour of `v`, weighted by edge weight; `v` itself when
    /// it has no neighbours
    pub fn random_neighbour<R: Rng + ?Sized>(&self, v: Vertex, rng: &mut R) -> Vertex {
        match &self.neighbour_sampler[v] {
            Some(ns) => ns.sample(rng),
            None => v,
        }
    }

    /// Propose a block for `v`.
    ///
    /// * `c` - Mixing weight; `0` always follows edges, `inf` is uniform
    /// * `block_list` - Candidates for the uniform branch; empty means
    ///   `v`'s own block
    pub fn sample_block<R: Rng + ?Sized>(
        &mut self,
        v: Vertex,
        c: f64,
        block_list: &[Block],
        rng: &mut R,
    ) -> Block {
        let mut s = if block_list.is_empty() {
            self.b[v]
        } else {
            block_list[rng.random_range(0..block_list.len())]
        };

        if c.is_infinite() {
            return s;
        }
        let Some(ns) = self.neighbour_sampler[v].as_ref() else {
            return s;
        };

        let u = ns.sample(rng);
        let t = self.b[u];
        let p_rand = if c > 0.0 {
            let b = self.num_blocks() as f64;
            let mt = if self.g.is_directed() {
                (self.agg.mrp(t) + self.agg.mrm(t)) as f64
            } else {
                self.agg.mrp(t) as f64
            };
            c * b / (mt + c * b)
        } else {
            0.0
        };

        if c == 0.0 || rng.random::<f64>() >= p_rand {
            self.ensure_egroups();
            if let Some(far) = self.egroups.as_ref().and_then(|eg| eg.sample(t, rng)) {
                s = self.b[far];
            }
        }
        s
    }

    /// Probability of proposing block `s` for `v` currently in `r`.
    ///
    /// With `reverse`, the aggregates are read as if `v` had already moved
    /// from its current block to `r`, which gives the probability of the
    /// reverse proposal `r -> s`. For a move `r -> s` the Hastings ratio
    /// uses `get_move_prob(v, r, s, c, false)` forward and
    /// `get_move_prob(v, s, r, c, true)` backward.
    pub fn get_move_prob(
        &mut self,
        v: Vertex,
        r: Block,
        s: Block,
        c: f64,
        reverse: bool,
    ) -> Result<f64> {
        self.check_block(r)?;
        self.check_block(s)?;
        let mut entries = std::mem::take(&mut self.m_entries);
        if reverse {
            self.fill_move_entries(v, r, &mut entries);
        } else {
            entries.clear();
        }

        let directed = self.g.is_directed();
        let num_blocks = self.num_blocks() as f64;
        let (kin, kout) = self.move_degrees(v);
        let agg = &self.agg;

        let mut p = 0.0;
        let mut w = 0_i64;
        let edges = self.g.out_edges(v).chain(self.g.in_edges(v));
        for e in edges {
            let ew = self.g.edge_weight(e.id);
            if ew == 0 {
                continue;
            }
            w += ew;
            let u = e.other(v);
            let t = if u == v { r } else { self.b[u] };

            let mut mts = agg.get_mrs(t, s);
            let mut mtp = agg.mrp(t);
            let (mut mst, mut mtm) = if directed {
                (agg.get_mrs(s, t), agg.mrm(t))
            } else {
                (mts, mtp)
            };

            if reverse {
                let dts = entries.get_delta(t, s);
                let dst = if directed { entries.get_delta(s, t) } else { dts };
                mts += dts;
                mst += dst;
                if t == s {
                    mtp -= kout;
                    mtm -= kin;
                }
                if t == r {
                    mtp += kout;
                    mtm += kin;
                }
            }

            let ew = ew as f64;
            if directed {
                p += ew * ((mts + mst) as f64 + c) / ((mtp + mtm) as f64 + c * num_blocks);
            } else {
                if t == s {
                    mts *= 2;
                }
                p += ew * (mts as f64 + c) / (mtp as f64 + c * num_blocks);
            }
        }

        self.m_entries = entries;
        if w > 0 {
            Ok(p / w as f64)
        } else {
            Ok(1.0 / num_blocks)
        }
    }
}
