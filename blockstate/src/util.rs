//! Special functions and per-term entropy formulas.
//!
//! ```text
//! eterm(r, s, m)          = -xlogx(m)                 (r != s or directed)
//!                         = -xlogx(2m) / 2            (r == s, undirected)
//! vterm(m+, m-, w)        = c * (xlogx(m+) + xlogx(m-))     degree corrected
//!                         = c * (m+ + m-) * ln(w)           otherwise
//! eterm_dense(r,s,m,wr,ws)= lbinom(N + m - 1, m)  multigraph
//!                         = lbinom(N, m)          simple graph
//! ```
//!
//! with `c = 1` for directed and `c = 1/2` for undirected graphs, and `N`
//! the number of vertex pairs between blocks `r` and `s`.

use special::Gamma as SpecialGamma;

/// Natural log of the gamma function
#[inline]
pub fn lgamma(x: f64) -> f64 {
    SpecialGamma::ln_gamma(x).0
}

/// Log binomial coefficient; zero when `n == 0`, `k == 0` or `k >= n`
#[inline]
pub fn lbinom(n: f64, k: f64) -> f64 {
    if n == 0.0 || k == 0.0 || k >= n {
        return 0.0;
    }
    lgamma(n + 1.0) - lgamma(k + 1.0) - lgamma(n - k + 1.0)
}

/// `x ln x` with `0 ln 0 = 0`
#[inline]
pub fn xlogx(x: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        x * x.ln()
    }
}

/// `ln x` with `ln 0 = 0`
#[inline]
pub fn safelog(x: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        x.ln()
    }
}

/// Edge-count term of the sparse entropy for block pair `(r, s)`
#[inline]
pub fn eterm(r: usize, s: usize, mrs: i64, directed: bool) -> f64 {
    let mut m = mrs as f64;
    if !directed && r == s {
        m *= 2.0;
    }
    let val = xlogx(m);
    if directed || r != s {
        -val
    } else {
        -val / 2.0
    }
}

/// Per-block degree/size term of the sparse entropy
#[inline]
pub fn vterm(mrp: i64, mrm: i64, wr: i64, deg_corr: bool, directed: bool) -> f64 {
    let one = if directed { 1.0 } else { 0.5 };
    if deg_corr {
        one * (xlogx(mrm as f64) + xlogx(mrp as f64))
    } else {
        one * ((mrm + mrp) as f64) * safelog(wr as f64)
    }
}

/// Edge-count term of the dense (Bernoulli / multigraph) entropy
#[inline]
pub fn eterm_dense(
    r: usize,
    s: usize,
    ers: i64,
    wr_r: i64,
    wr_s: i64,
    multigraph: bool,
    directed: bool,
) -> f64 {
    if ers == 0 {
        return 0.0;
    }
    let (wr_r, wr_s) = (wr_r as f64, wr_s as f64);
    let nrns = if r != s || directed {
        wr_r * wr_s
    } else if multigraph {
        (wr_r * (wr_r + 1.0)) / 2.0
    } else {
        (wr_r * (wr_r - 1.0)) / 2.0
    };
    let ers = ers as f64;
    if multigraph {
        lbinom(nrns + ers - 1.0, ers)
    } else {
        lbinom(nrns, ers)
    }
}
