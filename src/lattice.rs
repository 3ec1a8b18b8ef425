//! Sparse coupling table (the `J_{ij}` matrix) stored as padded,
//! per-site contiguous rows — the layout called out in the design notes
//! as the one that keeps access predictable for the hot energy loops.
//!
//! Each site `i` owns a row of width `deg_max` in both `neighbours` and
//! `couplings`; only the first `deg[i]` entries of that row are real,
//! the rest are zero-padded and excluded from every sum.

use std::io::{BufRead, BufReader, Read};

use crate::error::{EngineError, EngineResult};

/// Padded sparse adjacency / coupling table for an `N`-site lattice.
#[derive(Clone, Debug, Default)]
pub struct Couplings {
    n: usize,
    deg_max: usize,
    /// `neighbours[i * deg_max + k]` is the `k`-th neighbour of site `i`,
    /// valid for `k < deg[i]`.
    neighbours: Vec<usize>,
    /// `couplings[i * deg_max + k]` is `J_{i, neighbours[i][k]}`.
    couplings: Vec<f64>,
    deg: Vec<u8>,
}

impl Couplings {
    /// Number of lattice sites.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Common padded row width `D`.
    pub fn deg_max(&self) -> usize {
        self.deg_max
    }

    /// True degree of site `i` (number of real, non-padded neighbours).
    pub fn degree(&self, i: usize) -> usize {
        self.deg[i] as usize
    }

    /// Iterates the `(neighbour, J)` pairs of site `i`, skipping padding.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let base = i * self.deg_max;
        let d = self.degree(i);
        (0..d).map(move |k| (self.neighbours[base + k], self.couplings[base + k]))
    }

    fn push_row(&mut self, i: usize, mut row: Vec<(usize, f64)>) {
        row.truncate(self.deg_max);
        self.deg[i] = row.len() as u8;
        let base = i * self.deg_max;
        for (k, (j, w)) in row.into_iter().enumerate() {
            self.neighbours[base + k] = j;
            self.couplings[base + k] = w;
        }
    }

    /// Builds a table from a caller-assembled adjacency: one `Vec` of
    /// `(neighbour, J)` pairs per site. `deg_max` becomes the longest row.
    pub fn from_adjacency(rows: Vec<Vec<(usize, f64)>>) -> Self {
        let n = rows.len();
        let deg_max = rows.iter().map(|r| r.len()).max().unwrap_or(0).max(1);
        let mut table = Couplings {
            n,
            deg_max,
            neighbours: vec![0; n * deg_max],
            couplings: vec![0.0; n * deg_max],
            deg: vec![0; n],
        };
        for (i, row) in rows.into_iter().enumerate() {
            table.push_row(i, row);
        }
        table
    }

    /// Builds the uniform ferromagnet torus of [`Self::ferromagnet_torus`]
    /// from a raw spin count rather than a lattice side, per §3's data
    /// model: `L = floor(sqrt(spins))`, and `L*L` must equal `spins`
    /// exactly (a non-square spin count is a configuration error, not a
    /// silently-truncated lattice).
    pub fn from_spin_count(spins: usize, j: f64) -> EngineResult<Self> {
        let l = (spins as f64).sqrt().round() as usize;
        if l * l != spins {
            return Err(EngineError::NotAPerfectSquare { spins });
        }
        Ok(Self::ferromagnet_torus(l, j))
    }

    /// Uniform ferromagnet on a periodic `l`×`l` torus: every site has
    /// exactly 4 neighbours (up/down/left/right with wraparound), all
    /// couplings equal to `j`. Used by Scenarios S1–S3 and unit tests.
    pub fn ferromagnet_torus(l: usize, j: f64) -> Self {
        let n = l * l;
        let idx = |x: usize, y: usize| -> usize { (y % l) * l + (x % l) };
        let mut rows = Vec::with_capacity(n);
        for y in 0..l {
            for x in 0..l {
                let neighbours = [
                    idx(x + 1, y),
                    idx(x + l - 1, y),
                    idx(x, y + 1),
                    idx(x, y + l - 1),
                ];
                rows.push(neighbours.iter().map(|&nb| (nb, j)).collect());
            }
        }
        Self::from_adjacency(rows)
    }

    /// Parses the text couplings format documented in SPEC_FULL §4.8:
    ///
    /// ```text
    /// <N>
    /// <site> <degree>
    /// <neighbour_1> <coupling_1> ... <neighbour_degree> <coupling_degree>
    /// ... (N rows)
    /// ```
    ///
    /// Validates that every coupling is reciprocated (`J_ij == J_ji`).
    pub fn from_reader<R: Read>(reader: R) -> EngineResult<Self> {
        let mut lines = BufReader::new(reader).lines();
        let n: usize = lines
            .next()
            .ok_or_else(|| EngineError::MalformedCouplings("empty input".into()))??
            .trim()
            .parse()
            .map_err(|_| EngineError::MalformedCouplings("header is not an integer".into()))?;

        let mut rows: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        for _ in 0..n {
            let line = lines
                .next()
                .ok_or_else(|| EngineError::MalformedCouplings("truncated row list".into()))??;
            let mut tokens = line.split_whitespace();
            let site: usize = tokens
                .next()
                .ok_or_else(|| EngineError::MalformedCouplings("missing site index".into()))?
                .parse()
                .map_err(|_| EngineError::MalformedCouplings("site index is not an integer".into()))?;
            let degree: usize = tokens
                .next()
                .ok_or_else(|| EngineError::MalformedCouplings("missing degree".into()))?
                .parse()
                .map_err(|_| EngineError::MalformedCouplings("degree is not an integer".into()))?;
            if site >= n {
                return Err(EngineError::MalformedCouplings(format!(
                    "site index {site} out of range for N={n}"
                )));
            }

            let pair_line = lines
                .next()
                .ok_or_else(|| EngineError::MalformedCouplings("truncated neighbour row".into()))??;
            let mut pair_tokens = pair_line.split_whitespace();
            let mut row = Vec::with_capacity(degree);
            for _ in 0..degree {
                let nb: usize = pair_tokens
                    .next()
                    .ok_or_else(|| EngineError::MalformedCouplings("missing neighbour index".into()))?
                    .parse()
                    .map_err(|_| EngineError::MalformedCouplings("neighbour index is not an integer".into()))?;
                let j: f64 = pair_tokens
                    .next()
                    .ok_or_else(|| EngineError::MalformedCouplings("missing coupling value".into()))?
                    .parse()
                    .map_err(|_| EngineError::MalformedCouplings("coupling value is not a float".into()))?;
                row.push((nb, j));
            }
            rows[site] = row;
        }

        let table = Self::from_adjacency(rows);
        table.validate_symmetry()?;
        Ok(table)
    }

    fn validate_symmetry(&self) -> EngineResult<()> {
        for i in 0..self.n {
            for (j, w) in self.row(i) {
                let reciprocal = self.row(j).find(|&(k, _)| k == i).map(|(_, w)| w);
                match reciprocal {
                    Some(w2) if (w2 - w).abs() < 1e-9 => {}
                    Some(w2) => {
                        return Err(EngineError::MalformedCouplings(format!(
                            "asymmetric coupling: J[{i}][{j}]={w} but J[{j}][{i}]={w2}"
                        )));
                    }
                    None => {
                        return Err(EngineError::MalformedCouplings(format!(
                            "site {j} does not list reciprocal neighbour {i}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}
