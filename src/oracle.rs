//! External collaborators consumed by the neural/hybrid/exchange drivers.
//!
//! Training and running the actual MADE/PixelCNN/RBM models is out of
//! scope for this core (§1) — these traits are the seam. The only
//! concrete implementation shipped here is [`ReplayOracle`], a
//! file/memory-backed fixture used by tests and by the CLI when a
//! prefetched proposal file is supplied; it is not a substitute for a
//! real generative model.

use serde::{Deserialize, Serialize};

use crate::spin::Spin;

/// Produces `(configuration, ln q(s))` pairs from an external generator.
/// `lnq` is `ln q(s)` up to a global constant — the constant cancels in
/// every acceptance ratio that consumes it. Non-finite `lnq` is
/// permitted and must be skipped by the consumer (§4.7).
pub trait ProposalOracle {
    fn next(&mut self) -> Option<(Vec<Spin>, f64)>;

    fn prefetch(&mut self, count: usize) -> Vec<(Vec<Spin>, f64)> {
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            match self.next() {
                Some(item) => out.push(item),
                None => break,
            }
        }
        out
    }
}

/// Evaluates the same density that produced a [`ProposalOracle`] stream
/// at an arbitrary configuration, needed by the hybrid drivers to
/// re-evaluate `ln q` against the chain's *current* state rather than
/// only the state the oracle originally proposed.
pub trait DensityOracle {
    fn logq(&self, s: &[Spin]) -> f64;
}

/// The RBM collaborator coupled to the exchange driver (§4.6).
pub trait RBMOracle {
    /// One full Gibbs step `h ~ p(h|v)`, `v' ~ p(v|h)` in the {0,1}
    /// convention.
    fn gibbs_step(&mut self, v: &[u8]) -> Vec<u8>;

    /// `F(v) = -log sum_h exp(-E_RBM(v,h))`, in the sign convention of
    /// the training framework (§9): `log p(v) = -F(v) - log Z`, with `Z`
    /// cancelling between both `F` terms in the swap ratio.
    fn free_energy(&self, v: &[u8]) -> f64;
}

/// One prefetched `(s, lnq)` record, the on-disk unit for [`ReplayOracle`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProposalRecord {
    pub s: Vec<Spin>,
    pub lnq: f64,
}

/// A finite, in-memory pull iterator over a prefetched proposal stream —
/// the "lazy sequence...in practice prefetched in a batch" of §9,
/// without the batching machinery of a real on-demand generator.
pub struct ReplayOracle {
    records: Vec<ProposalRecord>,
    cursor: usize,
}

impl ReplayOracle {
    pub fn new(records: Vec<ProposalRecord>) -> Self {
        Self { records, cursor: 0 }
    }

    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        let records: Vec<ProposalRecord> = serde_json::from_slice(bytes)?;
        Ok(Self::new(records))
    }

    pub fn remaining(&self) -> usize {
        self.records.len().saturating_sub(self.cursor)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ProposalOracle for ReplayOracle {
    fn next(&mut self) -> Option<(Vec<Spin>, f64)> {
        let record = self.records.get(self.cursor)?;
        self.cursor += 1;
        Some((record.s.clone(), record.lnq))
    }
}

/// A [`DensityOracle`] backed by the same finite record set a
/// [`ReplayOracle`] was built from, used in tests where the
/// hybrid drivers need to re-evaluate `ln q` at a configuration that
/// isn't necessarily the next one in the stream. Looks up an exact
/// match; falls back to the caller-supplied default density (typically
/// the analytic Boltzmann log-density in tests) otherwise.
pub struct TableDensityOracle<F: Fn(&[Spin]) -> f64> {
    table: std::collections::HashMap<Vec<Spin>, f64>,
    fallback: F,
}

impl<F: Fn(&[Spin]) -> f64> TableDensityOracle<F> {
    pub fn new(records: &[ProposalRecord], fallback: F) -> Self {
        let table = records
            .iter()
            .map(|r| (r.s.clone(), r.lnq))
            .collect();
        Self { table, fallback }
    }
}

impl<F: Fn(&[Spin]) -> f64> DensityOracle for TableDensityOracle<F> {
    fn logq(&self, s: &[Spin]) -> f64 {
        match self.table.get(s) {
            Some(&lnq) => lnq,
            None => (self.fallback)(s),
        }
    }
}
