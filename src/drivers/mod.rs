//! The four driver variants named in §2: local, neural, hybrid
//! (stochastic and sequential), and exchange. Each owns its chain's
//! mutable state directly and steps it forward synchronously; none of
//! them suspend or share mutable state with another driver (§5).

pub mod exchange;
pub mod hybrid_sequential;
pub mod hybrid_stochastic;
pub mod local;
pub mod neural;

use crate::chain_state::{AcceptanceCounters, RunSummary, Sample};

/// Safety upper bound on iterations for drivers that consume an
/// externally-bounded proposal stream (§4.4, §4.7): `10^7`.
pub const MAX_STEPS: u64 = 10_000_000;

/// What a driver returns on completion: the emitted sequence, the
/// acceptance counters, and whether `MAX_STEPS` cut the run short.
#[derive(Clone, Debug)]
pub struct RunOutcome {
    pub samples: Vec<Sample>,
    pub counters: AcceptanceCounters,
    pub summary: RunSummary,
    pub truncated: bool,
}

/// `min(1, exp(lnalpha))` acceptance test, shared by every acceptance
/// rule in this module: `lnalpha >= 0` always accepts (skips the
/// `exp`/log-uniform draw), otherwise accept iff `ln(U) < lnalpha`.
pub fn accept(lnalpha: f64, u: f64) -> bool {
    lnalpha >= 0.0 || u.ln() < lnalpha
}
