//! Block-interleaved local/neural proposals selected deterministically by
//! step index (§4.5).

use std::time::Instant;

use tracing::trace;

use crate::chain_state::{summarize, AcceptanceCounters, ProposalKind, Sample};
use crate::energy::{delta_h, energy};
use crate::error::{EngineError, EngineResult};
use crate::lattice::Couplings;
use crate::oracle::DensityOracle;
use crate::rng::EngineRng;
use crate::spin::Spin;

use super::{accept, RunOutcome, MAX_STEPS};

#[derive(Clone, Copy, Debug)]
pub struct HybridSequentialConfig {
    pub spins: usize,
    pub beta: f64,
    pub steps: u64,
    pub save_every: u64,
    /// Neural proposal iff `step % len_block == 0`; must be `>= 1`.
    pub len_block: u64,
    pub seed: u64,
}

/// Runs the hybrid-sequential chain. `proposals` must hold at least one
/// entry for every step where `step % len_block == 0`.
pub fn run_hybrid_sequential(
    config: &HybridSequentialConfig,
    couplings: &Couplings,
    proposals: &[(Vec<Spin>, f64)],
    density: &dyn DensityOracle,
) -> EngineResult<RunOutcome> {
    if config.beta <= 0.0 {
        return Err(EngineError::NonPositiveBeta { beta: config.beta });
    }
    let len_block = config.len_block.max(1);

    let start = Instant::now();
    let mut rng = EngineRng::from_seed(config.seed);
    let mut counters = AcceptanceCounters::default();

    let init_idx = proposals
        .iter()
        .position(|(_, lnq)| lnq.is_finite())
        .ok_or(EngineError::OracleNeverFinite { scanned: proposals.len() })?;
    let (mut accepted_s, mut accepted_lnq) = proposals[init_idx].clone();
    let mut accepted_e = energy(&accepted_s, couplings);
    let mut accepted_lnpi = -config.beta * accepted_e;

    let mut neural_cursor = init_idx + 1;
    let mut emissions = Vec::new();
    let mut truncated = false;
    let mut prev_kind = ProposalKind::Local;

    for step in 0..config.steps.min(MAX_STEPS) {
        let is_neural_step = step % len_block == 0;

        let (trial_s, trial_lnq, trial_e, lnalpha, kind) = if is_neural_step {
            let Some((s, lnq)) = proposals.get(neural_cursor).cloned() else {
                return Err(EngineError::OracleExhausted {
                    consumed: neural_cursor,
                    needed: neural_cursor + 1,
                });
            };
            neural_cursor += 1;
            let e = energy(&s, couplings);
            let lnpi = -config.beta * e;
            // Re-evaluate the density at the *current* accepted state: local
            // moves since the last neural step may have drifted it away from
            // whatever the oracle's lnq originally matched.
            let current_lnq = density.logq(&accepted_s);
            let lnalpha = lnpi - accepted_lnpi + current_lnq - lnq;
            (s, lnq, e, lnalpha, ProposalKind::Neural)
        } else {
            let k = rng.index(config.spins);
            let mut s = accepted_s.clone();
            let dh = delta_h(k, &accepted_s, couplings);
            s[k] = -s[k];
            let e = accepted_e + dh;
            let lnpi = -config.beta * e;
            let lnalpha = lnpi - accepted_lnpi;
            (s, f64::NAN, e, lnalpha, ProposalKind::Local)
        };

        if !trial_e.is_finite() || !lnalpha.is_finite() || (is_neural_step && !trial_lnq.is_finite()) {
            counters.record_skip();
            trace!(step, ?kind, "hybrid-sequential skipping non-finite proposal");
            continue;
        }

        let u = rng.uniform();
        let did_accept = accept(lnalpha, u);
        counters.record(kind, did_accept);
        if did_accept && matches!(kind, ProposalKind::Neural) && matches!(prev_kind, ProposalKind::Local) {
            counters.neural_after_local += 1;
        }

        if did_accept {
            accepted_s = trial_s;
            accepted_e = trial_e;
            accepted_lnpi = -config.beta * accepted_e;
            if is_neural_step {
                accepted_lnq = trial_lnq;
            }
            prev_kind = kind;
        }

        if step % config.save_every.max(1) == 0 {
            emissions.push(Sample { s: accepted_s.clone(), energy: accepted_e });
        }

        if step + 1 >= MAX_STEPS {
            truncated = true;
            break;
        }
    }

    let duration = start.elapsed().as_secs_f64();
    let summary = summarize(&emissions, &counters, duration);
    Ok(RunOutcome { samples: emissions, counters, summary, truncated })
}
