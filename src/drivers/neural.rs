//! Neural-proposal MCMC: independent-proposal Metropolis consuming an
//! external proposal stream (§4.3).

use std::time::Instant;

use tracing::trace;

use crate::chain_state::{summarize, AcceptanceCounters, ProposalKind, Sample};
use crate::energy::energy;
use crate::error::{EngineError, EngineResult};
use crate::lattice::Couplings;
use crate::oracle::ProposalOracle;
use crate::rng::EngineRng;
use crate::spin::Spin;

use super::{accept, RunOutcome};

#[derive(Clone, Copy, Debug)]
pub struct NeuralChainConfig {
    pub beta: f64,
    pub steps: u64,
    pub save_every: u64,
    pub seed: u64,
}

/// Runs the neural chain. Requires a prefetched proposal list of length
/// at least `steps * save_every`; oracle exhaustion mid-run is fatal
/// (§4.7). Initialization scans from index 0 for the first finite `lnq`.
pub fn run_neural_chain(
    config: &NeuralChainConfig,
    couplings: &Couplings,
    proposals: &[(Vec<Spin>, f64)],
) -> EngineResult<RunOutcome> {
    if config.beta <= 0.0 {
        return Err(EngineError::NonPositiveBeta { beta: config.beta });
    }
    let needed = (config.steps * config.save_every) as usize;
    if proposals.len() < needed {
        return Err(EngineError::OracleExhausted {
            consumed: proposals.len(),
            needed,
        });
    }

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

    let mut all_emissions = Vec::with_capacity(needed);
    let total_iters = needed as u64 - 1;
    let mut truncated = false;

    for idx in 0..total_iters {
        if idx >= super::MAX_STEPS {
            truncated = true;
            break;
        }
        let (trial_s, trial_lnq) = &proposals[idx as usize + 1];

        let trial_e = energy(trial_s, couplings);
        let trial_lnpi = -config.beta * trial_e;

        if !trial_lnq.is_finite() || !trial_e.is_finite() || !trial_lnpi.is_finite() {
            counters.record_skip();
            trace!(idx, "neural chain skipping non-finite proposal");
            continue;
        }

        let lnalpha = accepted_lnq - trial_lnq + trial_lnpi - accepted_lnpi;
        let u = rng.uniform();
        let did_accept = accept(lnalpha, u);
        counters.record(ProposalKind::Neural, did_accept);

        if did_accept {
            accepted_s = trial_s.clone();
            accepted_lnq = *trial_lnq;
            accepted_e = trial_e;
            accepted_lnpi = trial_lnpi;
        }

        all_emissions.push(Sample { s: accepted_s.clone(), energy: accepted_e });
    }

    let samples: Vec<Sample> = all_emissions
        .into_iter()
        .step_by(config.save_every.max(1) as usize)
        .collect();

    let duration = start.elapsed().as_secs_f64();
    let summary = summarize(&samples, &counters, duration);
    Ok(RunOutcome { samples, counters, summary, truncated })
}
