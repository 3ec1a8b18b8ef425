//! Single-spin-flip Metropolis–Hastings — the baseline chain (§4.2).

use std::time::Instant;

use tracing::debug;

use crate::chain_state::{summarize, AcceptanceCounters, ProposalKind, Sample};
use crate::energy::{delta_h, energy};
use crate::error::{EngineError, EngineResult};
use crate::lattice::Couplings;
use crate::rng::EngineRng;

use super::RunOutcome;

#[derive(Clone, Copy, Debug)]
pub struct LocalChainConfig {
    pub spins: usize,
    pub beta: f64,
    pub steps: u64,
    /// Single-flip attempts per outer iteration is `spins * sweeps` when
    /// `sweeps > 0`, else exactly 1 (§4.2).
    pub sweeps: u64,
    pub burn_in: u64,
    pub seed: u64,
    pub verbose: bool,
    /// Suppresses the per-outer-iteration `debug!` trace even when
    /// `verbose` is set (§4.2 input list); the core has no progress bar
    /// of its own to disable, so this only gates that log line.
    pub disable_progress: bool,
}

impl Default for LocalChainConfig {
    fn default() -> Self {
        Self {
            spins: 0,
            beta: 1.0,
            steps: 0,
            sweeps: 0,
            burn_in: 0,
            seed: 0,
            verbose: false,
            disable_progress: false,
        }
    }
}

/// Runs the local chain to completion. Seeds `s` uniformly at random,
/// then performs `steps + burn_in` outer iterations of `inner` attempted
/// flips each; appends a deep copy of `(s, E)` after every outer
/// iteration once past burn-in.
pub fn run_local_chain(config: &LocalChainConfig, couplings: &Couplings) -> EngineResult<RunOutcome> {
    if config.beta <= 0.0 {
        return Err(EngineError::NonPositiveBeta { beta: config.beta });
    }
    if couplings.n() != config.spins {
        return Err(EngineError::ShapeMismatch {
            expected: config.spins,
            actual: couplings.n(),
        });
    }

    let start = Instant::now();
    let mut rng = EngineRng::from_seed(config.seed);
    let mut s = rng.random_configuration(config.spins);
    let mut e = energy(&s, couplings);

    let inner = if config.sweeps == 0 { 1 } else { config.sweeps * config.spins as u64 };
    let total_outer = config.steps + config.burn_in;

    let mut counters = AcceptanceCounters::default();
    let mut samples = Vec::with_capacity(config.steps as usize);
    let mut truncated = false;

    for outer in 0..total_outer {
        if outer >= MAX_STEPS_LOCAL {
            truncated = true;
            break;
        }
        for _ in 0..inner {
            let k = rng.index(config.spins);
            let dh = delta_h(k, &s, couplings);
            let accepted = dh < 0.0 || rng.uniform() < (-config.beta * dh).exp();
            counters.record(ProposalKind::Local, accepted);
            if accepted {
                s[k] = -s[k];
                e += dh;
            }
        }

        if outer >= config.burn_in {
            samples.push(Sample { s: s.clone(), energy: e });
        }
        if config.verbose && !config.disable_progress {
            debug!(outer, energy = e, "local chain outer iteration");
        }
    }

    let duration = start.elapsed().as_secs_f64();
    let summary = summarize(&samples, &counters, duration);
    Ok(RunOutcome { samples, counters, summary, truncated })
}

const MAX_STEPS_LOCAL: u64 = super::MAX_STEPS;
