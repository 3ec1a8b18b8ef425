//! Per-step Bernoulli choice between a local and a neural proposal, with
//! a detailed-balance-correct acceptance rule for the resulting mixed
//! proposal kernel (§4.4).

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
pub struct HybridStochasticConfig {
    pub spins: usize,
    pub beta: f64,
    pub steps: u64,
    pub save_every: u64,
    pub prob_local: f64,
    pub seed: u64,
}

/// `ln q_mix(from -> to)` for the mixed kernel of §4.4: a local term that
/// only exists when `from`/`to` differ by exactly one spin, plus a
/// neural term that exists unconditionally (the neural proposal is drawn
/// independently of the current state).
fn log_q_mix(prob_local: f64, n: usize, lnq_to: f64, hamming_one: bool) -> f64 {
    let neural_term = (1.0 - prob_local) * lnq_to.exp();
    if hamming_one {
        (prob_local / n as f64 + neural_term).ln()
    } else {
        neural_term.ln()
    }
}

fn hamming_distance(a: &[Spin], b: &[Spin]) -> usize {
    a.iter().zip(b.iter()).filter(|(x, y)| x != y).count()
}

/// Runs the hybrid-stochastic chain. `proposals` must hold at least
/// `ceil(steps * (1.1 - prob_local))` prefetched neural draws (§4.4).
pub fn run_hybrid_stochastic(
    config: &HybridStochasticConfig,
    couplings: &Couplings,
    proposals: &[(Vec<Spin>, f64)],
    density: &dyn DensityOracle,
) -> EngineResult<RunOutcome> {
    if config.beta <= 0.0 {
        return Err(EngineError::NonPositiveBeta { beta: config.beta });
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

    let mut neural_cursor = init_idx + 1;
    let mut emissions = Vec::new();
    let mut truncated = false;
    let mut prev_kind = ProposalKind::Local;

    for step in 0..config.steps.min(MAX_STEPS) {
        let draw_neural = rng.uniform() <= 1.0 - config.prob_local;

        let (trial_s, trial_lnq, trial_e, kind): (Vec<Spin>, f64, f64, ProposalKind) = if draw_neural {
            let Some((s, lnq)) = proposals.get(neural_cursor).cloned() else {
                return Err(EngineError::OracleExhausted {
                    consumed: neural_cursor,
                    needed: neural_cursor + 1,
                });
            };
            neural_cursor += 1;
            let e = energy(&s, couplings);
            (s, lnq, e, ProposalKind::Neural)
        } else {
            let k = rng.index(config.spins);
            let mut s = accepted_s.clone();
            let dh = delta_h(k, &accepted_s, couplings);
            s[k] = -s[k];
            let e = accepted_e + dh;
            let lnq = density.logq(&s);
            (s, lnq, e, ProposalKind::Local)
        };

        let trial_lnpi = -config.beta * trial_e;
        if !trial_lnq.is_finite() || !trial_e.is_finite() || !trial_lnpi.is_finite() {
            counters.record_skip();
            trace!(step, ?kind, "hybrid-stochastic skipping non-finite proposal");
            continue;
        }

        let hamming_one = hamming_distance(&trial_s, &accepted_s) == 1;
        let ln_q_fwd = log_q_mix(config.prob_local, config.spins, trial_lnq, hamming_one);
        let ln_q_rev = log_q_mix(config.prob_local, config.spins, accepted_lnq, hamming_one);
        let lnalpha = trial_lnpi - accepted_lnpi + ln_q_rev - ln_q_fwd;

        if !lnalpha.is_finite() {
            counters.record_skip();
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
            accepted_lnq = trial_lnq;
            accepted_e = trial_e;
            accepted_lnpi = trial_lnpi;
            prev_kind = kind;
        }

        emissions.push(Sample { s: accepted_s.clone(), energy: accepted_e });

        if step + 1 >= MAX_STEPS {
            truncated = true;
            break;
        }
    }

    let samples: Vec<Sample> = emissions
        .into_iter()
        .step_by(config.save_every.max(1) as usize)
        .collect();

    let duration = start.elapsed().as_secs_f64();
    let summary = summarize(&samples, &counters, duration);
    Ok(RunOutcome { samples, counters, summary, truncated })
}
