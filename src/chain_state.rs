//! The mutable state every driver steps forward in place: the current
//! configuration plus the cached scalars that make incremental updates
//! possible without ever recomputing the full Hamiltonian.

use crate::spin::Spin;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProposalKind {
    Local,
    Neural,
}

/// Proposed/accepted tallies, overall and split by proposal kind, plus
/// the "neural-after-local" transition count the exchange/hybrid drivers
/// track per §3.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptanceCounters {
    pub proposed: u64,
    pub accepted: u64,
    pub local_proposed: u64,
    pub local_accepted: u64,
    pub neural_proposed: u64,
    pub neural_accepted: u64,
    pub neural_after_local: u64,
    pub skipped_nonfinite: u64,
}

impl AcceptanceCounters {
    pub fn record(&mut self, kind: ProposalKind, accepted: bool) {
        self.proposed += 1;
        match kind {
            ProposalKind::Local => {
                self.local_proposed += 1;
                if accepted {
                    self.local_accepted += 1;
                }
            }
            ProposalKind::Neural => {
                self.neural_proposed += 1;
                if accepted {
                    self.neural_accepted += 1;
                }
            }
        }
        if accepted {
            self.accepted += 1;
        }
    }

    pub fn record_skip(&mut self) {
        self.skipped_nonfinite += 1;
    }

    pub fn acceptance_rate(&self) -> f64 {
        if self.proposed == 0 {
            0.0
        } else {
            self.accepted as f64 / self.proposed as f64
        }
    }
}

/// A single emitted record: a deep copy of the configuration alongside
/// its energy at the time of emission.
#[derive(Clone, Debug)]
pub struct Sample {
    pub s: Vec<Spin>,
    pub energy: f64,
}

/// Summary statistics reported at the end of every driver run.
#[derive(Clone, Copy, Debug)]
pub struct RunSummary {
    pub acceptance_rate: f64,
    pub mean_energy: f64,
    pub std_energy: f64,
    pub min_energy: f64,
    pub duration_secs: f64,
}

pub fn summarize(samples: &[Sample], counters: &AcceptanceCounters, duration_secs: f64) -> RunSummary {
    let n = samples.len();
    if n == 0 {
        return RunSummary {
            acceptance_rate: counters.acceptance_rate(),
            mean_energy: f64::NAN,
            std_energy: f64::NAN,
            min_energy: f64::NAN,
            duration_secs,
        };
    }
    let mean: f64 = samples.iter().map(|r| r.energy).sum::<f64>() / n as f64;
    let variance = if n > 1 {
        samples
            .iter()
            .map(|r| (r.energy - mean).powi(2))
            .sum::<f64>()
            / (n - 1) as f64
    } else {
        0.0
    };
    let min_energy = samples
        .iter()
        .map(|r| r.energy)
        .fold(f64::INFINITY, f64::min);

    RunSummary {
        acceptance_rate: counters.acceptance_rate(),
        mean_energy: mean,
        std_energy: variance.sqrt(),
        min_energy,
        duration_secs,
    }
}
