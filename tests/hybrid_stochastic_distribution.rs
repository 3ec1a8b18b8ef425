//! Scenario S5: hybrid-stochastic driver with a neural oracle whose `lnq`
//! is the true Boltzmann log-density reproduces the exact energy marginal.

use ising_mcmc::drivers::hybrid_stochastic::{run_hybrid_stochastic, HybridStochasticConfig};
use ising_mcmc::oracle::{ProposalRecord, TableDensityOracle};
use ising_mcmc::rng::EngineRng;
use ising_mcmc::{energy, Couplings, Spin};

fn configuration(n: usize, bits: usize) -> Vec<Spin> {
    (0..n).map(|i| if (bits >> i) & 1 == 1 { 1 } else { -1 }).collect()
}

fn exact_mean_energy(couplings: &Couplings, beta: f64, n: usize) -> f64 {
    let total = 1usize << n;
    let energies: Vec<f64> = (0..total).map(|bits| energy(&configuration(n, bits), couplings)).collect();
    let min_e = energies.iter().cloned().fold(f64::INFINITY, f64::min);
    let weights: Vec<f64> = energies.iter().map(|&e| (-beta * (e - min_e)).exp()).collect();
    let z: f64 = weights.iter().sum();
    energies.iter().zip(weights.iter()).map(|(&e, &w)| e * w).sum::<f64>() / z
}

fn boltzmann_lnq(s: &[Spin], couplings: &Couplings, beta: f64) -> f64 {
    -beta * energy(s, couplings)
}

#[test]
fn s5_hybrid_stochastic_reproduces_the_exact_energy_marginal() {
    let l = 3; // 3x3 torus, N = 9
    let n = l * l;
    let couplings = Couplings::ferromagnet_torus(l, 1.0);
    let beta = 1.0;
    let prob_local = 0.5;
    let steps = 50_000u64;

    let exact = exact_mean_energy(&couplings, beta, n);

    let proposal_count = ((steps as f64) * (1.1 - prob_local)).ceil() as u64;
    let proposals: Vec<(Vec<Spin>, f64)> = (0..proposal_count)
        .map(|i| {
            let mut rng = EngineRng::from_seed(90_000 + i);
            let s = rng.random_configuration(n);
            let lnq = boltzmann_lnq(&s, &couplings, beta);
            (s, lnq)
        })
        .collect();
    let records: Vec<ProposalRecord> = proposals
        .iter()
        .map(|(s, lnq)| ProposalRecord { s: s.clone(), lnq: *lnq })
        .collect();
    let density = TableDensityOracle::new(&records, |s| boltzmann_lnq(s, &couplings, beta));

    let config = HybridStochasticConfig { spins: n, beta, steps, save_every: 1, prob_local, seed: 21 };
    let outcome = run_hybrid_stochastic(&config, &couplings, &proposals, &density).unwrap();

    assert!(
        (outcome.summary.mean_energy - exact).abs() < 1.0,
        "mean energy {} too far from exact {}",
        outcome.summary.mean_energy,
        exact
    );
}
