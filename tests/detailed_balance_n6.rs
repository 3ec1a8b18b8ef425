//! Testable Property 4: finite-state enumeration of detailed balance for
//! the local chain's single-spin-flip Metropolis kernel, at `N <= 6`.

use ising_mcmc::{delta_h, energy, Couplings, Spin};

fn configuration(n: usize, bits: usize) -> Vec<Spin> {
    (0..n).map(|i| if (bits >> i) & 1 == 1 { 1 } else { -1 }).collect()
}

fn boltzmann_weights(couplings: &Couplings, beta: f64, n: usize) -> Vec<f64> {
    let total = 1usize << n;
    let energies: Vec<f64> = (0..total).map(|bits| energy(&configuration(n, bits), couplings)).collect();
    let min_e = energies.iter().cloned().fold(f64::INFINITY, f64::min);
    let unnormalized: Vec<f64> = energies.iter().map(|&e| (-beta * (e - min_e)).exp()).collect();
    let z: f64 = unnormalized.iter().sum();
    unnormalized.iter().map(|&w| w / z).collect()
}

fn metropolis_accept_prob(delta_h: f64, beta: f64) -> f64 {
    (-beta * delta_h).exp().min(1.0)
}

#[test]
fn local_chain_satisfies_detailed_balance_on_a_four_site_torus() {
    let n = 4;
    let couplings = Couplings::ferromagnet_torus(2, 1.0);
    let beta = 0.7;
    let pi = boltzmann_weights(&couplings, beta, n);

    for bits in 0..(1usize << n) {
        let s = configuration(n, bits);
        for k in 0..n {
            let dh = delta_h(k, &s, &couplings);
            let mut s_prime = s.clone();
            s_prime[k] = -s_prime[k];
            let bits_prime = bits ^ (1 << k);

            let p_forward = metropolis_accept_prob(dh, beta);
            let dh_back = delta_h(k, &s_prime, &couplings);
            let p_backward = metropolis_accept_prob(dh_back, beta);

            let lhs = pi[bits] * p_forward;
            let rhs = pi[bits_prime] * p_backward;
            assert!(
                (lhs - rhs).abs() < 1e-10,
                "detailed balance violated for bits={bits} k={k}: {lhs} vs {rhs}"
            );
        }
    }
}

#[test]
fn local_chain_satisfies_detailed_balance_on_a_six_site_chain() {
    let n = 6;
    // Open chain of 6 sites, nearest-neighbour coupling J=1, rather than a
    // torus, to exercise a non-uniform-degree lattice in the same enumeration.
    let rows: Vec<Vec<(usize, f64)>> = (0..n)
        .map(|i| {
            let mut row = Vec::new();
            if i > 0 {
                row.push((i - 1, 1.0));
            }
            if i + 1 < n {
                row.push((i + 1, 1.0));
            }
            row
        })
        .collect();
    let couplings = Couplings::from_adjacency(rows);
    let beta = 0.4;
    let pi = boltzmann_weights(&couplings, beta, n);

    for bits in 0..(1usize << n) {
        let s = configuration(n, bits);
        for k in 0..n {
            let dh = delta_h(k, &s, &couplings);
            let bits_prime = bits ^ (1 << k);
            let mut s_prime = s.clone();
            s_prime[k] = -s_prime[k];

            let p_forward = metropolis_accept_prob(dh, beta);
            let dh_back = delta_h(k, &s_prime, &couplings);
            let p_backward = metropolis_accept_prob(dh_back, beta);

            let lhs = pi[bits] * p_forward;
            let rhs = pi[bits_prime] * p_backward;
            assert!(
                (lhs - rhs).abs() < 1e-10,
                "detailed balance violated for bits={bits} k={k}: {lhs} vs {rhs}"
            );
        }
    }
}
