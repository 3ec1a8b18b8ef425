//! The Hamiltonian evaluation kernels. These are the hot inner loops of
//! the whole engine: `delta_h` runs once per proposed local flip,
//! `energy` only at chain start and whenever an external proposal (neural
//! or swap) replaces the configuration wholesale.

use rayon::prelude::*;

use crate::lattice::Couplings;
use crate::spin::Spin;

/// Total energy `H(s) = -1/2 * sum_i sum_j J_ij * s_i * s_j`.
///
/// The `1/2` compensates for each edge being counted from both endpoints.
/// Runs the per-site sums in parallel; safe because each site's partial
/// sum only reads its own row.
pub fn energy(s: &[Spin], couplings: &Couplings) -> f64 {
    let total: f64 = (0..couplings.n())
        .into_par_iter()
        .map(|i| {
            let si = s[i] as f64;
            couplings
                .row(i)
                .map(|(j, w)| si * s[j] as f64 * w)
                .sum::<f64>()
        })
        .sum();
    -0.5 * total
}

/// Energy change `H(s') - H(s)` from flipping spin `k`, where `s'` is `s`
/// with `s[k]` negated. Derived once and reused as the cached-energy
/// update on every accepted local move — never recompute the full
/// Hamiltonian for a single-site flip.
pub fn delta_h(k: usize, s: &[Spin], couplings: &Couplings) -> f64 {
    let local_field: f64 = couplings
        .row(k)
        .map(|(j, w)| s[j] as f64 * w)
        .sum();
    2.0 * s[k] as f64 * local_field
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scenario S1: 2x2 torus, all J=1, all spins up.
    #[test]
    fn s1_energy_and_delta_h() {
        let couplings = Couplings::ferromagnet_torus(2, 1.0);
        let s = vec![1i8; 4];

        assert!((energy(&s, &couplings) - (-8.0)).abs() < 1e-9);
        assert!((delta_h(0, &s, &couplings) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn delta_h_matches_full_recompute() {
        let couplings = Couplings::ferromagnet_torus(4, 1.0);
        let mut s: Vec<Spin> = (0..16).map(|i| if i % 3 == 0 { -1 } else { 1 }).collect();

        for k in 0..16 {
            let e0 = energy(&s, &couplings);
            let predicted = delta_h(k, &s, &couplings);
            s[k] = -s[k];
            let e1 = energy(&s, &couplings);
            assert!(
                (e1 - e0 - predicted).abs() < 1e-9,
                "site {k}: e1-e0={}, delta_h={}",
                e1 - e0,
                predicted
            );
            s[k] = -s[k];
        }
    }

    #[test]
    fn all_up_ferromagnet_is_ground_state_energy_per_spin() {
        let l = 3;
        let couplings = Couplings::ferromagnet_torus(l, 1.0);
        let s = vec![1i8; l * l];
        let e = energy(&s, &couplings);
        assert!((e / (l * l) as f64 - (-2.0)).abs() < 1e-9);
    }
}
