//! The ±1 spin convention used everywhere in the core, and the boundary
//! conversion to the {0,1} convention the RBM collaborator expects.

/// A single Ising spin, constrained to `{-1, 1}`.
pub type Spin = i8;

/// Build a spin configuration from raw `{-1,1}` values, panicking in debug
/// builds if any entry is out of the domain. Callers that read untrusted
/// input (a couplings/oracle file) should validate before calling this.
pub fn debug_assert_spin_domain(s: &[Spin]) {
    debug_assert!(
        s.iter().all(|&v| v == -1 || v == 1),
        "spin configuration contains a value outside {{-1,1}}"
    );
}

/// Converts a ±1 configuration to the RBM's {0,1} convention: `x = (s+1)/2`.
pub fn to_binary(s: &[Spin]) -> Vec<u8> {
    s.iter().map(|&v| ((v + 1) / 2) as u8).collect()
}

/// Converts a {0,1} configuration back to the ±1 convention: `s = 2x - 1`.
pub fn from_binary(x: &[u8]) -> Vec<Spin> {
    x.iter().map(|&v| 2 * v as i8 - 1).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_binary() {
        let s = vec![1, -1, -1, 1, 1];
        let x = to_binary(&s);
        assert_eq!(x, vec![1, 0, 0, 1, 1]);
        assert_eq!(from_binary(&x), s);
    }
}
