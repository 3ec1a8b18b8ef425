//! End-to-end check of the two file formats this core owns: the
//! couplings text loader (§4.8) and the `.npy` sample writer (§4.9).

use std::io::Read;

use ising_mcmc::drivers::local::{run_local_chain, LocalChainConfig};
use ising_mcmc::io::npy::write_npy;
use ising_mcmc::Couplings;

#[test]
fn couplings_file_loads_and_a_local_run_writes_a_valid_npy() {
    let dir = tempfile::tempdir().unwrap();
    let couplings_path = dir.path().join("couplings.txt");
    // 2x2 torus, written in the §4.8 row-adjacency text format.
    std::fs::write(
        &couplings_path,
        "4\n\
         0 2\n1 1.0 2 1.0\n\
         1 2\n0 1.0 3 1.0\n\
         2 2\n0 1.0 3 1.0\n\
         3 2\n1 1.0 2 1.0\n",
    )
    .unwrap();

    let file = std::fs::File::open(&couplings_path).unwrap();
    let couplings = Couplings::from_reader(file).unwrap();
    assert_eq!(couplings.n(), 4);

    let config = LocalChainConfig {
        spins: 4,
        beta: 1.0,
        steps: 50,
        sweeps: 0,
        burn_in: 0,
        seed: 1,
        verbose: false,
        disable_progress: false,
    };
    let outcome = run_local_chain(&config, &couplings).unwrap();

    let npy_path = dir.path().join("samples.npy");
    let file = std::fs::File::create(&npy_path).unwrap();
    write_npy(file, &outcome.samples, 4).unwrap();

    let mut bytes = Vec::new();
    std::fs::File::open(&npy_path).unwrap().read_to_end(&mut bytes).unwrap();
    assert_eq!(&bytes[0..6], b"\x93NUMPY");
    let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    let body = &bytes[10 + header_len..];
    assert_eq!(body.len(), outcome.samples.len() * 4);
}
