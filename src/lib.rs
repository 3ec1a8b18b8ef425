//! MCMC engine for sampling low-energy configurations of a sparse Ising
//! spin glass: a local single-spin-flip chain, a neural independent-
//! proposal chain, two ways of mixing the two, and an exchange driver
//! coupling a local chain to an RBM Gibbs chain.

pub mod chain_state;
pub mod drivers;
pub mod energy;
pub mod error;
pub mod io;
pub mod lattice;
pub mod oracle;
pub mod rng;
pub mod spin;

pub use chain_state::{AcceptanceCounters, ProposalKind, RunSummary, Sample};
pub use energy::{delta_h, energy};
pub use error::{EngineError, EngineResult};
pub use lattice::Couplings;
pub use oracle::{DensityOracle, ProposalOracle, ProposalRecord, RBMOracle, ReplayOracle, TableDensityOracle};
pub use rng::EngineRng;
pub use spin::Spin;
