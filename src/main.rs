//! CLI entry point: selects a chain variant and runs it to completion
//! against a couplings file (or a generated ferromagnet torus), optionally
//! against a prefetched proposal file, writing results to disk when
//! `--save` is given (§6). `--num-workers` fans out `K` independent,
//! reproducibly-seeded chain drivers across a rayon thread pool (§5).

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use tracing::info;

use ising_mcmc::drivers::local::{run_local_chain, LocalChainConfig};
use ising_mcmc::drivers::neural::{run_neural_chain, NeuralChainConfig};
use ising_mcmc::drivers::RunOutcome;
use ising_mcmc::io::archive::{write_archive, SampleArchive};
use ising_mcmc::io::npy::write_npy;
use ising_mcmc::oracle::{ProposalOracle, ReplayOracle};
use ising_mcmc::{Couplings, EngineError};

#[derive(Parser)]
#[command(name = "ising-mcmc")]
#[command(about = "Samples low-energy configurations of a sparse Ising spin glass")]
struct Cli {
    /// Path to a couplings file in the row-adjacency text format (§4.8).
    /// Mutually exclusive with `--torus-spins`.
    #[arg(long)]
    couplings: Option<PathBuf>,

    /// Build a uniform ferromagnet torus with this many spins instead of
    /// reading a couplings file; must be a perfect square (§3). Mutually
    /// exclusive with `--couplings`.
    #[arg(long)]
    torus_spins: Option<usize>,

    /// Coupling strength `J` used when `--torus-spins` builds the lattice.
    #[arg(long, default_value_t = 1.0)]
    torus_j: f64,

    /// Inverse temperature.
    #[arg(long, default_value_t = 1.0)]
    beta: f64,

    /// Number of outer steps to run (meaning depends on the chosen variant).
    #[arg(long, default_value_t = 1000)]
    steps: u64,

    /// RNG seed for worker 0; worker `w` is seeded with `seed + w`.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Emit every `save_every`-th record.
    #[arg(long, default_value_t = 1)]
    save_every: u64,

    /// Number of independent, data-parallel chain drivers to run (§5).
    /// Each worker gets its own seed and its own output file(s).
    #[arg(long, default_value_t = 1)]
    num_workers: usize,

    /// Write each worker's output to this directory.
    #[arg(long)]
    save: Option<PathBuf>,

    /// Verbose per-iteration tracing.
    #[arg(long, default_value_t = false)]
    verbose: bool,

    /// Suppress the local driver's per-outer-iteration progress trace.
    #[arg(long, default_value_t = false)]
    disable_progress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Single-spin-flip Metropolis chain.
    Local {
        #[arg(long, default_value_t = 0)]
        sweeps: u64,
        #[arg(long, default_value_t = 0)]
        burn_in: u64,
    },
    /// Independent-proposal chain consuming a prefetched oracle file.
    Neural {
        #[arg(long)]
        oracle_file: PathBuf,
    },
    /// Stochastic mix of local and neural proposals.
    HybridStochastic {
        #[arg(long)]
        oracle_file: PathBuf,
        #[arg(long, default_value_t = 0.5)]
        prob_local: f64,
    },
    /// Deterministic block-interleaved mix of local and neural proposals.
    HybridSequential {
        #[arg(long)]
        oracle_file: PathBuf,
        #[arg(long, default_value_t = 4)]
        len_block: u64,
    },
    /// Two lockstep chains (local + RBM Gibbs) with swap proposals.
    ///
    /// No trained RBM ships with this core (§1); this subcommand is
    /// wired for completeness but requires an embedding application to
    /// supply a real `RBMOracle` impl, so it is not exposed standalone here.
    Exchange,
}

fn load_couplings(cli: &Cli) -> Result<Couplings> {
    match (&cli.couplings, cli.torus_spins) {
        (Some(_), Some(_)) => anyhow::bail!("--couplings and --torus-spins are mutually exclusive"),
        (None, None) => anyhow::bail!("one of --couplings or --torus-spins is required"),
        (Some(path), None) => {
            let file = File::open(path).with_context(|| format!("opening couplings file {path:?}"))?;
            Ok(Couplings::from_reader(std::io::BufReader::new(file))?)
        }
        (None, Some(spins)) => Ok(Couplings::from_spin_count(spins, cli.torus_j)?),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(if cli.verbose { "ising_mcmc=debug" } else { "ising_mcmc=info" })
        .init();

    let couplings = load_couplings(&cli)?;
    let spins = couplings.n();
    let num_workers = cli.num_workers.max(1);

    match &cli.command {
        Commands::Local { sweeps, burn_in } => {
            let outcomes: Vec<EngineResultBox> = (0..num_workers)
                .into_par_iter()
                .map(|w| {
                    let config = LocalChainConfig {
                        spins,
                        beta: cli.beta,
                        steps: cli.steps,
                        sweeps: *sweeps,
                        burn_in: *burn_in,
                        seed: cli.seed + w as u64,
                        verbose: cli.verbose,
                        disable_progress: cli.disable_progress,
                    };
                    run_local_chain(&config, &couplings).map_err(anyhow::Error::from)
                })
                .collect();

            for (w, outcome) in outcomes.into_iter().enumerate() {
                let outcome = outcome.with_context(|| format!("worker {w}"))?;
                info!(
                    worker = w,
                    acceptance_rate = outcome.summary.acceptance_rate,
                    mean_energy = outcome.summary.mean_energy,
                    min_energy = outcome.summary.min_energy,
                    truncated = outcome.truncated,
                    "local chain finished"
                );
                if let Some(dir) = &cli.save {
                    std::fs::create_dir_all(dir)?;
                    let file = File::create(dir.join(worker_file_name("samples", w, num_workers, "npy")))?;
                    write_npy(BufWriter::new(file), &outcome.samples, spins)?;
                }
            }
        }
        Commands::Neural { oracle_file } => {
            let bytes = std::fs::read(oracle_file)
                .with_context(|| format!("reading oracle file {oracle_file:?}"))?;
            let needed = (cli.steps * cli.save_every) as usize;

            let outcomes: Vec<EngineResultBox> = (0..num_workers)
                .into_par_iter()
                .map(|w| {
                    let mut oracle = ReplayOracle::from_json(&bytes)?;
                    let proposals = oracle.prefetch(needed);
                    if proposals.len() < needed {
                        return Err(
                            EngineError::OracleExhausted { consumed: proposals.len(), needed }.into(),
                        );
                    }
                    let config = NeuralChainConfig {
                        beta: cli.beta,
                        steps: cli.steps,
                        save_every: cli.save_every,
                        seed: cli.seed + w as u64,
                    };
                    run_neural_chain(&config, &couplings, &proposals).map_err(anyhow::Error::from)
                })
                .collect();

            for (w, outcome) in outcomes.into_iter().enumerate() {
                let outcome = outcome.with_context(|| format!("worker {w}"))?;
                info!(
                    worker = w,
                    acceptance_rate = outcome.summary.acceptance_rate,
                    mean_energy = outcome.summary.mean_energy,
                    truncated = outcome.truncated,
                    "neural chain finished"
                );
                save_archive(&cli.save, &worker_file_name("neural", w, num_workers, "json"), &outcome)?;
            }
        }
        Commands::HybridStochastic { .. } => {
            // Both hybrid drivers need a `DensityOracle` that can re-evaluate
            // `ln q` at an arbitrary one-bit-flip neighbour of the current
            // state (§4.4/§4.5). The only oracle this binary can build from
            // a `--oracle-file` is a lookup table over the few thousand
            // prefetched records (`TableDensityOracle`); a local-kind
            // proposal essentially never lands on one of those exact
            // configurations, so every local step would silently fall back
            // to `-inf` and get skipped, collapsing the chain into something
            // that looks like a neural-only run with inflated skip counts
            // and no diagnostic. Bail honestly instead of running degraded,
            // same as `Exchange` below — an embedding application with a
            // real `DensityOracle` can call `run_hybrid_stochastic` directly.
            anyhow::bail!(
                "the hybrid-stochastic driver requires a DensityOracle that can evaluate \
                 ln q at an arbitrary configuration; a replay file only supports the \
                 prefetched neural proposals themselves, so this binary has no honest \
                 DensityOracle to supply one from the CLI"
            );
        }
        Commands::HybridSequential { .. } => {
            anyhow::bail!(
                "the hybrid-sequential driver requires a DensityOracle that can evaluate \
                 ln q at an arbitrary configuration; a replay file only supports the \
                 prefetched neural proposals themselves, so this binary has no honest \
                 DensityOracle to supply one from the CLI"
            );
        }
        Commands::Exchange => {
            anyhow::bail!(
                "the exchange driver requires an embedding application's RBMOracle; \
                 this binary has no trained model to supply one"
            );
        }
    }

    Ok(())
}

type EngineResultBox = Result<RunOutcome>;

/// Per-worker output filename: plain when there's only one worker, suffixed
/// with the worker index otherwise, so a single-worker run's filenames are
/// unchanged from before `--num-workers` existed.
fn worker_file_name(stem: &str, worker: usize, num_workers: usize, ext: &str) -> String {
    if num_workers <= 1 {
        format!("{stem}.{ext}")
    } else {
        format!("{stem}-worker{worker}.{ext}")
    }
}

fn save_archive(save: &Option<PathBuf>, file_name: &str, outcome: &RunOutcome) -> Result<()> {
    let Some(dir) = save else { return Ok(()) };
    std::fs::create_dir_all(dir)?;
    let archive = SampleArchive::new(&outcome.samples, outcome.counters.accepted, &outcome.summary);
    let file = File::create(dir.join(file_name))?;
    write_archive(BufWriter::new(file), &archive)?;
    Ok(())
}
