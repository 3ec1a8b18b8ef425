//! Error types for the engine's public boundary.
//!
//! Per-iteration numerical skips (non-finite ΔH, lnq, lnπ) are *not*
//! represented here — they are silent, counted events handled inline by
//! each driver, never propagated as an `Err`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("spin count {spins} is not a perfect square")]
    NotAPerfectSquare { spins: usize },

    #[error("beta must be positive, got {beta}")]
    NonPositiveBeta { beta: f64 },

    #[error("couplings file is malformed: {0}")]
    MalformedCouplings(String),

    #[error("proposal oracle exhausted after {consumed} of {needed} required draws")]
    OracleExhausted { consumed: usize, needed: usize },

    #[error("proposal oracle produced no finite lnq within the first {scanned} draws")]
    OracleNeverFinite { scanned: usize },

    #[error("shape mismatch: expected {expected} spins, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
