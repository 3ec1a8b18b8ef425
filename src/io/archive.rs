//! JSON archive for the neural/hybrid/exchange variants: a summary plus
//! the inlined sample matrix and energies, in place of reproducing the
//! `.npz` zip container the reference format uses (§4.9 — no
//! zip/compression crate is part of this workspace's stack).

use std::io::Write;

use serde::Serialize;

use crate::chain_state::{RunSummary, Sample};
use crate::error::EngineResult;

#[derive(Serialize)]
pub struct SampleArchive<'a> {
    pub accepted: u64,
    pub avg_eng: f64,
    pub std_eng: f64,
    pub samples: Vec<&'a [crate::spin::Spin]>,
    pub energies: Vec<f64>,
}

impl<'a> SampleArchive<'a> {
    pub fn new(samples: &'a [Sample], accepted: u64, summary: &RunSummary) -> Self {
        Self {
            accepted,
            avg_eng: summary.mean_energy,
            std_eng: summary.std_energy,
            samples: samples.iter().map(|r| r.s.as_slice()).collect(),
            energies: samples.iter().map(|r| r.energy).collect(),
        }
    }
}

pub fn write_archive<W: Write>(mut w: W, archive: &SampleArchive) -> EngineResult<()> {
    let bytes = serde_json::to_vec(archive)?;
    w.write_all(&bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain_state::{summarize, AcceptanceCounters};

    #[test]
    fn archive_round_trips_through_json() {
        let samples = vec![
            Sample { s: vec![1, -1], energy: -1.0 },
            Sample { s: vec![-1, -1], energy: 1.0 },
        ];
        let counters = AcceptanceCounters { proposed: 2, accepted: 1, ..Default::default() };
        let summary = summarize(&samples, &counters, 0.1);
        let archive = SampleArchive::new(&samples, counters.accepted, &summary);

        let mut buf = Vec::new();
        write_archive(&mut buf, &archive).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed["accepted"], 1);
        assert_eq!(parsed["samples"][0][0], 1);
        assert_eq!(parsed["energies"][1], 1.0);
    }
}
