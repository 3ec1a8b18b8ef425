//! Minimal `.npy` v1.0 writer for an `(steps, N)` `int8` matrix. No
//! external npy crate is part of this workspace's stack, so the header
//! is built by hand per the numpy format spec: magic string, version,
//! a little-endian header length, and a Python-dict-literal header
//! padded with spaces (plus a trailing newline) to a 64-byte boundary.

use std::io::Write;

use crate::chain_state::Sample;
use crate::error::EngineResult;

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const VERSION: (u8, u8) = (1, 0);
const ALIGNMENT: usize = 64;

/// Writes `samples` as an `(samples.len(), n_spins)` `int8` array to `w`.
pub fn write_npy<W: Write>(mut w: W, samples: &[Sample], n_spins: usize) -> EngineResult<()> {
    let shape = format!("({}, {})", samples.len(), n_spins);
    let dict = format!(
        "{{'descr': '|i1', 'fortran_order': False, 'shape': {}, }}",
        shape
    );

    // Header length must make `MAGIC + version(2) + header_len(2) + dict`
    // a multiple of ALIGNMENT; pad the dict with spaces and a final \n.
    let prefix_len = MAGIC.len() + 2 + 2;
    let mut header = dict.into_bytes();
    header.push(b'\n');
    let total = prefix_len + header.len();
    let padding = (ALIGNMENT - total % ALIGNMENT) % ALIGNMENT;
    // Replace the trailing newline with padding spaces, then restore it.
    header.pop();
    header.extend(std::iter::repeat(b' ').take(padding));
    header.push(b'\n');

    w.write_all(MAGIC)?;
    w.write_all(&[VERSION.0, VERSION.1])?;
    w.write_all(&(header.len() as u16).to_le_bytes())?;
    w.write_all(&header)?;

    for sample in samples {
        for &spin in &sample.s {
            w.write_all(&[spin as u8])?;
        }
    }
    Ok(())
}
