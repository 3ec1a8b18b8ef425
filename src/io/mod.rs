//! On-disk output formats for emitted chains (§4.9): a hand-rolled `.npy`
//! writer for the local driver's raw configuration matrix, and a JSON
//! archive for every variant that needs a summary alongside it.

pub mod archive;
pub mod npy;
