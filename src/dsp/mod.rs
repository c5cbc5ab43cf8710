//! DSP building blocks for the mix graph.
//!
//! Everything here is plain sample processing with no knowledge of tracks or
//! transport; the engine module wires these into nodes.

pub mod buffer;
#[cfg(feature = "decode")]
pub mod decode;
pub mod gain;
pub mod mixer;
pub mod reverb;
