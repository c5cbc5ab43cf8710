//! Parameter bridge: UI volume/pan values onto track state and live nodes.
//!
//! Inputs are clamped rather than rejected, so the stored value the UI reads
//! back is always the value the engine is using.

use crate::dsp::gain::{clamp_pan, clamp_volume};

use super::track::{NodeState, Track};

/// Store a clamped volume and push it to the pan node as dB if the node
/// exists. Returns the stored value.
pub(crate) fn apply_volume(track: &mut Track, value: f64) -> f64 {
    let volume = clamp_volume(value);
    track.set_volume(volume);
    if let NodeState::Allocated(pair) = &mut track.node {
        pair.pan.set_volume(volume);
    }
    volume
}

/// Store a clamped pan and push it to the pan node if the node exists.
/// Returns the stored value.
pub(crate) fn apply_pan(track: &mut Track, value: f64) -> f64 {
    let pan = clamp_pan(value);
    track.set_pan(pan);
    if let NodeState::Allocated(pair) = &mut track.node {
        pair.pan.set_pan(pan);
    }
    pan
}
