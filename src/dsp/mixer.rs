//! Master sink — sums the reverb send output with master gain and soft clipping.

use super::gain::soft_clip;

/// Stereo summing bus. Tracks accumulate into it, the shared reverb is
/// applied in place, and `write_output` produces the final block.
#[derive(Debug, Clone)]
pub struct MasterBus {
    gain: f32,
    left: Vec<f32>,
    right: Vec<f32>,
}

impl MasterBus {
    pub fn new(gain: f64) -> Self {
        MasterBus {
            gain: gain.clamp(0.0, 1.0) as f32,
            left: Vec::new(),
            right: Vec::new(),
        }
    }

    /// Prepare a zeroed block of `frames` frames.
    pub fn clear(&mut self, frames: usize) {
        self.left.clear();
        self.left.resize(frames, 0.0);
        self.right.clear();
        self.right.resize(frames, 0.0);
    }

    /// Accumulate a stereo frame at the given index.
    #[inline]
    pub fn add(&mut self, index: usize, left: f32, right: f32) {
        if index < self.left.len() {
            self.left[index] += left;
            self.right[index] += right;
        }
    }

    /// Mutable access to both channels, for in-place processing.
    pub fn channels_mut(&mut self) -> (&mut [f32], &mut [f32]) {
        (&mut self.left, &mut self.right)
    }

    /// Write the block with master gain and soft clipping applied. Output
    /// slices longer than the block are zero-filled past its end.
    pub fn write_output(&self, out_l: &mut [f32], out_r: &mut [f32]) {
        for (i, o) in out_l.iter_mut().enumerate() {
            *o = self.left.get(i).map_or(0.0, |&s| soft_clip(s * self.gain));
        }
        for (i, o) in out_r.iter_mut().enumerate() {
            *o = self.right.get(i).map_or(0.0, |&s| soft_clip(s * self.gain));
        }
    }

    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }
}
