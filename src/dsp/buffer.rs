//! Decoded audio held in memory for a track's source node.

use std::sync::Arc;

/// Interleaved f32 PCM at its native sample rate.
///
/// Cloning is cheap; the sample data is shared.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    data: Arc<[f32]>,
    channels: u16,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Wrap interleaved samples. Returns `None` for zero channels, a zero
    /// sample rate, or a sample count that is not a whole number of frames.
    pub fn from_interleaved(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Option<Self> {
        if channels == 0 || sample_rate == 0 || samples.len() % channels as usize != 0 {
            return None;
        }
        Some(AudioBuffer {
            data: samples.into(),
            channels,
            sample_rate,
        })
    }

    /// Create from interleaved 16-bit signed PCM.
    pub fn from_i16(pcm: &[i16], channels: u16, sample_rate: u32) -> Option<Self> {
        let samples = pcm.iter().map(|&s| s as f32 / 32768.0).collect();
        Self::from_interleaved(samples, channels, sample_rate)
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.data.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Stereo view of one frame. Mono is duplicated; channels past the
    /// second are ignored.
    #[inline]
    fn frame(&self, index: usize) -> (f32, f32) {
        let base = index * self.channels as usize;
        let left = self.data[base];
        let right = if self.channels > 1 { self.data[base + 1] } else { left };
        (left, right)
    }

    /// Read a stereo frame with linear interpolation at a fractional
    /// position. Positions outside the buffer read as silence.
    pub fn read_interpolated(&self, position: f64) -> (f32, f32) {
        let frames = self.frames();
        if frames == 0 || position < 0.0 {
            return (0.0, 0.0);
        }

        let idx = position as usize;
        if idx >= frames - 1 {
            return if idx < frames { self.frame(idx) } else { (0.0, 0.0) };
        }

        let frac = (position - idx as f64) as f32;
        let (l0, r0) = self.frame(idx);
        let (l1, r1) = self.frame(idx + 1);
        (l0 + (l1 - l0) * frac, r0 + (r1 - r0) * frac)
    }
}
