//! Shared reverb send — Schroeder/Freeverb-style stereo reverb.
//!
//! Every track feeds this single stage before the master sink. It is
//! configured once when the graph is built; tracks only ever connect to it.

use crate::config::ReverbConfig;

/// Lowpass-damped feedback comb filter.
#[derive(Debug, Clone)]
struct Comb {
    line: Vec<f32>,
    pos: usize,
    feedback: f32,
    damp: f32,
    store: f32,
}

impl Comb {
    fn new(len: usize, feedback: f32, damp: f32) -> Self {
        Self {
            line: vec![0.0; len.max(1)],
            pos: 0,
            feedback,
            damp,
            store: 0.0,
        }
    }

    #[inline]
    fn tick(&mut self, input: f32) -> f32 {
        let out = self.line[self.pos];
        self.store = out * (1.0 - self.damp) + self.store * self.damp;
        self.line[self.pos] = input + self.store * self.feedback;
        self.pos = (self.pos + 1) % self.line.len();
        out
    }
}

#[derive(Debug, Clone)]
struct Allpass {
    line: Vec<f32>,
    pos: usize,
}

impl Allpass {
    const FEEDBACK: f32 = 0.5;

    fn new(len: usize) -> Self {
        Self {
            line: vec![0.0; len.max(1)],
            pos: 0,
        }
    }

    #[inline]
    fn tick(&mut self, input: f32) -> f32 {
        let delayed = self.line[self.pos];
        self.line[self.pos] = input + delayed * Self::FEEDBACK;
        self.pos = (self.pos + 1) % self.line.len();
        delayed - input
    }
}

/// One side of the stereo tank: parallel combs into series allpasses.
#[derive(Debug, Clone)]
struct Tank {
    combs: Vec<Comb>,
    allpasses: Vec<Allpass>,
}

impl Tank {
    fn new(scale: f64, spread: usize, feedback: f32, damp: f32) -> Self {
        let len = |tuning: usize| ((tuning + spread) as f64 * scale) as usize;
        Self {
            combs: COMB_TUNING.iter().map(|&t| Comb::new(len(t), feedback, damp)).collect(),
            allpasses: ALLPASS_TUNING.iter().map(|&t| Allpass::new(len(t))).collect(),
        }
    }

    #[inline]
    fn tick(&mut self, input: f32) -> f32 {
        let mut out: f32 = self.combs.iter_mut().map(|c| c.tick(input)).sum();
        for ap in &mut self.allpasses {
            out = ap.tick(out);
        }
        out
    }
}

// Delay lengths in samples at 44.1 kHz
const COMB_TUNING: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
const ALLPASS_TUNING: [usize; 4] = [556, 441, 341, 225];
const STEREO_SPREAD: usize = 23;
const INPUT_GAIN: f32 = 0.015;

#[derive(Debug, Clone)]
pub struct ReverbSend {
    left: Tank,
    right: Tank,
    wet: f32,
}

impl ReverbSend {
    pub fn new(sample_rate: u32, config: &ReverbConfig) -> Self {
        let scale = sample_rate as f64 / 44_100.0;
        let feedback = (config.room_size.clamp(0.0, 1.0) * 0.28 + 0.7) as f32;
        let damp = config.damping.clamp(0.0, 1.0) as f32;
        Self {
            left: Tank::new(scale, 0, feedback, damp),
            right: Tank::new(scale, STEREO_SPREAD, feedback, damp),
            wet: config.wet.clamp(0.0, 1.0) as f32,
        }
    }

    /// Process one stereo frame.
    #[inline]
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        if self.wet == 0.0 {
            return (left, right);
        }
        let input = (left + right) * INPUT_GAIN;
        let wet_l = self.left.tick(input);
        let wet_r = self.right.tick(input);
        let dry = 1.0 - self.wet;
        (left * dry + wet_l * self.wet, right * dry + wet_r * self.wet)
    }

    /// Process a block of stereo audio in-place.
    pub fn process_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            (*l, *r) = self.process(*l, *r);
        }
    }
}
