//! Live audio nodes and the handles that account for them.
//!
//! Every node owns a [`NodeHandle`]. Handles are counted by a
//! [`NodeLedger`] and released in `Drop`, so a node is freed exactly once on
//! every exit path: explicit disposal, a rebuild, or the mixer going away.

use std::cell::Cell;
use std::rc::Rc;

use crate::config::MixerConfig;
use crate::dsp::buffer::AudioBuffer;
use crate::dsp::gain::{db_to_gain, gain_to_db, pan_stereo};
use crate::dsp::mixer::MasterBus;
use crate::dsp::reverb::ReverbSend;

/// Counts live node handles.
#[derive(Debug, Clone, Default)]
pub struct NodeLedger {
    live: Rc<Cell<usize>>,
}

impl NodeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live(&self) -> usize {
        self.live.get()
    }

    pub(crate) fn acquire(&self) -> NodeHandle {
        self.live.set(self.live.get() + 1);
        NodeHandle {
            live: Rc::clone(&self.live),
        }
    }
}

/// Proof of one allocated node. Not `Clone`: dropping it releases the node.
#[derive(Debug)]
pub struct NodeHandle {
    live: Rc<Cell<usize>>,
}

impl Drop for NodeHandle {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

/// Plays a decoded buffer once from the beginning.
#[derive(Debug)]
pub struct SourceNode {
    _handle: NodeHandle,
    buffer: AudioBuffer,
    /// Read position in source frames.
    position: f64,
    /// Source frames advanced per output frame.
    step: f64,
    playing: bool,
}

impl SourceNode {
    fn new(handle: NodeHandle, buffer: AudioBuffer, output_rate: u32) -> Self {
        let step = buffer.sample_rate() as f64 / output_rate.max(1) as f64;
        SourceNode {
            _handle: handle,
            buffer,
            position: 0.0,
            step,
            playing: false,
        }
    }

    /// Start (or restart) from the first frame.
    pub fn start(&mut self) {
        self.position = 0.0;
        self.playing = !self.buffer.is_empty();
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    #[inline]
    fn next_frame(&mut self) -> (f32, f32) {
        if !self.playing {
            return (0.0, 0.0);
        }
        let frame = self.buffer.read_interpolated(self.position);
        self.position += self.step;
        if self.position >= self.buffer.frames() as f64 {
            self.playing = false;
        }
        frame
    }
}

/// Gain (in dB) and stereo pan for one track.
#[derive(Debug)]
pub struct PanNode {
    _handle: NodeHandle,
    gain_db: f64,
    muted: bool,
    pan: f64,
}

impl PanNode {
    fn new(handle: NodeHandle, volume: f64, pan: f64) -> Self {
        let mut node = PanNode {
            _handle: handle,
            gain_db: 0.0,
            muted: false,
            pan,
        };
        node.set_volume(volume);
        node
    }

    pub fn gain_db(&self) -> f64 {
        self.gain_db
    }

    /// Linear gain currently applied.
    pub fn effective_gain(&self) -> f64 {
        if self.muted { 0.0 } else { db_to_gain(self.gain_db) }
    }

    pub fn pan(&self) -> f64 {
        self.pan
    }

    /// Set the gain from a linear volume. Zero mutes the node and reports
    /// the silence floor as its dB value.
    pub(crate) fn set_volume(&mut self, volume: f64) {
        self.muted = volume <= 0.0;
        self.gain_db = gain_to_db(volume);
    }

    pub(crate) fn set_pan(&mut self, pan: f64) {
        self.pan = pan;
    }

    #[inline]
    fn process(&self, gain: f32, left: f32, right: f32) -> (f32, f32) {
        pan_stereo(self.pan, left * gain, right * gain)
    }
}

/// A track's source and pan node, allocated and released together.
#[derive(Debug)]
pub struct NodePair {
    pub source: SourceNode,
    pub pan: PanNode,
}

impl NodePair {
    pub(crate) fn allocate(
        ledger: &NodeLedger,
        buffer: AudioBuffer,
        output_rate: u32,
        volume: f64,
        pan: f64,
    ) -> Self {
        NodePair {
            source: SourceNode::new(ledger.acquire(), buffer, output_rate),
            pan: PanNode::new(ledger.acquire(), volume, pan),
        }
    }

    /// Render this pair's contribution into the bus.
    pub(crate) fn render_into(&mut self, bus: &mut MasterBus, frames: usize) {
        if !self.source.is_playing() {
            return;
        }
        let gain = self.pan.effective_gain() as f32;
        for i in 0..frames {
            let (l, r) = self.source.next_frame();
            let (l, r) = self.pan.process(gain, l, r);
            bus.add(i, l, r);
            if !self.source.is_playing() {
                break;
            }
        }
    }
}

/// The shared reverb send and master sink every track feeds.
#[derive(Debug)]
pub struct SharedBus {
    _reverb_handle: NodeHandle,
    _master_handle: NodeHandle,
    reverb: ReverbSend,
    master: MasterBus,
}

impl SharedBus {
    pub(crate) fn new(ledger: &NodeLedger, sample_rate: u32, config: &MixerConfig) -> Self {
        SharedBus {
            _reverb_handle: ledger.acquire(),
            _master_handle: ledger.acquire(),
            reverb: ReverbSend::new(sample_rate, &config.reverb),
            master: MasterBus::new(config.master_gain),
        }
    }

    pub(crate) fn begin_block(&mut self, frames: usize) -> &mut MasterBus {
        self.master.clear(frames);
        &mut self.master
    }

    /// Run the summed block through the reverb and out of the master sink.
    pub(crate) fn finish_block(&mut self, out_l: &mut [f32], out_r: &mut [f32]) {
        let (left, right) = self.master.channels_mut();
        self.reverb.process_block(left, right);
        self.master.write_output(out_l, out_r);
    }
}
