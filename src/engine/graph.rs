//! Mix graph: ordered tracks fanning into one shared reverb send and the
//! master sink.
//!
//! ```text
//! source[0] -> pan[0] --\
//! source[1] -> pan[1] ----> reverb send -> master sink
//! source[n] -> pan[n] --/
//! ```
//!
//! The graph owns every node handle it creates. Dropping it releases all of
//! them, which is how disposal is implemented.

use crate::assets::{AssetLoader, LoadOutcome};
use crate::config::MixerConfig;
use crate::dsp::buffer::AudioBuffer;
use crate::error::AssetError;

use super::node::{NodeLedger, NodePair, SharedBus};
use super::track::{AssetState, NodeState, Track, TrackSpec};

/// Identifies one build of the graph. A new id is issued on every build, so
/// late results addressed to a disposed graph can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphId(pub(crate) u64);

impl GraphId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
pub struct MixGraph {
    id: GraphId,
    tracks: Vec<Track>,
    /// `None` when the graph has no tracks.
    shared: Option<SharedBus>,
    ledger: NodeLedger,
    sample_rate: u32,
}

impl MixGraph {
    /// Bind every spec to its audio. Asset failures are recorded on the
    /// track, never returned: one bad clip must not take down the mix.
    pub(crate) fn build(
        id: GraphId,
        specs: &[TrackSpec],
        loader: &mut dyn AssetLoader,
        config: &MixerConfig,
        ledger: &NodeLedger,
        sample_rate: u32,
    ) -> Self {
        let tracks = specs
            .iter()
            .map(|spec| {
                let asset = match loader.load(&spec.source_url) {
                    Ok(LoadOutcome::Ready(buffer)) => AssetState::Ready(buffer),
                    Ok(LoadOutcome::Deferred) => AssetState::Pending,
                    Err(e) => {
                        log::warn!("track '{}' unavailable: {e}", spec.name);
                        AssetState::Unavailable(e)
                    }
                };
                Track::new(spec, asset)
            })
            .collect::<Vec<_>>();

        let shared = (!tracks.is_empty()).then(|| SharedBus::new(ledger, sample_rate, config));

        MixGraph {
            id,
            tracks,
            shared,
            ledger: ledger.clone(),
            sample_rate,
        }
    }

    pub fn id(&self) -> GraphId {
        self.id
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub(crate) fn track_mut(&mut self, index: usize) -> Option<&mut Track> {
        self.tracks.get_mut(index)
    }

    pub(crate) fn tracks_mut(&mut self) -> &mut [Track] {
        &mut self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Allocate the node pair for a track if its audio is ready and it has
    /// none yet. Returns whether the track now has a pair.
    pub(crate) fn ensure_allocated(&mut self, index: usize) -> bool {
        let ledger = &self.ledger;
        let sample_rate = self.sample_rate;
        let Some(track) = self.tracks.get_mut(index) else {
            return false;
        };
        if track.is_allocated() {
            return true;
        }
        let AssetState::Ready(buffer) = &track.asset else {
            return false;
        };
        let pair = NodePair::allocate(ledger, buffer.clone(), sample_rate, track.volume(), track.pan());
        track.node = NodeState::Allocated(pair);
        true
    }

    /// Attach audio that arrived after the build. Returns `false` if the
    /// track already had audio (the first answer wins).
    pub(crate) fn deliver(&mut self, index: usize, buffer: AudioBuffer) -> bool {
        match self.tracks.get_mut(index) {
            Some(track) if matches!(track.asset, AssetState::Pending) => {
                track.asset = AssetState::Ready(buffer);
                true
            }
            _ => false,
        }
    }

    /// Mark a pending track as unavailable.
    pub(crate) fn fail(&mut self, index: usize, error: AssetError) -> bool {
        match self.tracks.get_mut(index) {
            Some(track) if matches!(track.asset, AssetState::Pending) => {
                track.asset = AssetState::Unavailable(error);
                true
            }
            _ => false,
        }
    }

    /// Number of tracks with a live node pair.
    pub fn allocated_pairs(&self) -> usize {
        self.tracks.iter().filter(|t| t.is_allocated()).count()
    }

    /// Render one block into `out_l`/`out_r`. Silence if nothing is playing.
    pub(crate) fn render(&mut self, out_l: &mut [f32], out_r: &mut [f32]) {
        let frames = out_l.len().min(out_r.len());
        let Some(shared) = self.shared.as_mut() else {
            out_l.fill(0.0);
            out_r.fill(0.0);
            return;
        };

        let bus = shared.begin_block(frames);
        for track in &mut self.tracks {
            if let NodeState::Allocated(pair) = &mut track.node {
                pair.render_into(bus, frames);
            }
        }
        shared.finish_block(out_l, out_r);
    }
}
