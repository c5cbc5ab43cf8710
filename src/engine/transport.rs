//! Shared play/stop state for the whole graph.
//!
//! There is one transport per mixer, not per track: every track starts and
//! stops together.

use serde::{Deserialize, Serialize};

use crate::error::MixError;

use super::context::{ContextState, OutputContext};
use super::graph::MixGraph;
use super::track::NodeState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
}

#[derive(Debug, Default)]
pub struct Transport {
    state: TransportState,
}

impl Transport {
    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    /// Start every track from the top. Returns whether the state changed.
    ///
    /// The context must be running first; a suspended context is resumed,
    /// and a refusal aborts the start with `PlaybackBlocked`.
    pub(crate) fn start(
        &mut self,
        graph: &mut MixGraph,
        context: &mut dyn OutputContext,
    ) -> Result<bool, MixError> {
        if self.is_playing() {
            return Ok(false);
        }
        ensure_running(context)?;

        for index in 0..graph.len() {
            start_track(graph, index);
        }
        self.state = TransportState::Playing;
        Ok(true)
    }

    /// Silence every source. Node pairs stay allocated for the next start.
    pub(crate) fn stop(&mut self, graph: Option<&mut MixGraph>) -> bool {
        if !self.is_playing() {
            return false;
        }
        if let Some(graph) = graph {
            for track in graph.tracks_mut() {
                if let NodeState::Allocated(pair) = &mut track.node {
                    pair.source.stop();
                }
            }
        }
        self.state = TransportState::Stopped;
        true
    }
}

/// Allocate the track's pair if needed and start it from the beginning.
/// Tracks without playable audio are skipped.
pub(crate) fn start_track(graph: &mut MixGraph, index: usize) {
    if !graph.ensure_allocated(index) {
        return;
    }
    if let Some(NodeState::Allocated(pair)) = graph.track_mut(index).map(|t| &mut t.node) {
        pair.source.start();
    }
}

fn ensure_running(context: &mut dyn OutputContext) -> Result<(), MixError> {
    match context.state() {
        ContextState::Running => return Ok(()),
        ContextState::Closed => {
            return Err(MixError::PlaybackBlocked {
                reason: "audio context is closed".to_string(),
            });
        }
        ContextState::Suspended => {}
    }
    log::debug!("resuming suspended audio context");
    context
        .resume()
        .map_err(|reason| MixError::PlaybackBlocked { reason })?;
    match context.state() {
        ContextState::Running => Ok(()),
        state => Err(MixError::PlaybackBlocked {
            reason: format!("audio context still {state} after resume"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryLoader;
    use crate::config::MixerConfig;
    use crate::dsp::buffer::AudioBuffer;
    use crate::engine::context::OfflineContext;
    use crate::engine::graph::GraphId;
    use crate::engine::node::NodeLedger;
    use crate::engine::track::{TrackSpec, TrackStatus};

    fn graph(ledger: &NodeLedger) -> MixGraph {
        let mut loader = MemoryLoader::new();
        let buf = AudioBuffer::from_interleaved(vec![0.5; 4800], 1, 48_000).unwrap();
        loader.insert("a.mp3", buf.clone());
        loader.insert("b.mp3", buf);
        let specs = [TrackSpec::new("Wind", "a.mp3"), TrackSpec::new("Rain", "b.mp3")];
        MixGraph::build(GraphId(1), &specs, &mut loader, &MixerConfig::default(), ledger, 48_000)
    }

    fn statuses(graph: &MixGraph) -> Vec<TrackStatus> {
        graph.tracks().iter().map(|t| t.status()).collect()
    }

    #[test]
    fn start_allocates_and_plays_everything() {
        let ledger = NodeLedger::new();
        let mut g = graph(&ledger);
        let mut ctx = OfflineContext::new(48_000);
        let mut transport = Transport::default();

        assert!(transport.start(&mut g, &mut ctx).unwrap());
        assert_eq!(transport.state(), TransportState::Playing);
        assert_eq!(statuses(&g), vec![TrackStatus::Playing; 2]);
        assert_eq!(g.allocated_pairs(), 2);
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let ledger = NodeLedger::new();
        let mut g = graph(&ledger);
        let mut ctx = OfflineContext::new(48_000);
        let mut transport = Transport::default();

        assert!(!transport.stop(Some(&mut g)));
        assert!(transport.start(&mut g, &mut ctx).unwrap());
        assert!(!transport.start(&mut g, &mut ctx).unwrap());
        assert!(transport.stop(Some(&mut g)));
        assert!(!transport.stop(Some(&mut g)));
        assert_eq!(statuses(&g), vec![TrackStatus::Stopped; 2]);
        assert_eq!(ledger.live(), 6);
    }

    #[test]
    fn suspended_context_is_resumed_first() {
        let ledger = NodeLedger::new();
        let mut g = graph(&ledger);
        let mut ctx = OfflineContext::suspended(48_000);
        let mut transport = Transport::default();

        transport.start(&mut g, &mut ctx).unwrap();
        assert_eq!(ctx.state(), ContextState::Running);
    }

    #[test]
    fn refused_resume_blocks_playback() {
        let ledger = NodeLedger::new();
        let mut g = graph(&ledger);
        let mut ctx = OfflineContext::blocked(48_000);
        let mut transport = Transport::default();

        let err = transport.start(&mut g, &mut ctx).unwrap_err();
        assert!(matches!(err, MixError::PlaybackBlocked { .. }));
        assert_eq!(transport.state(), TransportState::Stopped);
        assert_eq!(g.allocated_pairs(), 0);
    }
}
