//! Mixer — the engine facade.
//!
//! Owns the output context, the current mix graph, the transport and the
//! subscriber list. All mutation goes through `&mut self`, so the single
//! owner (the UI thread, or the audio worklet in the browser build)
//! serialises every change; parameter updates are heard from the next
//! rendered block on.

use serde::Serialize;

use crate::assets::AssetLoader;
use crate::config::MixerConfig;
use crate::dsp::buffer::AudioBuffer;
use crate::error::{AssetError, MixError};
use crate::scene::{SoundElement, pair_tracks};

use super::context::OutputContext;
use super::events::{MixerEvent, SubscriptionId, Subscribers};
use super::graph::{GraphId, MixGraph};
use super::node::NodeLedger;
use super::params::{apply_pan, apply_volume};
use super::track::{TrackSnapshot, TrackSpec};
use super::transport::{Transport, TransportState, start_track};

/// What a UI needs to draw the mixer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MixerSnapshot {
    pub transport: TransportState,
    pub tracks: Vec<TrackSnapshot>,
}

#[derive(Debug)]
pub struct Mixer<C: OutputContext> {
    config: MixerConfig,
    context: C,
    graph: Option<MixGraph>,
    transport: Transport,
    subscribers: Subscribers,
    ledger: NodeLedger,
    next_graph: u64,
}

impl<C: OutputContext> Mixer<C> {
    pub fn new(config: MixerConfig, context: C) -> Self {
        Mixer {
            config,
            context,
            graph: None,
            transport: Transport::default(),
            subscribers: Subscribers::default(),
            ledger: NodeLedger::new(),
            next_graph: 1,
        }
    }

    pub fn config(&self) -> &MixerConfig {
        &self.config
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&MixerEvent) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    // ── Graph lifecycle ─────────────────────────────────────────

    /// Build a graph for `specs`, disposing any previous one first.
    ///
    /// Tracks whose audio cannot be loaded are flagged unavailable and
    /// announced with [`MixerEvent::AssetUnavailable`]; the build itself
    /// always succeeds.
    pub fn build(&mut self, specs: &[TrackSpec], loader: &mut dyn AssetLoader) -> GraphId {
        self.dispose();

        let id = GraphId(self.next_graph);
        self.next_graph += 1;
        let graph = MixGraph::build(
            id,
            specs,
            loader,
            &self.config,
            &self.ledger,
            self.context.sample_rate(),
        );
        log::info!("built mix graph {} with {} tracks", id.value(), graph.len());

        let failures: Vec<MixerEvent> = graph
            .tracks()
            .iter()
            .enumerate()
            .filter_map(|(index, track)| {
                track.asset_error().map(|e| MixerEvent::AssetUnavailable {
                    index,
                    name: track.name().to_string(),
                    reason: e.to_string(),
                })
            })
            .collect();
        let tracks = graph.len();
        self.graph = Some(graph);

        self.subscribers.notify(&MixerEvent::GraphBuilt { graph: id.value(), tracks });
        for event in &failures {
            self.subscribers.notify(event);
        }
        id
    }

    /// Pair a scene's sound elements with their synthesized audio URLs
    /// and build the graph from the result.
    pub fn build_from_scene(
        &mut self,
        elements: &[SoundElement],
        urls: &[String],
        loader: &mut dyn AssetLoader,
    ) -> Result<GraphId, MixError> {
        let specs = pair_tracks(elements, urls, &self.config)?;
        Ok(self.build(&specs, loader))
    }

    /// Release every node handle. Safe to call any number of times.
    pub fn dispose(&mut self) {
        let Some(graph) = self.graph.take() else {
            log::debug!("dispose: no live graph");
            return;
        };
        let id = graph.id();
        drop(graph);
        log::info!("disposed mix graph {}", id.value());

        if self.transport.stop(None) {
            self.notify_transport();
        }
        self.subscribers.notify(&MixerEvent::GraphDisposed { graph: id.value() });
    }

    pub fn graph_id(&self) -> Option<GraphId> {
        self.graph.as_ref().map(|g| g.id())
    }

    pub fn graph(&self) -> Option<&MixGraph> {
        self.graph.as_ref()
    }

    pub fn track_count(&self) -> usize {
        self.graph.as_ref().map_or(0, |g| g.len())
    }

    /// Node handles currently alive, shared reverb and master included.
    pub fn live_nodes(&self) -> usize {
        self.ledger.live()
    }

    // ── Late asset delivery ─────────────────────────────────────

    /// Hand over audio for a track that was deferred at build time.
    ///
    /// Ignored if `graph` is no longer the live graph. If the transport is
    /// already playing, the track starts immediately.
    pub fn deliver_asset(&mut self, graph: GraphId, index: usize, buffer: AudioBuffer) {
        let playing = self.transport.is_playing();
        let Some(g) = self.live_graph_mut(graph, "deliver_asset") else {
            return;
        };
        if !g.deliver(index, buffer) {
            log::debug!("deliver_asset: track {index} not awaiting audio");
            return;
        }
        if playing {
            start_track(g, index);
        }
        self.subscribers.notify(&MixerEvent::AssetReady { index });
    }

    /// Report that a deferred track's audio could not be loaded.
    pub fn fail_asset(&mut self, graph: GraphId, index: usize, error: AssetError) {
        let Some(g) = self.live_graph_mut(graph, "fail_asset") else {
            return;
        };
        let name = g.track(index).map(|t| t.name().to_string()).unwrap_or_default();
        let reason = error.to_string();
        if !g.fail(index, error) {
            log::debug!("fail_asset: track {index} not awaiting audio");
            return;
        }
        log::warn!("track '{name}' unavailable: {reason}");
        self.subscribers.notify(&MixerEvent::AssetUnavailable { index, name, reason });
    }

    fn live_graph_mut(&mut self, graph: GraphId, op: &str) -> Option<&mut MixGraph> {
        match self.graph.as_mut() {
            Some(g) if g.id() == graph => Some(g),
            _ => {
                log::debug!("{op}: graph {} is no longer live", graph.value());
                None
            }
        }
    }

    // ── Transport ───────────────────────────────────────────────

    /// Start all tracks together, resuming the output context if needed.
    ///
    /// A no-op when already playing or when no graph is live.
    pub fn start(&mut self) -> Result<(), MixError> {
        let Some(graph) = self.graph.as_mut() else {
            log::debug!("start: no live graph");
            return Ok(());
        };
        if self.transport.start(graph, &mut self.context)? {
            self.notify_transport();
        }
        Ok(())
    }

    /// Stop all tracks. Node pairs stay allocated.
    pub fn stop(&mut self) {
        if self.transport.stop(self.graph.as_mut()) {
            self.notify_transport();
        }
    }

    pub fn transport_state(&self) -> TransportState {
        self.transport.state()
    }

    fn notify_transport(&mut self) {
        self.subscribers.notify(&MixerEvent::Transport {
            state: self.transport.state(),
        });
    }

    // ── Parameters ──────────────────────────────────────────────

    /// Set a track's linear volume; clamped to `[0, 1]`.
    pub fn set_volume(&mut self, index: usize, value: f64) {
        let Some(track) = self.graph.as_mut().and_then(|g| g.track_mut(index)) else {
            log::debug!("set_volume: no track {index} in a live graph");
            return;
        };
        let volume = apply_volume(track, value);
        self.subscribers.notify(&MixerEvent::Volume { index, volume });
    }

    /// Set a track's pan; clamped to `[-1, 1]`.
    pub fn set_pan(&mut self, index: usize, value: f64) {
        let Some(track) = self.graph.as_mut().and_then(|g| g.track_mut(index)) else {
            log::debug!("set_pan: no track {index} in a live graph");
            return;
        };
        let pan = apply_pan(track, value);
        self.subscribers.notify(&MixerEvent::Pan { index, pan });
    }

    pub fn volume(&self, index: usize) -> Option<f64> {
        self.graph.as_ref()?.track(index).map(|t| t.volume())
    }

    pub fn pan(&self, index: usize) -> Option<f64> {
        self.graph.as_ref()?.track(index).map(|t| t.pan())
    }

    /// Linear gain the track renders at, read back from its node if allocated.
    pub fn effective_gain(&self, index: usize) -> Option<f64> {
        self.graph.as_ref()?.track(index).map(|t| t.effective_gain())
    }

    pub fn effective_pan(&self, index: usize) -> Option<f64> {
        self.graph.as_ref()?.track(index).map(|t| t.effective_pan())
    }

    // ── Output ──────────────────────────────────────────────────

    /// Render one block of stereo output. Silence when there is no graph or
    /// the context is not running.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        use super::context::ContextState;

        match self.graph.as_mut() {
            Some(graph) if self.context.state() == ContextState::Running => {
                graph.render(left, right)
            }
            _ => {
                left.fill(0.0);
                right.fill(0.0);
            }
        }
    }

    pub fn snapshot(&self) -> MixerSnapshot {
        MixerSnapshot {
            transport: self.transport.state(),
            tracks: self
                .graph
                .as_ref()
                .map(|g| g.tracks().iter().map(TrackSnapshot::from).collect())
                .unwrap_or_default(),
        }
    }
}
