//! End-to-end mixer scenarios: build, transport, parameters, teardown.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use approx::{assert_abs_diff_eq, assert_relative_eq};

use crate::assets::{DeferredLoader, MemoryLoader};
use crate::config::{MixerConfig, PairingPolicy};
use crate::dsp::buffer::AudioBuffer;
use crate::error::{AssetError, MixError};
use crate::scene::SoundElement;

use super::*;

const RATE: u32 = 48_000;

fn clip(level: f32) -> AudioBuffer {
    AudioBuffer::from_interleaved(vec![level; RATE as usize], 1, RATE).unwrap()
}

fn loader() -> MemoryLoader {
    let mut loader = MemoryLoader::new();
    loader.insert("a.mp3", clip(0.5));
    loader.insert("b.mp3", clip(0.25));
    loader.insert("c.mp3", clip(0.1));
    loader
}

fn wind_and_rain() -> Vec<TrackSpec> {
    vec![
        TrackSpec::new("Wind", "a.mp3").with_volume(0.5).with_pan(0.0),
        TrackSpec::new("Rain", "b.mp3").with_volume(0.8).with_pan(-0.3),
    ]
}

fn mixer() -> Mixer<OfflineContext> {
    Mixer::new(MixerConfig::default(), OfflineContext::new(RATE))
}

fn recorder(mixer: &mut Mixer<impl OutputContext>) -> Rc<RefCell<Vec<MixerEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    mixer.subscribe(move |e| sink.borrow_mut().push(e.clone()));
    events
}

fn playing(mixer: &Mixer<impl OutputContext>) -> BTreeSet<String> {
    mixer
        .snapshot()
        .tracks
        .into_iter()
        .filter(|t| t.status == TrackStatus::Playing)
        .map(|t| t.name)
        .collect()
}

fn render_peak(mixer: &mut Mixer<impl OutputContext>, frames: usize) -> f32 {
    let mut left = vec![0.0f32; frames];
    let mut right = vec![0.0f32; frames];
    mixer.render(&mut left, &mut right);
    left.iter().chain(right.iter()).fold(0.0f32, |m, s| m.max(s.abs()))
}

#[test]
fn wind_and_rain_scenario() {
    let mut m = mixer();
    m.build(&wind_and_rain(), &mut loader());
    m.start().unwrap();

    let snap = m.snapshot();
    assert_eq!(snap.transport, TransportState::Playing);
    assert!(snap.tracks.iter().all(|t| t.status == TrackStatus::Playing));

    m.set_volume(0, 1.2);
    assert_eq!(m.volume(0), Some(1.0));
    m.set_pan(1, -2.0);
    assert_eq!(m.pan(1), Some(-1.0));

    m.stop();
    assert_eq!(m.transport_state(), TransportState::Stopped);
    let snap = m.snapshot();
    assert!(snap.tracks.iter().all(|t| t.status == TrackStatus::Stopped));
    // reverb + master + two (source, pan) pairs
    assert_eq!(m.live_nodes(), 6);
    assert_eq!(render_peak(&mut m, 256), 0.0);

    m.dispose();
    assert_eq!(m.live_nodes(), 0);
    assert_eq!(m.track_count(), 0);
}

#[test]
fn volume_read_back_for_any_input() {
    let mut m = mixer();
    m.build(&wind_and_rain(), &mut loader());
    for started in [false, true] {
        if started {
            m.start().unwrap();
        }
        for v in [-1.0, 0.0, 1e-7, 5e-6, 1e-5, 0.001, 0.2, 0.5, 0.75, 1.0, 1.2, 7.5] {
            m.set_volume(0, v);
            assert_eq!(m.volume(0), Some(v.clamp(0.0, 1.0)));
            assert_relative_eq!(
                m.effective_gain(0).unwrap(),
                v.clamp(0.0, 1.0),
                max_relative = 1e-9
            );
        }
    }
}

#[test]
fn pan_read_back_for_any_input() {
    let mut m = mixer();
    m.build(&wind_and_rain(), &mut loader());
    for started in [false, true] {
        if started {
            m.start().unwrap();
        }
        for p in [-3.0, -1.0, -0.5, 0.0, 0.25, 1.0, 1.5] {
            m.set_pan(1, p);
            assert_eq!(m.effective_pan(1), Some(p.clamp(-1.0, 1.0)));
        }
    }
}

#[test]
fn parameters_set_before_start_apply_at_allocation() {
    let mut m = mixer();
    m.build(&wind_and_rain(), &mut loader());
    m.set_volume(1, 0.3);
    m.set_pan(1, 0.9);
    m.start().unwrap();
    let node = match &m.graph().unwrap().track(1).unwrap().node {
        track::NodeState::Allocated(pair) => (pair.pan.effective_gain(), pair.pan.pan()),
        track::NodeState::Uninitialized => panic!("track should be allocated after start"),
    };
    assert_abs_diff_eq!(node.0, 0.3, epsilon = 1e-9);
    assert_eq!(node.1, 0.9);
}

#[test]
fn restart_plays_the_same_tracks() {
    let mut m = mixer();
    m.build(&wind_and_rain(), &mut loader());
    m.start().unwrap();
    let first = playing(&m);
    m.stop();
    assert!(playing(&m).is_empty());
    m.start().unwrap();
    assert_eq!(playing(&m), first);
    assert_eq!(first.len(), 2);
    assert_eq!(m.live_nodes(), 6);
}

#[test]
fn double_dispose_is_harmless() {
    let mut m = mixer();
    m.build(&wind_and_rain(), &mut loader());
    m.start().unwrap();
    let events = recorder(&mut m);
    m.dispose();
    m.dispose();
    assert_eq!(m.live_nodes(), 0);
    let disposed = events
        .borrow()
        .iter()
        .filter(|e| matches!(e, MixerEvent::GraphDisposed { .. }))
        .count();
    assert_eq!(disposed, 1);
    assert_eq!(m.transport_state(), TransportState::Stopped);
}

#[test]
fn mutators_after_dispose_are_no_ops() {
    let mut m = mixer();
    m.build(&wind_and_rain(), &mut loader());
    m.dispose();
    m.set_volume(0, 0.2);
    m.set_pan(0, 0.2);
    m.stop();
    m.start().unwrap();
    assert_eq!(m.transport_state(), TransportState::Stopped);
    assert_eq!(m.volume(0), None);
    assert_eq!(m.live_nodes(), 0);
}

#[test]
fn rebuild_disposes_previous_graph_first() {
    let mut m = mixer();
    let first = m.build(&wind_and_rain(), &mut loader());
    m.start().unwrap();
    assert_eq!(m.live_nodes(), 6);

    let second = m.build(&[TrackSpec::new("Birds", "c.mp3")], &mut loader());
    assert_ne!(first, second);
    assert_eq!(m.track_count(), 1);
    assert_eq!(m.live_nodes(), 2);
    assert_eq!(m.transport_state(), TransportState::Stopped);

    m.start().unwrap();
    assert_eq!(m.live_nodes(), 4);
}

#[test]
fn three_elements_two_urls_gives_two_tracks() {
    let mut m = mixer();
    let elements: Vec<SoundElement> = ["Wind", "Rain", "Thunder"]
        .iter()
        .map(|n| SoundElement {
            name: n.to_string(),
            description: String::new(),
        })
        .collect();
    let urls = vec!["a.mp3".to_string(), "b.mp3".to_string()];
    m.build_from_scene(&elements, &urls, &mut loader()).unwrap();
    assert_eq!(m.track_count(), 2);
    assert_eq!(m.snapshot().tracks[1].name, "Rain");
}

#[test]
fn strict_pairing_refuses_to_build() {
    let config = MixerConfig {
        pairing: PairingPolicy::Strict,
        ..MixerConfig::default()
    };
    let mut m = Mixer::new(config, OfflineContext::new(RATE));
    let elements = vec![SoundElement {
        name: "Wind".to_string(),
        description: String::new(),
    }];
    let err = m.build_from_scene(&elements, &[], &mut loader()).unwrap_err();
    assert!(matches!(err, MixError::CountMismatch { elements: 1, urls: 0 }));
    assert!(m.graph().is_none());
}

#[test]
fn empty_graph_still_starts() {
    let mut m = mixer();
    let events = recorder(&mut m);
    m.build(&[], &mut loader());
    m.start().unwrap();
    assert_eq!(m.transport_state(), TransportState::Playing);
    assert_eq!(m.live_nodes(), 0);
    assert_eq!(render_peak(&mut m, 128), 0.0);
    assert!(events.borrow().contains(&MixerEvent::Transport {
        state: TransportState::Playing
    }));
}

#[test]
fn invalid_url_is_isolated() {
    let mut m = mixer();
    let events = recorder(&mut m);
    let specs = vec![
        TrackSpec::new("Wind", "a.mp3"),
        TrackSpec::new("Broken", "nope.mp3"),
        TrackSpec::new("Rain", "b.mp3"),
    ];
    m.build(&specs, &mut loader());
    assert_eq!(m.track_count(), 3);

    m.start().unwrap();
    let statuses: Vec<_> = m.snapshot().tracks.iter().map(|t| t.status).collect();
    assert_eq!(
        statuses,
        vec![TrackStatus::Playing, TrackStatus::Unavailable, TrackStatus::Playing]
    );
    assert!(render_peak(&mut m, 256) > 0.0);
    assert!(events.borrow().iter().any(|e| matches!(
        e,
        MixerEvent::AssetUnavailable { index: 1, name, .. } if name == "Broken"
    )));
}

#[test]
fn suspended_context_resumes_on_start() {
    let mut m = Mixer::new(MixerConfig::default(), OfflineContext::suspended(RATE));
    m.build(&wind_and_rain(), &mut loader());
    assert_eq!(render_peak(&mut m, 64), 0.0);
    m.start().unwrap();
    assert_eq!(m.context().state(), ContextState::Running);
    assert!(render_peak(&mut m, 256) > 0.0);
}

#[test]
fn interrupted_context_is_resumed_by_the_next_start() {
    let mut m = mixer();
    m.build(&wind_and_rain(), &mut loader());
    m.start().unwrap();
    assert!(render_peak(&mut m, 64) > 0.0);

    m.context_mut().suspend();
    assert_eq!(render_peak(&mut m, 64), 0.0);
    assert_eq!(m.transport_state(), TransportState::Playing);

    m.stop();
    m.start().unwrap();
    assert_eq!(m.context().state(), ContextState::Running);
    assert!(render_peak(&mut m, 256) > 0.0);
}

#[test]
fn refused_resume_reports_playback_blocked() {
    let mut m = Mixer::new(MixerConfig::default(), OfflineContext::blocked(RATE));
    let events = recorder(&mut m);
    m.build(&wind_and_rain(), &mut loader());
    let err = m.start().unwrap_err();
    assert!(matches!(err, MixError::PlaybackBlocked { .. }));
    assert_eq!(m.transport_state(), TransportState::Stopped);
    assert!(!events.borrow().iter().any(|e| matches!(e, MixerEvent::Transport { .. })));
}

#[test]
fn volume_changes_are_heard_on_next_block() {
    let mut m = mixer();
    m.build(&[TrackSpec::new("Wind", "a.mp3")], &mut loader());
    m.start().unwrap();
    let loud = render_peak(&mut m, 512);
    m.set_volume(0, 0.0);
    // let the reverb tail die away
    for _ in 0..200 {
        render_peak(&mut m, 512);
    }
    let quiet = render_peak(&mut m, 512);
    assert!(loud > 0.1);
    assert!(quiet < 1e-3, "muted track still audible: {quiet}");
}

#[test]
fn pan_moves_energy_between_channels() {
    let config = MixerConfig {
        reverb: crate::config::ReverbConfig { wet: 0.0, ..Default::default() },
        ..MixerConfig::default()
    };
    let mut m = Mixer::new(config, OfflineContext::new(RATE));
    m.build(&[TrackSpec::new("Wind", "a.mp3").with_pan(-1.0)], &mut loader());
    m.start().unwrap();
    let mut left = vec![0.0f32; 64];
    let mut right = vec![0.0f32; 64];
    m.render(&mut left, &mut right);
    assert!(left[10] > 0.1);
    assert_abs_diff_eq!(right[10], 0.0, epsilon = 1e-6);
}

#[test]
fn deferred_assets_arrive_later() {
    let mut m = Mixer::new(MixerConfig::default(), HostContext::new(RATE));
    let events = recorder(&mut m);
    let graph = m.build(&wind_and_rain(), &mut DeferredLoader);
    assert!(m.snapshot().tracks.iter().all(|t| t.status == TrackStatus::Pending));

    m.context_mut().set_state(ContextState::Running);
    m.start().unwrap();
    assert!(playing(&m).is_empty());

    m.deliver_asset(graph, 0, clip(0.5));
    assert_eq!(m.snapshot().tracks[0].status, TrackStatus::Playing);

    m.fail_asset(graph, 1, AssetError::Unreachable {
        url: "b.mp3".to_string(),
        reason: "timed out".to_string(),
    });
    assert_eq!(m.snapshot().tracks[1].status, TrackStatus::Unavailable);
    assert!(events.borrow().contains(&MixerEvent::AssetReady { index: 0 }));
}

#[test]
fn late_delivery_to_disposed_graph_is_dropped() {
    let mut m = mixer();
    let stale = m.build(&wind_and_rain(), &mut DeferredLoader);
    let fresh = m.build(&wind_and_rain(), &mut DeferredLoader);
    m.deliver_asset(stale, 0, clip(0.5));
    assert_eq!(m.snapshot().tracks[0].status, TrackStatus::Pending);
    m.start().unwrap();
    m.deliver_asset(fresh, 0, clip(0.5));
    assert_eq!(m.snapshot().tracks[0].status, TrackStatus::Playing);
    m.dispose();
    m.deliver_asset(fresh, 1, clip(0.5));
    assert_eq!(m.live_nodes(), 0);
}

#[test]
fn parameter_events_carry_clamped_values() {
    let mut m = mixer();
    let events = recorder(&mut m);
    m.build(&wind_and_rain(), &mut loader());
    m.set_volume(0, -4.0);
    m.set_pan(1, 3.0);
    let events = events.borrow();
    assert!(events.contains(&MixerEvent::Volume { index: 0, volume: 0.0 }));
    assert!(events.contains(&MixerEvent::Pan { index: 1, pan: 1.0 }));
}

#[test]
fn snapshot_serializes_for_the_ui() {
    let mut m = mixer();
    m.build(&wind_and_rain(), &mut loader());
    m.start().unwrap();
    let json = serde_json::to_value(m.snapshot()).unwrap();
    assert_eq!(json["transport"], "playing");
    assert_eq!(json["tracks"][1]["name"], "Rain");
    assert_eq!(json["tracks"][1]["status"], "playing");
    assert_eq!(json["tracks"][1]["sourceUrl"], "b.mp3");
}
