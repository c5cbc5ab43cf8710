use serde::{Deserialize, Serialize};

use crate::dsp::buffer::AudioBuffer;
use crate::dsp::gain::{clamp_pan, clamp_volume, rendered_gain};
use crate::error::AssetError;

use super::node::NodePair;

/// Input to the graph builder: one named clip and its initial mix settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSpec {
    pub name: String,
    pub source_url: String,
    #[serde(default = "unity")]
    pub volume: f64,
    #[serde(default)]
    pub pan: f64,
}

fn unity() -> f64 {
    1.0
}

impl TrackSpec {
    pub fn new(name: impl Into<String>, source_url: impl Into<String>) -> Self {
        TrackSpec {
            name: name.into(),
            source_url: source_url.into(),
            volume: 1.0,
            pan: 0.0,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_pan(mut self, pan: f64) -> Self {
        self.pan = pan;
        self
    }
}

/// Where a track's decoded audio stands.
#[derive(Debug, Clone)]
pub enum AssetState {
    /// The host is still fetching/decoding it.
    Pending,
    Ready(AudioBuffer),
    Unavailable(AssetError),
}

/// Whether the track's node pair exists yet.
#[derive(Debug, Default)]
pub enum NodeState {
    #[default]
    Uninitialized,
    Allocated(NodePair),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackStatus {
    /// Audio not delivered yet.
    Pending,
    /// Audio failed to load or decode; the track stays silent.
    Unavailable,
    /// Audio ready, nodes not allocated (before the first start).
    Unallocated,
    /// Nodes allocated, source not sounding.
    Stopped,
    Playing,
}

#[derive(Debug)]
pub struct Track {
    name: String,
    source_url: String,
    volume: f64,
    pan: f64,
    pub(crate) asset: AssetState,
    pub(crate) node: NodeState,
}

impl Track {
    pub(crate) fn new(spec: &TrackSpec, asset: AssetState) -> Self {
        Track {
            name: spec.name.clone(),
            source_url: spec.source_url.clone(),
            volume: clamp_volume(spec.volume),
            pan: clamp_pan(spec.pan),
            asset,
            node: NodeState::Uninitialized,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Stored linear volume in `[0, 1]`.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Stored pan in `[-1, 1]`.
    pub fn pan(&self) -> f64 {
        self.pan
    }

    /// Linear gain the track is (or will be) rendered at.
    pub fn effective_gain(&self) -> f64 {
        match &self.node {
            NodeState::Allocated(pair) => pair.pan.effective_gain(),
            NodeState::Uninitialized => rendered_gain(self.volume),
        }
    }

    /// Pan the track is (or will be) rendered at.
    pub fn effective_pan(&self) -> f64 {
        match &self.node {
            NodeState::Allocated(pair) => pair.pan.pan(),
            NodeState::Uninitialized => self.pan,
        }
    }

    pub fn asset_error(&self) -> Option<&AssetError> {
        match &self.asset {
            AssetState::Unavailable(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_allocated(&self) -> bool {
        matches!(self.node, NodeState::Allocated(_))
    }

    pub fn status(&self) -> TrackStatus {
        match (&self.asset, &self.node) {
            (_, NodeState::Allocated(pair)) if pair.source.is_playing() => TrackStatus::Playing,
            (_, NodeState::Allocated(_)) => TrackStatus::Stopped,
            (AssetState::Pending, _) => TrackStatus::Pending,
            (AssetState::Unavailable(_), _) => TrackStatus::Unavailable,
            (AssetState::Ready(_), NodeState::Uninitialized) => TrackStatus::Unallocated,
        }
    }

    pub(crate) fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }

    pub(crate) fn set_pan(&mut self, pan: f64) {
        self.pan = pan;
    }
}

/// Read-only view of one track for UI rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSnapshot {
    pub name: String,
    pub source_url: String,
    pub volume: f64,
    pub pan: f64,
    pub status: TrackStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Track> for TrackSnapshot {
    fn from(track: &Track) -> Self {
        TrackSnapshot {
            name: track.name.clone(),
            source_url: track.source_url.clone(),
            volume: track.volume,
            pan: track.pan,
            status: track.status(),
            error: track.asset_error().map(|e| e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_values_are_clamped_on_creation() {
        let spec = TrackSpec::new("Wind", "a.mp3").with_volume(4.0).with_pan(-9.0);
        let track = Track::new(&spec, AssetState::Pending);
        assert_eq!(track.volume(), 1.0);
        assert_eq!(track.pan(), -1.0);
        assert_eq!(track.status(), TrackStatus::Pending);
    }

    #[test]
    fn spec_json_defaults() {
        let spec: TrackSpec =
            serde_json::from_str(r#"{"name":"Rain","sourceUrl":"b.mp3"}"#).unwrap();
        assert_eq!(spec, TrackSpec::new("Rain", "b.mp3"));
    }

    #[test]
    fn unavailable_status_and_error() {
        let err = AssetError::NotFound { url: "x.mp3".to_string() };
        let track = Track::new(&TrackSpec::new("X", "x.mp3"), AssetState::Unavailable(err.clone()));
        assert_eq!(track.status(), TrackStatus::Unavailable);
        assert_eq!(track.asset_error(), Some(&err));
        let snap = TrackSnapshot::from(&track);
        assert!(snap.error.unwrap().contains("x.mp3"));
    }
}
