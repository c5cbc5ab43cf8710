//! State-change notifications for UI layers and other observers.

use serde::Serialize;

use super::transport::TransportState;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MixerEvent {
    #[serde(rename_all = "camelCase")]
    GraphBuilt { graph: u64, tracks: usize },
    #[serde(rename_all = "camelCase")]
    GraphDisposed { graph: u64 },
    Transport { state: TransportState },
    Volume { index: usize, volume: f64 },
    Pan { index: usize, pan: f64 },
    #[serde(rename_all = "camelCase")]
    AssetReady { index: usize },
    #[serde(rename_all = "camelCase")]
    AssetUnavailable { index: usize, name: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&MixerEvent)>;

#[derive(Default)]
pub struct Subscribers {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl Subscribers {
    pub fn subscribe(&mut self, listener: impl FnMut(&MixerEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn notify(&mut self, event: &MixerEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
