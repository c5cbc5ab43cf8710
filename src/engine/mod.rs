//! Mixing engine — graph construction, transport, and parameter bridge.

pub mod context;
pub mod events;
pub mod graph;
pub mod mixer;
pub mod node;
mod params;
pub mod track;
pub mod transport;

#[cfg(test)]
mod tests;

pub use context::{ContextState, HostContext, OfflineContext, OutputContext};
pub use events::{MixerEvent, SubscriptionId};
pub use graph::{GraphId, MixGraph};
pub use mixer::{Mixer, MixerSnapshot};
pub use track::{TrackSnapshot, TrackSpec, TrackStatus};
pub use transport::TransportState;
