pub mod assets;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod scene;
pub mod wasm;

pub use assets::{AssetLoader, DeferredLoader, LoadOutcome, MemoryLoader};
#[cfg(feature = "decode")]
pub use assets::DecodingLoader;
pub use config::{MixerConfig, PairingPolicy, ReverbConfig};
pub use engine::{
    ContextState, GraphId, HostContext, Mixer, MixerEvent, MixerSnapshot, OfflineContext,
    OutputContext, TrackSnapshot, TrackSpec, TrackStatus, TransportState,
};
pub use error::{AssetError, ConfigError, MixError};
pub use scene::{SoundElement, pair_tracks};

use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the scenemix-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: route `log` output to the browser console and install the
/// panic hook. Call once before creating a mixer.
#[cfg(feature = "web")]
#[wasm_bindgen]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).ok();
}
