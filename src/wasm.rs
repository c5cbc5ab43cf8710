//! Browser bindings.
//!
//! The page owns the real `AudioContext` and fetches/decodes clips itself,
//! then hands PCM to the mixer. Audio is pulled from an AudioWorklet with
//! `render`.
//!
//! ```javascript
//! const mixer = new SceneMixer({ sampleRate: ctx.sampleRate });
//! const graph = mixer.buildFromScene(scene.soundElements, audio.audioUrls);
//! urls.forEach(async (url, i) => {
//!   try {
//!     const buf = await ctx.decodeAudioData(await (await fetch(url)).arrayBuffer());
//!     mixer.loadTrackPcm(graph, i, interleave(buf), buf.numberOfChannels, buf.sampleRate);
//!   } catch (e) {
//!     mixer.failTrack(graph, i, String(e));
//!   }
//! });
//!
//! playButton.onclick = async () => {
//!   await ctx.resume();
//!   mixer.setContextState(ctx.state);
//!   mixer.start();
//! };
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::assets::DeferredLoader;
use crate::config::MixerConfig;
use crate::dsp::buffer::AudioBuffer;
use crate::engine::{ContextState, GraphId, HostContext, Mixer, MixerEvent, TrackSpec};
use crate::error::AssetError;
use crate::scene::SoundElement;

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{e}"))
}

#[wasm_bindgen]
pub struct SceneMixer {
    mixer: Mixer<HostContext>,
    events: Rc<RefCell<Vec<MixerEvent>>>,
}

#[wasm_bindgen]
impl SceneMixer {
    /// Create a mixer. `config` may be `undefined` for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<SceneMixer, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            MixerConfig::default()
        } else {
            serde_wasm_bindgen::from_value::<MixerConfig>(config)
                .map_err(js_err)?
                .validated()
                .map_err(js_err)?
        };
        let context = HostContext::new(config.sample_rate);
        let mut mixer = Mixer::new(config, context);

        let events = Rc::new(RefCell::new(Vec::new()));
        let queue = Rc::clone(&events);
        mixer.subscribe(move |event| queue.borrow_mut().push(event.clone()));

        Ok(SceneMixer { mixer, events })
    }

    /// Build from `[{name, sourceUrl, volume?, pan?}]`. Returns the graph id
    /// that `loadTrackPcm`/`failTrack` must quote.
    pub fn build(&mut self, tracks: JsValue) -> Result<u32, JsValue> {
        let specs: Vec<TrackSpec> = serde_wasm_bindgen::from_value(tracks).map_err(js_err)?;
        Ok(self.mixer.build(&specs, &mut DeferredLoader).value() as u32)
    }

    /// Build from the generation backend's `soundElements` and `audioUrls`.
    #[wasm_bindgen(js_name = buildFromScene)]
    pub fn build_from_scene(&mut self, elements: JsValue, urls: JsValue) -> Result<u32, JsValue> {
        let elements: Vec<SoundElement> = serde_wasm_bindgen::from_value(elements).map_err(js_err)?;
        let urls: Vec<String> = serde_wasm_bindgen::from_value(urls).map_err(js_err)?;
        let id = self
            .mixer
            .build_from_scene(&elements, &urls, &mut DeferredLoader)
            .map_err(js_err)?;
        Ok(id.value() as u32)
    }

    /// Report `AudioContext.state` ("suspended", "running" or "closed").
    #[wasm_bindgen(js_name = setContextState)]
    pub fn set_context_state(&mut self, state: &str) -> Result<(), JsValue> {
        let state = match state {
            "running" => ContextState::Running,
            "suspended" | "interrupted" => ContextState::Suspended,
            "closed" => ContextState::Closed,
            other => return Err(js_err(format!("unknown context state '{other}'"))),
        };
        self.mixer.context_mut().set_state(state);
        Ok(())
    }

    /// Report `AudioContext.sampleRate` when it differs from the configured
    /// rate. Takes effect from the next build.
    #[wasm_bindgen(js_name = setSampleRate)]
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.mixer.context_mut().set_sample_rate(sample_rate);
    }

    /// Start all tracks. Throws `Playback blocked` if the context is not running.
    pub fn start(&mut self) -> Result<(), JsValue> {
        self.mixer.start().map_err(js_err)
    }

    pub fn stop(&mut self) {
        self.mixer.stop();
    }

    #[wasm_bindgen(js_name = isPlaying)]
    pub fn is_playing(&self) -> bool {
        self.mixer.transport_state() == crate::engine::TransportState::Playing
    }

    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&mut self, index: usize, value: f64) {
        self.mixer.set_volume(index, value);
    }

    #[wasm_bindgen(js_name = setPan)]
    pub fn set_pan(&mut self, index: usize, value: f64) {
        self.mixer.set_pan(index, value);
    }

    /// Deliver decoded, interleaved PCM for a track. Malformed PCM marks the
    /// track unavailable instead of throwing.
    #[wasm_bindgen(js_name = loadTrackPcm)]
    pub fn load_track_pcm(
        &mut self,
        graph: u32,
        index: usize,
        samples: Vec<f32>,
        channels: u16,
        sample_rate: u32,
    ) {
        let graph = GraphId(graph as u64);
        match AudioBuffer::from_interleaved(samples, channels, sample_rate) {
            Some(buffer) => self.mixer.deliver_asset(graph, index, buffer),
            None => {
                let url = self.track_url(index);
                self.mixer.fail_asset(graph, index, AssetError::Decode {
                    url,
                    reason: format!("bad PCM layout ({channels} channels @ {sample_rate} Hz)"),
                });
            }
        }
    }

    /// Report that the page could not fetch or decode a track's clip.
    #[wasm_bindgen(js_name = failTrack)]
    pub fn fail_track(&mut self, graph: u32, index: usize, reason: String) {
        let url = self.track_url(index);
        self.mixer
            .fail_asset(GraphId(graph as u64), index, AssetError::Unreachable { url, reason });
    }

    pub fn dispose(&mut self) {
        self.mixer.dispose();
    }

    /// Fill one block of output; call from the AudioWorklet's `process`.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        self.mixer.render(left, right);
    }

    /// `{transport, tracks: [{name, sourceUrl, volume, pan, status, error?}]}`
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.mixer.snapshot()).map_err(js_err)
    }

    /// Events since the last call, oldest first.
    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&self) -> Result<JsValue, JsValue> {
        let events: Vec<MixerEvent> = self.events.borrow_mut().drain(..).collect();
        serde_wasm_bindgen::to_value(&events).map_err(js_err)
    }
}

impl SceneMixer {
    fn track_url(&self, index: usize) -> String {
        self.mixer
            .graph()
            .and_then(|g| g.track(index))
            .map(|t| t.source_url().to_string())
            .unwrap_or_default()
    }
}
