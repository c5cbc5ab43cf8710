//! Resolving a track's source URL into decoded audio.

use std::collections::HashMap;

use crate::dsp::buffer::AudioBuffer;
use crate::error::AssetError;

/// Result of asking a loader for a URL.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Ready(AudioBuffer),
    /// The audio will be delivered later through `Mixer::deliver_asset`
    /// or `Mixer::fail_asset`.
    Deferred,
}

pub trait AssetLoader {
    fn load(&mut self, url: &str) -> Result<LoadOutcome, AssetError>;
}

/// Pre-decoded buffers keyed by URL. Unknown URLs are `NotFound`.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    entries: HashMap<String, Result<AudioBuffer, AssetError>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, buffer: AudioBuffer) {
        self.entries.insert(url.into(), Ok(buffer));
    }

    /// Remember that fetching `url` already failed.
    pub fn insert_failure(&mut self, url: impl Into<String>, error: AssetError) {
        self.entries.insert(url.into(), Err(error));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AssetLoader for MemoryLoader {
    fn load(&mut self, url: &str) -> Result<LoadOutcome, AssetError> {
        match self.entries.get(url) {
            Some(Ok(buffer)) => Ok(LoadOutcome::Ready(buffer.clone())),
            Some(Err(e)) => Err(e.clone()),
            None => Err(AssetError::NotFound { url: url.to_string() }),
        }
    }
}

/// Defers every URL to the host, which fetches and decodes audio itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeferredLoader;

impl AssetLoader for DeferredLoader {
    fn load(&mut self, _url: &str) -> Result<LoadOutcome, AssetError> {
        Ok(LoadOutcome::Deferred)
    }
}

/// Decodes base64 `data:` URLs and local files.
///
/// Network URLs are not fetched here; download them first (see
/// `scene::remote`) and hand the buffers over through a [`MemoryLoader`].
#[cfg(feature = "decode")]
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodingLoader;

#[cfg(feature = "decode")]
impl AssetLoader for DecodingLoader {
    fn load(&mut self, url: &str) -> Result<LoadOutcome, AssetError> {
        use crate::dsp::decode::{data_url_bytes, decode_audio};

        let bytes = if url.starts_with("data:") {
            data_url_bytes(url)
                .ok_or_else(|| AssetError::Unsupported { url: url.to_string() })?
                .map_err(|e| AssetError::Decode {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?
        } else if let Some(path) = local_path(url) {
            std::fs::read(path).map_err(|e| AssetError::Unreachable {
                url: url.to_string(),
                reason: e.to_string(),
            })?
        } else {
            return Err(AssetError::Unsupported { url: url.to_string() });
        };

        decode_audio(&bytes)
            .map(LoadOutcome::Ready)
            .map_err(|e| AssetError::Decode {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }
}

/// `file://` URLs and bare paths; `None` for any other scheme.
#[cfg(feature = "decode")]
fn local_path(url: &str) -> Option<&str> {
    if let Some(path) = url.strip_prefix("file://") {
        Some(path)
    } else if url.contains("://") || url.is_empty() {
        None
    } else {
        Some(url)
    }
}
