//! Scene generation and audio synthesis contracts.
//!
//! The generation backend turns a scene description into named sound
//! elements, then synthesizes one clip per element. The mixer only consumes
//! the result: element names zipped with clip URLs.

#[cfg(feature = "remote")]
pub mod remote;

use serde::{Deserialize, Serialize};

use crate::config::{MixerConfig, PairingPolicy};
use crate::engine::track::TrackSpec;
use crate::error::MixError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundElement {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneRequest {
    pub scene_text: String,
    /// Raw bytes of an optional reference image.
    pub image: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneResponse {
    pub narrative: String,
    pub sound_elements: Vec<SoundElement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisRequest {
    pub sound_elements: Vec<SoundElement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisResponse {
    /// One URL per requested element, in request order.
    pub audio_urls: Vec<String>,
}

/// The generation backend.
#[allow(async_fn_in_trait)]
pub trait SceneService {
    async fn generate_scene(&self, request: &SceneRequest) -> Result<SceneResponse, MixError>;

    async fn synthesize_audio(
        &self,
        request: &SynthesisRequest,
    ) -> Result<SynthesisResponse, MixError>;
}

/// Zip element names with audio URLs by position.
///
/// Under [`PairingPolicy::Truncate`] anything beyond the shorter list is
/// dropped (and logged); under [`PairingPolicy::Strict`] a length mismatch
/// is an error. Tracks get the configured default volume and pan.
pub fn pair_tracks(
    elements: &[SoundElement],
    urls: &[String],
    config: &MixerConfig,
) -> Result<Vec<TrackSpec>, MixError> {
    if elements.len() != urls.len() {
        match config.pairing {
            PairingPolicy::Strict => {
                return Err(MixError::CountMismatch {
                    elements: elements.len(),
                    urls: urls.len(),
                });
            }
            PairingPolicy::Truncate => log::warn!(
                "{} sound elements but {} audio URLs; keeping {}",
                elements.len(),
                urls.len(),
                elements.len().min(urls.len())
            ),
        }
    }

    Ok(elements
        .iter()
        .zip(urls)
        .map(|(element, url)| {
            TrackSpec::new(element.name.clone(), url.clone())
                .with_volume(config.default_volume)
                .with_pan(config.default_pan)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elements(names: &[&str]) -> Vec<SoundElement> {
        names
            .iter()
            .map(|n| SoundElement {
                name: n.to_string(),
                description: format!("the sound of {n}"),
            })
            .collect()
    }

    fn urls(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("clip{i}.mp3")).collect()
    }

    #[test]
    fn pairs_by_position() {
        let specs = pair_tracks(&elements(&["Wind", "Rain"]), &urls(2), &MixerConfig::default()).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[1].name, "Rain");
        assert_eq!(specs[1].source_url, "clip1.mp3");
        assert_eq!(specs[1].volume, 1.0);
    }

    #[test]
    fn truncates_to_shorter_list() {
        let config = MixerConfig::default();
        let specs = pair_tracks(&elements(&["Wind", "Rain", "Birds"]), &urls(2), &config).unwrap();
        assert_eq!(specs.len(), 2);
        let specs = pair_tracks(&elements(&["Wind"]), &urls(3), &config).unwrap();
        assert_eq!(specs.len(), 1);
    }

    #[test]
    fn strict_policy_rejects_mismatch() {
        let config = MixerConfig {
            pairing: PairingPolicy::Strict,
            ..MixerConfig::default()
        };
        let err = pair_tracks(&elements(&["Wind", "Rain", "Birds"]), &urls(2), &config).unwrap_err();
        assert!(matches!(err, MixError::CountMismatch { elements: 3, urls: 2 }));
    }

    #[test]
    fn defaults_come_from_config() {
        let config = MixerConfig {
            default_volume: 0.6,
            default_pan: -0.2,
            ..MixerConfig::default()
        };
        let specs = pair_tracks(&elements(&["Wind"]), &urls(1), &config).unwrap();
        assert_eq!((specs[0].volume, specs[0].pan), (0.6, -0.2));
    }

    #[test]
    fn wire_format_is_camel_case() {
        let response: SceneResponse = serde_json::from_str(
            r#"{"narrative":"A stormy shore.","soundElements":[{"name":"Waves","description":"crashing surf"}]}"#,
        )
        .unwrap();
        assert_eq!(response.sound_elements[0].name, "Waves");
        let json = serde_json::to_value(SynthesisResponse { audio_urls: urls(1) }).unwrap();
        assert_eq!(json["audioUrls"][0], "clip0.mp3");
    }
}
