//! HTTP client for the generation backend, plus clip download.
//!
//! Endpoints (JSON in, JSON out):
//! - `POST {base}/generate-scene` `{sceneText, image?}` → [`SceneResponse`]
//! - `POST {base}/generate-audio` `{soundElements}` → [`SynthesisResponse`]

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use tokio::task::JoinSet;

use super::{SceneRequest, SceneResponse, SceneService, SynthesisRequest, SynthesisResponse};
use crate::assets::{AssetLoader, DecodingLoader, LoadOutcome, MemoryLoader};
use crate::dsp::buffer::AudioBuffer;
use crate::dsp::decode::decode_audio;
use crate::error::{AssetError, MixError};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SceneBody<'a> {
    scene_text: &'a str,
    /// Base64 image bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpSceneService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSceneService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        HttpSceneService {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, MixError>
    where
        B: Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let url = self.endpoint(path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| MixError::Service { reason: format!("{url}: {e}") })?;
        response
            .json::<R>()
            .await
            .map_err(|e| MixError::Service { reason: format!("{url}: bad response: {e}") })
    }

    /// Download and decode every clip concurrently.
    ///
    /// Failures do not abort the batch; they are stored in the returned
    /// loader so the graph build flags those tracks as unavailable.
    /// `data:` and local URLs are decoded in place without a request.
    pub async fn download_assets(&self, urls: &[String]) -> MemoryLoader {
        let mut loader = MemoryLoader::new();
        let mut tasks = JoinSet::new();

        for url in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                match DecodingLoader.load(url) {
                    Ok(LoadOutcome::Ready(buffer)) => loader.insert(url.clone(), buffer),
                    Ok(LoadOutcome::Deferred) => {}
                    Err(e) => loader.insert_failure(url.clone(), e),
                }
                continue;
            }
            let client = self.client.clone();
            let url = url.clone();
            tasks.spawn(async move {
                let result = fetch_clip(&client, &url).await;
                (url, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((url, Ok(buffer))) => loader.insert(url, buffer),
                Ok((url, Err(e))) => {
                    log::warn!("{e}");
                    loader.insert_failure(url, e);
                }
                Err(e) => log::error!("clip download task failed: {e}"),
            }
        }
        loader
    }
}

async fn fetch_clip(client: &reqwest::Client, url: &str) -> Result<AudioBuffer, AssetError> {
    let unreachable = |e: reqwest::Error| AssetError::Unreachable {
        url: url.to_string(),
        reason: e.to_string(),
    };
    let bytes = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(unreachable)?
        .bytes()
        .await
        .map_err(unreachable)?;
    decode_audio(&bytes).map_err(|e| AssetError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

impl SceneService for HttpSceneService {
    async fn generate_scene(&self, request: &SceneRequest) -> Result<SceneResponse, MixError> {
        let body = SceneBody {
            scene_text: &request.scene_text,
            image: request.image.as_ref().map(|bytes| STANDARD.encode(bytes)),
        };
        self.post_json("generate-scene", &body).await
    }

    async fn synthesize_audio(
        &self,
        request: &SynthesisRequest,
    ) -> Result<SynthesisResponse, MixError> {
        self.post_json("generate-audio", request).await
    }
}
