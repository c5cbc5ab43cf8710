use std::fmt;

#[derive(Debug)]
pub enum MixError {
    /// The output context could not be brought into the running state.
    PlaybackBlocked { reason: String },
    /// Sound-element names and audio URLs differ in count under the strict pairing policy.
    CountMismatch { elements: usize, urls: usize },
    Config(ConfigError),
    /// The scene/audio generation backend failed or returned an unusable response.
    Service { reason: String },
}

#[derive(Debug)]
pub enum ConfigError {
    Json(serde_json::Error),
    Invalid { field: &'static str, reason: String },
}

/// Why a single track's audio could not be made playable.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetError {
    NotFound { url: String },
    Unreachable { url: String, reason: String },
    Decode { url: String, reason: String },
    Unsupported { url: String },
}

impl AssetError {
    pub fn url(&self) -> &str {
        match self {
            AssetError::NotFound { url }
            | AssetError::Unreachable { url, .. }
            | AssetError::Decode { url, .. }
            | AssetError::Unsupported { url } => url,
        }
    }
}

impl fmt::Display for MixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MixError::PlaybackBlocked { reason } => write!(f, "Playback blocked: {reason}"),
            MixError::CountMismatch { elements, urls } => {
                write!(f, "{elements} sound elements but {urls} audio URLs")
            }
            MixError::Config(e) => write!(f, "Config error: {e}"),
            MixError::Service { reason } => write!(f, "Generation service error: {reason}"),
        }
    }
}

impl std::error::Error for MixError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MixError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Json(e) => write!(f, "{e}"),
            ConfigError::Invalid { field, reason } => write!(f, "invalid '{field}': {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Json(e) => Some(e),
            ConfigError::Invalid { .. } => None,
        }
    }
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::NotFound { url } => write!(f, "No audio for '{url}'"),
            AssetError::Unreachable { url, reason } => write!(f, "Cannot fetch '{url}': {reason}"),
            AssetError::Decode { url, reason } => write!(f, "Cannot decode '{url}': {reason}"),
            AssetError::Unsupported { url } => write!(f, "Unsupported audio source '{url}'"),
        }
    }
}

impl std::error::Error for AssetError {}

impl From<ConfigError> for MixError {
    fn from(e: ConfigError) -> Self {
        MixError::Config(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

impl From<serde_json::Error> for MixError {
    fn from(e: serde_json::Error) -> Self {
        MixError::Config(ConfigError::Json(e))
    }
}
