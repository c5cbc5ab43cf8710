//! Mixer configuration.
//!
//! Every field has a default, so `{}` (or no config at all) is a valid
//! configuration. JSON keys are camelCase to match the browser host.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, MixError};

/// How to pair sound-element names with resolved audio URLs when the two
/// lists differ in length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairingPolicy {
    /// Drop whatever is left over beyond the shorter list.
    #[default]
    Truncate,
    /// Refuse to pair lists of different lengths.
    Strict,
}

/// Parameters of the shared reverb send. Fixed once the graph is built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReverbConfig {
    /// Room size (0.0 to 1.0).
    pub room_size: f64,
    /// Damping (0.0 to 1.0).
    pub damping: f64,
    /// Dry/wet mix (0.0 to 1.0).
    pub wet: f64,
}

impl Default for ReverbConfig {
    fn default() -> Self {
        Self {
            room_size: 0.5,
            damping: 0.5,
            wet: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MixerConfig {
    /// Rate of the software output context, in Hz.
    pub sample_rate: u32,
    /// Linear gain applied at the master sink before soft clipping.
    pub master_gain: f64,
    /// Volume given to tracks created from a scene (0.0 to 1.0).
    pub default_volume: f64,
    /// Pan given to tracks created from a scene (-1.0 to 1.0).
    pub default_pan: f64,
    pub pairing: PairingPolicy,
    pub reverb: ReverbConfig,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            master_gain: 0.8,
            default_volume: 1.0,
            default_pan: 0.0,
            pairing: PairingPolicy::Truncate,
            reverb: ReverbConfig::default(),
        }
    }
}

impl MixerConfig {
    /// Parse a JSON config. Out-of-range levels are clamped; a zero sample
    /// rate is rejected.
    pub fn from_json(json: &str) -> Result<Self, MixError> {
        let config: MixerConfig = serde_json::from_str(json).map_err(ConfigError::from)?;
        Ok(config.validated()?)
    }

    /// Clamp every level into its declared range.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::Invalid {
                field: "sampleRate",
                reason: "must be greater than zero".to_string(),
            });
        }
        self.master_gain = self.master_gain.clamp(0.0, 1.0);
        self.default_volume = crate::dsp::gain::clamp_volume(self.default_volume);
        self.default_pan = crate::dsp::gain::clamp_pan(self.default_pan);
        self.reverb.room_size = self.reverb.room_size.clamp(0.0, 1.0);
        self.reverb.damping = self.reverb.damping.clamp(0.0, 1.0);
        self.reverb.wet = self.reverb.wet.clamp(0.0, 1.0);
        Ok(self)
    }
}
