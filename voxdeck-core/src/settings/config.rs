use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::audio::{PcmFormat, DEFAULT_SAMPLE_RATE};
use crate::speech::MockBehavior;

pub const MIN_SPEED: f32 = 0.25;
pub const MAX_SPEED: f32 = 4.0;

/// Per-session voice configuration sent with every generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalAudioSettings {
    /// Voice id; the engine's default voice when unset
    #[serde(default)]
    pub voice: Option<String>,

    /// Speaking rate multiplier
    #[serde(default = "default_speed")]
    pub speed: f32,

    /// 0.0 is flat, 1.0 is the most animated delivery
    #[serde(default = "default_expressiveness")]
    pub expressiveness: f32,

    /// Free-text delivery style, e.g. "calm radio host"
    #[serde(default)]
    pub style: Option<String>,

    #[serde(default)]
    pub accent: Option<String>,

    /// Fixed seed for repeatable output
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_speed() -> f32 {
    1.0
}

fn default_expressiveness() -> f32 {
    0.5
}

impl Default for GlobalAudioSettings {
    fn default() -> Self {
        Self {
            voice: None,
            speed: default_speed(),
            expressiveness: default_expressiveness(),
            style: None,
            accent: None,
            seed: None,
        }
    }
}

impl GlobalAudioSettings {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (MIN_SPEED..=MAX_SPEED).contains(&self.speed),
            "speed {} is outside {MIN_SPEED}..={MAX_SPEED}",
            self.speed
        );
        ensure!(
            (0.0..=1.0).contains(&self.expressiveness),
            "expressiveness {} is outside 0.0..=1.0",
            self.expressiveness
        );
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProviderConfig {
    #[serde(rename = "http")]
    Http {
        endpoint: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default)]
        model: Option<String>,
    },
    #[serde(rename = "mock")]
    Mock {
        #[serde(default)]
        behavior: MockBehavior,
    },
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Mock {
            behavior: MockBehavior::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Where rendered files go when no directory is given explicitly
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

/// Core application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub audio: GlobalAudioSettings,

    /// Sample rate of engine output and of every framed container
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub export: ExportSettings,
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            audio: GlobalAudioSettings::default(),
            sample_rate: default_sample_rate(),
            provider: ProviderConfig::default(),
            export: ExportSettings::default(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.sample_rate > 0, "sample_rate must be positive");
        self.audio.validate()
    }

    pub fn pcm_format(&self) -> PcmFormat {
        PcmFormat::mono(self.sample_rate)
    }
}
