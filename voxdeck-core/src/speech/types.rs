use serde::{Deserialize, Serialize};

use crate::settings::GlobalAudioSettings;

/// A voice offered by a speech provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub id: String,
    pub name: String,
    pub language_code: String,
}

/// Text plus the session's audio settings, captured by value when a
/// generation is issued
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub text: String,
    pub settings: GlobalAudioSettings,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, settings: GlobalAudioSettings) -> Self {
        Self {
            text: text.into(),
            settings,
        }
    }
}
