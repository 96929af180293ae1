use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use super::provider::TextToSpeech;
use super::types::{SynthesisRequest, Voice};
use crate::audio::RawAudio;

/// Samples emitted per character in `Tone` mode (10 ms at 24 kHz)
pub const TONE_SAMPLES_PER_CHAR: usize = 240;

/// Mock behavior for the mock speech engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MockBehavior {
    /// A deterministic square wave, one burst per character of text
    #[default]
    Tone,
    /// Exactly `bytes` bytes of patterned audio
    Fixed { bytes: usize },
    /// Succeed with no audio
    Empty,
    /// Fail with `message`
    Fail { message: String },
    /// Use each behavior once, in order, then fall back to `Tone`
    Queue { behaviors: Vec<MockBehavior> },
}

/// Mock speech engine for tests and offline runs
#[derive(Clone)]
pub struct MockSpeech {
    behavior: Arc<Mutex<MockBehavior>>,
    captured_requests: Arc<Mutex<Vec<SynthesisRequest>>>,
}

impl MockSpeech {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(behavior)),
            captured_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn next_behavior(behavior: &mut MockBehavior) -> MockBehavior {
        if let MockBehavior::Queue { behaviors } = behavior {
            if behaviors.is_empty() {
                return MockBehavior::Tone;
            }
            return behaviors.remove(0);
        }
        behavior.clone()
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock().unwrap_or_else(|e| e.into_inner()) = behavior;
    }

    pub fn call_count(&self) -> usize {
        self.captured_requests().len()
    }

    pub fn captured_requests(&self) -> Vec<SynthesisRequest> {
        self.captured_requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

fn tone(text: &str) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(text.chars().count() * TONE_SAMPLES_PER_CHAR * 2);
    for c in text.chars() {
        let amplitude = 1024 + (c as u32 % 64) as i16 * 256;
        for i in 0..TONE_SAMPLES_PER_CHAR {
            let sample = if (i / 24) % 2 == 0 { amplitude } else { -amplitude };
            pcm.extend_from_slice(&sample.to_le_bytes());
        }
    }
    pcm
}

#[async_trait]
impl TextToSpeech for MockSpeech {
    fn default_voice(&self) -> Voice {
        Voice {
            id: "mock".to_string(),
            name: "Mock".to_string(),
            language_code: "en".to_string(),
        }
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<RawAudio> {
        self.captured_requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let behavior = {
            let mut guard = self.behavior.lock().unwrap_or_else(|e| e.into_inner());
            Self::next_behavior(&mut guard)
        };

        match behavior {
            MockBehavior::Tone | MockBehavior::Queue { .. } => {
                Ok(RawAudio::from(tone(&request.text)))
            }
            MockBehavior::Fixed { bytes } => Ok(RawAudio::from(
                (0..bytes).map(|i| (i % 251) as u8).collect::<Vec<u8>>(),
            )),
            MockBehavior::Empty => Ok(RawAudio::default()),
            MockBehavior::Fail { message } => bail!("{message}"),
        }
    }

    async fn list_voices(&self) -> Result<Vec<Voice>> {
        Ok(vec![self.default_voice()])
    }
}
