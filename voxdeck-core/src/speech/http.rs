//! JSON-over-HTTP speech engine
//!
//! `POST {endpoint}/v1/speech` with the request text and audio settings; the
//! engine answers with base64 PCM in an `audio` field.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::provider::TextToSpeech;
use super::types::{SynthesisRequest, Voice};
use crate::audio::{codec, RawAudio, DEFAULT_SAMPLE_RATE};

pub const DEFAULT_VOICE: &str = "narrator";

#[derive(Debug, Clone)]
pub struct HttpSpeechConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: Option<String>,
}

impl HttpSpeechConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            model: None,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.endpoint.trim_end_matches('/'))
    }
}

pub struct HttpSpeech {
    config: HttpSpeechConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct SpeechRequestBody<'a> {
    text: &'a str,
    voice: &'a str,
    speed: f32,
    expressiveness: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    accent: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SpeechResponse {
    #[serde(default)]
    audio: Option<String>,
    #[serde(default)]
    sample_rate: Option<u32>,
}

#[derive(Deserialize)]
struct VoicesResponse {
    voices: Vec<VoiceData>,
}

#[derive(Deserialize)]
struct VoiceData {
    id: String,
    name: String,
    #[serde(default = "default_language")]
    language_code: String,
}

fn default_language() -> String {
    "en".to_string()
}

impl HttpSpeech {
    pub fn new(config: HttpSpeechConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn build_request_body(&self, request: &SynthesisRequest) -> Result<serde_json::Value> {
        let settings = &request.settings;
        let body = SpeechRequestBody {
            text: &request.text,
            voice: settings.voice.as_deref().unwrap_or(DEFAULT_VOICE),
            speed: settings.speed,
            expressiveness: settings.expressiveness,
            style: non_empty(&settings.style),
            accent: non_empty(&settings.accent),
            seed: settings.seed,
            model: self.config.model.as_deref(),
        };
        serde_json::to_value(body).context("Failed to serialize speech request")
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Missing or empty `audio` yields an empty buffer, which callers treat as
/// "no result".
fn parse_response(body: &str) -> Result<RawAudio> {
    let response: SpeechResponse =
        serde_json::from_str(body).context("Failed to parse speech response")?;

    if let Some(rate) = response.sample_rate {
        if rate != DEFAULT_SAMPLE_RATE {
            warn!(rate, "speech engine returned unexpected sample rate");
        }
    }

    let Some(audio) = response.audio.filter(|a| !a.is_empty()) else {
        return Ok(RawAudio::default());
    };
    let bytes = codec::decode(&audio).context("Speech response audio is not valid base64")?;
    Ok(RawAudio::from(bytes))
}

#[async_trait]
impl TextToSpeech for HttpSpeech {
    fn default_voice(&self) -> Voice {
        Voice {
            id: DEFAULT_VOICE.to_string(),
            name: "Narrator".to_string(),
            language_code: "en".to_string(),
        }
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<RawAudio> {
        let body = self.build_request_body(request)?;
        let url = self.config.url("v1/speech");
        debug!(%url, chars = request.text.len(), "requesting speech");

        let response = self
            .authorize(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .context("Failed to send request to speech engine")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Speech engine error {status}: {body}");
        }

        let text = response
            .text()
            .await
            .context("Failed to read speech response")?;
        parse_response(&text)
    }

    async fn list_voices(&self) -> Result<Vec<Voice>> {
        let response = self
            .authorize(self.client.get(self.config.url("v1/voices")))
            .send()
            .await
            .context("Failed to list voices from speech engine")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Speech engine error {status}: {body}");
        }

        let voices: VoicesResponse = response
            .json()
            .await
            .context("Failed to parse voices response")?;

        Ok(voices
            .voices
            .into_iter()
            .map(|v| Voice {
                id: v.id,
                name: v.name,
                language_code: v.language_code,
            })
            .collect())
    }
}
