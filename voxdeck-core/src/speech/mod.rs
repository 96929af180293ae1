//! Text-to-speech engines

pub mod http;
pub mod mock;
pub mod provider;
pub mod types;

use std::sync::Arc;

pub use http::{HttpSpeech, HttpSpeechConfig};
pub use mock::{MockBehavior, MockSpeech};
pub use provider::TextToSpeech;
pub use types::{SynthesisRequest, Voice};

use crate::settings::ProviderConfig;

/// Build the speech engine described by `config`
pub fn create_provider(config: &ProviderConfig) -> Arc<dyn TextToSpeech> {
    match config {
        ProviderConfig::Http {
            endpoint,
            api_key,
            model,
        } => Arc::new(HttpSpeech::new(HttpSpeechConfig {
            endpoint: endpoint.clone(),
            api_key: api_key.clone(),
            model: model.clone(),
        })),
        ProviderConfig::Mock { behavior } => Arc::new(MockSpeech::new(behavior.clone())),
    }
}
