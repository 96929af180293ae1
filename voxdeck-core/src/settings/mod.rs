pub mod config;
pub mod manager;

#[cfg(test)]
mod tests;

pub use config::{ExportSettings, GlobalAudioSettings, ProviderConfig, Settings};
pub use manager::SettingsManager;
