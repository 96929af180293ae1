use anyhow::{Context, Result};
use std::fs;
use std::ops::DerefMut;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

use super::config::Settings;

/// Settings shared by everything in one process. Updates stay in memory until
/// `save` is called, so a session can tweak values without touching the file
/// other sessions read.
#[derive(Clone)]
pub struct SettingsManager {
    settings_path: PathBuf,
    inner: Arc<Mutex<Settings>>,
}

impl SettingsManager {
    /// Create a settings manager at the default location
    pub fn new() -> Result<Self> {
        Self::from_path(Self::default_settings_path()?)
    }

    /// Create a settings manager from a specific path, writing defaults if
    /// the file does not exist yet
    pub fn from_path(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            write_settings(&path, &Settings::default())?;
        }

        let loaded = Self::load_from_file_with_backup(&path)?;

        Ok(Self {
            settings_path: path,
            inner: Arc::new(Mutex::new(loaded)),
        })
    }

    /// ~/.voxdeck/settings.toml
    pub fn default_settings_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".voxdeck").join("settings.toml"))
    }

    /// A file that no longer parses is moved to `settings.toml.backup` and
    /// replaced by defaults.
    fn load_from_file_with_backup(path: &Path) -> Result<Settings> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {path:?}"))?;

        match toml::from_str(&contents) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                let backup_path = path.with_extension("toml.backup");
                warn!(?path, ?backup_path, error = %e, "settings file is corrupt, restoring defaults");
                fs::rename(path, &backup_path).with_context(|| {
                    format!("Failed to backup corrupted settings to {backup_path:?}")
                })?;

                let default_settings = Settings::default();
                write_settings(path, &default_settings)?;
                Ok(default_settings)
            }
        }
    }

    pub fn settings(&self) -> Settings {
        self.lock().clone()
    }

    /// Update in-memory settings with a closure. Note: settings are not saved to disk
    pub fn update_setting<F>(&self, updater: F)
    where
        F: FnOnce(&mut Settings),
    {
        let mut guard = self.lock();
        updater(guard.deref_mut());
    }

    /// Save provided settings and make them current
    pub fn save_settings(&self, settings: Settings) -> Result<()> {
        settings.validate()?;
        write_settings(&self.settings_path, &settings)?;
        *self.lock() = settings;
        Ok(())
    }

    /// Explicitly persist in-memory settings to disk
    pub fn save(&self) -> Result<()> {
        self.save_settings(self.settings())
    }

    pub fn path(&self) -> &Path {
        &self.settings_path
    }

    fn lock(&self) -> MutexGuard<'_, Settings> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn write_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {parent:?}"))?;
    }
    let contents = toml::to_string_pretty(settings).context("Failed to serialize settings")?;
    fs::write(path, contents).with_context(|| format!("Failed to write settings to {path:?}"))
}
