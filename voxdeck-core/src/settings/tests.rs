use crate::settings::manager::SettingsManager;
use crate::settings::{GlobalAudioSettings, ProviderConfig, Settings};
use crate::speech::MockBehavior;
use tempfile::TempDir;

#[test]
fn test_missing_file_is_created_with_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("nested").join("settings.toml");

    let manager = SettingsManager::from_path(settings_path.clone()).unwrap();

    assert!(settings_path.exists());
    assert_eq!(manager.settings(), Settings::default());
    assert_eq!(manager.settings().sample_rate, 24000);
    assert_eq!(manager.path(), settings_path.as_path());
}

#[test]
fn test_saved_settings_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("settings.toml");

    let manager = SettingsManager::from_path(settings_path.clone()).unwrap();
    manager.update_setting(|settings| {
        settings.audio.voice = Some("ember".to_string());
        settings.audio.speed = 1.25;
        settings.audio.seed = Some(42);
        settings.provider = ProviderConfig::Http {
            endpoint: "https://speech.example.net".to_string(),
            api_key: Some("key".to_string()),
            model: None,
        };
    });
    manager.save().unwrap();

    let reloaded = SettingsManager::from_path(settings_path).unwrap();
    assert_eq!(reloaded.settings(), manager.settings());
}

#[test]
fn test_updates_stay_in_memory_until_saved() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("settings.toml");

    let manager = SettingsManager::from_path(settings_path.clone()).unwrap();
    manager.update_setting(|settings| settings.sample_rate = 16000);

    let other = SettingsManager::from_path(settings_path).unwrap();
    assert_eq!(manager.settings().sample_rate, 16000);
    assert_eq!(other.settings().sample_rate, 24000);
}

#[test]
fn test_corrupt_file_is_backed_up() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("settings.toml");
    std::fs::write(&settings_path, "sample_rate = [not valid").unwrap();

    let manager = SettingsManager::from_path(settings_path.clone()).unwrap();

    assert_eq!(manager.settings(), Settings::default());
    let backup = temp_dir.path().join("settings.toml.backup");
    assert_eq!(
        std::fs::read_to_string(backup).unwrap(),
        "sample_rate = [not valid"
    );
}

#[test]
fn test_partial_file_fills_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("settings.toml");

    let toml_content = r#"
sample_rate = 16000
unknown_field = "this should be ignored"

[audio]
style = "calm radio host"

[provider]
type = "mock"
behavior = { fixed = { bytes = 96 } }
    "#;
    std::fs::write(&settings_path, toml_content).unwrap();

    let settings = SettingsManager::from_path(settings_path).unwrap().settings();

    assert_eq!(settings.sample_rate, 16000);
    assert_eq!(settings.audio.style.as_deref(), Some("calm radio host"));
    assert_eq!(settings.audio.speed, 1.0);
    assert_eq!(
        settings.provider,
        ProviderConfig::Mock {
            behavior: MockBehavior::Fixed { bytes: 96 }
        }
    );
}

#[test]
fn test_audio_settings_validation() {
    assert!(GlobalAudioSettings::default().validate().is_ok());

    let too_fast = GlobalAudioSettings {
        speed: 5.0,
        ..Default::default()
    };
    assert!(too_fast.validate().is_err());

    let too_flat = GlobalAudioSettings {
        expressiveness: -0.1,
        ..Default::default()
    };
    assert!(too_flat.validate().is_err());
}

#[test]
fn test_invalid_audio_settings_are_not_saved() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("settings.toml");
    let manager = SettingsManager::from_path(settings_path.clone()).unwrap();

    let mut settings = manager.settings();
    settings.audio.speed = 0.0;

    assert!(manager.save_settings(settings).is_err());
    let reloaded = SettingsManager::from_path(settings_path).unwrap();
    assert_eq!(reloaded.settings().audio.speed, 1.0);
}

#[test]
fn test_zero_sample_rate_rejected() {
    let settings = Settings {
        sample_rate: 0,
        ..Default::default()
    };
    assert!(settings.validate().is_err());
    assert!(Settings::default().validate().is_ok());

    let temp_dir = TempDir::new().unwrap();
    let manager = SettingsManager::from_path(temp_dir.path().join("settings.toml")).unwrap();
    assert!(manager.save_settings(settings).is_err());
    assert_eq!(manager.settings().sample_rate, 24000);
}
