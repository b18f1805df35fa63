//! Tests for configuration loading and user settings validation.

use std::io::Write;

use tempfile::NamedTempFile;

use stacktris::{AppConfig, Locale, Theme, UserSettings};

#[test]
fn test_defaults() {
    let config = AppConfig::default();
    assert_eq!(config.database_url(), "stacktris.db");
    assert_eq!(config.bind_addr(), "127.0.0.1:3000");
    assert!(config.require_auth_service().is_err());
}

#[test]
fn test_from_file_fills_missing_fields() {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(
        file,
        "service_url = \"https://auth.example\"\nanon_key = \"public\"\nport = 8080"
    )
    .expect("Write failed");

    let config = AppConfig::from_file(file.path()).expect("Load failed");
    assert_eq!(config.service_url(), "https://auth.example");
    assert_eq!(*config.port(), 8080);
    assert_eq!(config.host(), "127.0.0.1");
    assert!(config.require_auth_service().is_ok());
}

#[test]
fn test_invalid_file_is_an_error() {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(file, "port = \"not a number\"").expect("Write failed");
    assert!(AppConfig::from_file(file.path()).is_err());
}

#[test]
fn test_environment_overrides() {
    let config = AppConfig::default().with_overrides(|key| match key {
        "STACKTRIS_DATABASE_URL" => Some("/tmp/other.db".to_string()),
        "STACKTRIS_ANON_KEY" => Some("k".to_string()),
        _ => None,
    });
    assert_eq!(config.database_url(), "/tmp/other.db");
    assert_eq!(config.anon_key(), "k");
    assert_eq!(config.auth_store_path(), ".stacktris/auth.json");
}

#[test]
fn test_settings_defaults() {
    let settings = UserSettings::default();
    assert_eq!(settings.master_volume, 80);
    assert_eq!(settings.bgm_volume, 70);
    assert_eq!(settings.sfx_volume, 80);
    assert_eq!(settings.theme, Theme::System);
    assert_eq!(settings.locale, Locale::En);
    assert!(settings.notify_new_record && settings.notify_ranking_change);
    assert!(settings.validate().is_ok());
}

#[test]
fn test_settings_volume_bounds() {
    assert!(UserSettings::default().with_master_volume(100).validate().is_ok());
    assert!(UserSettings::default().with_bgm_volume(101).validate().is_err());
}

#[test]
fn test_theme_and_locale_strings() {
    assert_eq!(Theme::Dark.to_string(), "dark");
    assert_eq!("ja".parse::<Locale>().ok(), Some(Locale::Ja));
    assert!("fr".parse::<Locale>().is_err());
}
