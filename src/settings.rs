//! User settings: audio volumes, theme, locale and notification toggles.

use chrono::NaiveDateTime;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString};
use tracing::instrument;

use crate::db::UserSettingsRow;

/// Highest accepted volume.
pub const MAX_VOLUME: u8 = 100;

/// Colour theme preference.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    /// Light theme.
    Light,
    /// Dark theme.
    Dark,
    /// Follow the operating system.
    #[default]
    System,
}

/// Interface language.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Locale {
    /// English.
    #[default]
    En,
    /// Japanese.
    Ja,
}

/// Invalid settings value.
#[derive(Debug, Clone, Display, Error)]
#[display("Settings error: {} at {}:{}", message, file, line)]
pub struct SettingsError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl SettingsError {
    /// Creates a new settings error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// User-configurable preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Setters)]
#[serde(default)]
#[setters(prefix = "with_")]
pub struct UserSettings {
    /// Overall volume, 0 to 100.
    pub master_volume: u8,
    /// Music volume, 0 to 100.
    pub bgm_volume: u8,
    /// Sound effect volume, 0 to 100.
    pub sfx_volume: u8,
    /// Colour theme.
    pub theme: Theme,
    /// Interface language.
    pub locale: Locale,
    /// Notify when a personal best is beaten.
    pub notify_new_record: bool,
    /// Notify when the user's rank changes.
    pub notify_ranking_change: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            master_volume: 80,
            bgm_volume: 70,
            sfx_volume: 80,
            theme: Theme::System,
            locale: Locale::En,
            notify_new_record: true,
            notify_ranking_change: true,
        }
    }
}

impl UserSettings {
    /// Checks that every volume is within 0 to 100.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] naming the first out-of-range volume.
    #[instrument]
    pub fn validate(&self) -> Result<(), SettingsError> {
        for (name, value) in [
            ("master_volume", self.master_volume),
            ("bgm_volume", self.bgm_volume),
            ("sfx_volume", self.sfx_volume),
        ] {
            if value > MAX_VOLUME {
                return Err(SettingsError::new(format!(
                    "{} must be at most {}, got {}",
                    name, MAX_VOLUME, value
                )));
            }
        }
        Ok(())
    }

    /// Builds the stored row for `user_id`.
    pub fn to_row(&self, user_id: i32, updated_at: NaiveDateTime) -> UserSettingsRow {
        UserSettingsRow {
            user_id,
            master_volume: i32::from(self.master_volume),
            bgm_volume: i32::from(self.bgm_volume),
            sfx_volume: i32::from(self.sfx_volume),
            theme: self.theme.to_string(),
            locale: self.locale.to_string(),
            notify_new_record: self.notify_new_record,
            notify_ranking_change: self.notify_ranking_change,
            updated_at,
        }
    }
}

impl TryFrom<&UserSettingsRow> for UserSettings {
    type Error = SettingsError;

    #[track_caller]
    fn try_from(row: &UserSettingsRow) -> Result<Self, Self::Error> {
        let volume = |name: &str, value: i32| {
            u8::try_from(value)
                .map_err(|_| SettingsError::new(format!("Stored {} out of range: {}", name, value)))
        };
        let settings = Self {
            master_volume: volume("master_volume", row.master_volume)?,
            bgm_volume: volume("bgm_volume", row.bgm_volume)?,
            sfx_volume: volume("sfx_volume", row.sfx_volume)?,
            theme: row
                .theme
                .parse()
                .map_err(|_| SettingsError::new(format!("Unknown theme: '{}'", row.theme)))?,
            locale: row
                .locale
                .parse()
                .map_err(|_| SettingsError::new(format!("Unknown locale: '{}'", row.locale)))?,
            notify_new_record: row.notify_new_record,
            notify_ranking_change: row.notify_ranking_change,
        };
        settings.validate()?;
        Ok(settings)
    }
}
