//! Profile, game record, settings and ranking business logic.

use chrono::{NaiveDateTime, Utc};
use derive_more::{Display, Error};
use serde::Serialize;
use stacktris_core::GameState;
use tracing::{debug, info, instrument, warn};

use crate::auth::AuthUser;
use crate::db::{
    DbError, GameRecord, GameRepository, GameSummary, NewGameRecord, NewProfile, Profile,
    ProfileChanges, Ranking,
};
use crate::ranking::{RankingPartition, RankingWindow};
use crate::settings::{SettingsError, UserSettings};
use crate::stats::{PersonalBest, UserStatistics};

/// Longest accepted username.
pub const MAX_USERNAME_LEN: usize = 32;

/// Category of a service failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ServiceErrorKind {
    /// A referenced profile does not exist.
    #[display("not found")]
    NotFound,
    /// Input was rejected.
    #[display("invalid")]
    Invalid,
    /// A unique value is already taken.
    #[display("conflict")]
    Conflict,
    /// The database failed.
    #[display("storage")]
    Storage,
}

/// Profile service error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Service error ({}): {} at {}:{}", kind, message, file, line)]
pub struct ServiceError {
    /// Failure category.
    pub kind: ServiceErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ServiceError {
    /// Creates a new service error with caller location tracking.
    #[track_caller]
    pub fn new(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    #[track_caller]
    fn not_found(user_id: i32) -> Self {
        Self::new(ServiceErrorKind::NotFound, format!("Profile {} not found", user_id))
    }

    #[track_caller]
    fn invalid(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Invalid, message)
    }
}

impl From<DbError> for ServiceError {
    #[track_caller]
    fn from(err: DbError) -> Self {
        let kind = if err.constraint {
            ServiceErrorKind::Conflict
        } else {
            ServiceErrorKind::Storage
        };
        Self::new(kind, err.message)
    }
}

impl From<SettingsError> for ServiceError {
    #[track_caller]
    fn from(err: SettingsError) -> Self {
        Self::invalid(err.message)
    }
}

/// Statistics and personal best for one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsReport {
    /// Lifetime totals.
    pub statistics: UserStatistics,
    /// Best values, absent before the first game.
    pub personal_best: Option<PersonalBest>,
}

/// Service layer over [`GameRepository`].
#[derive(Debug, Clone)]
pub struct ProfileService {
    repository: GameRepository,
}

impl ProfileService {
    /// Creates a new profile service backed by the given repository.
    #[instrument(skip(repository))]
    pub fn new(repository: GameRepository) -> Self {
        info!("Creating ProfileService");
        Self { repository }
    }

    /// Returns the underlying repository.
    pub fn repository(&self) -> &GameRepository {
        &self.repository
    }

    // ─────────────────────────────────────────────────────────────
    //  Profiles
    // ─────────────────────────────────────────────────────────────

    /// Returns the profile linked to `user`, creating it on first sight.
    ///
    /// A new profile takes `username` when given, otherwise the local part
    /// of the user's email. Taken names get a numeric suffix.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the name is invalid or the database fails.
    #[instrument(skip(self, user), fields(auth_user_id = %user.id()))]
    pub fn get_or_create_profile(
        &self,
        user: &AuthUser,
        username: Option<String>,
    ) -> Result<Profile, ServiceError> {
        if let Some(profile) = self.repository.get_profile_by_auth_id(user.id())? {
            debug!(user_id = profile.id(), "Existing profile found");
            return Ok(profile);
        }

        let base = match username {
            Some(name) => {
                validate_username(&name)?;
                name
            }
            None => username_from_email(user.email().as_deref()),
        };
        let username = self.unique_username(&base)?;

        info!(username = %username, "Creating new profile");
        let profile = self
            .repository
            .create_profile(NewProfile::new(user.id().clone(), username, None))?;
        Ok(profile)
    }

    fn unique_username(&self, base: &str) -> Result<String, ServiceError> {
        if self.repository.get_profile_by_username(base)?.is_none() {
            return Ok(base.to_string());
        }
        for suffix in 2u32.. {
            let tail = suffix.to_string();
            let head: String = base
                .chars()
                .take(MAX_USERNAME_LEN.saturating_sub(tail.len()))
                .collect();
            let candidate = format!("{}{}", head, tail);
            if self.repository.get_profile_by_username(&candidate)?.is_none() {
                debug!(candidate = %candidate, "Username de-duplicated");
                return Ok(candidate);
            }
        }
        Err(ServiceError::new(ServiceErrorKind::Conflict, "No free username"))
    }

    /// Returns a profile by id.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if it does not exist.
    #[instrument(skip(self))]
    pub fn get_profile(&self, user_id: i32) -> Result<Profile, ServiceError> {
        self.repository
            .get_profile(user_id)?
            .ok_or_else(|| ServiceError::not_found(user_id))
    }

    /// Applies profile edits.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the profile is missing, the new username is
    /// invalid or already taken.
    #[instrument(skip(self, changes))]
    pub fn update_profile(
        &self,
        user_id: i32,
        changes: ProfileChanges,
    ) -> Result<Profile, ServiceError> {
        if let Some(ref name) = changes.username {
            validate_username(name)?;
        }
        if changes.is_empty() {
            debug!("No profile changes");
            return self.get_profile(user_id);
        }
        self.repository
            .update_profile(user_id, changes, now())?
            .ok_or_else(|| ServiceError::not_found(user_id))
    }

    // ─────────────────────────────────────────────────────────────
    //  Game records
    // ─────────────────────────────────────────────────────────────

    /// Records a finished game. Without `user_id` it is stored as a guest
    /// game and never ranks.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the game is not over or the user is unknown.
    #[instrument(skip(self, state), fields(status = %state.status()))]
    pub fn record_finished_game(
        &self,
        state: &GameState,
        user_id: Option<i32>,
        session_id: Option<String>,
    ) -> Result<GameRecord, ServiceError> {
        if !state.is_over() {
            warn!("Attempted to record a game still in progress");
            return Err(ServiceError::invalid(format!(
                "Game is {}, not game over",
                state.status()
            )));
        }
        let summary = GameSummary::from(state.stats());
        self.record_summary(&summary, user_id, session_id, now())
    }

    /// Records a finished game summary played at `played_at`. A member game
    /// rebuilds every ranking window containing it in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the user is unknown or the database fails.
    #[instrument(skip(self, summary), fields(score = summary.score()))]
    pub fn record_summary(
        &self,
        summary: &GameSummary,
        user_id: Option<i32>,
        session_id: Option<String>,
        played_at: NaiveDateTime,
    ) -> Result<GameRecord, ServiceError> {
        if let Some(id) = user_id {
            self.get_profile(id)?;
        }

        let new_record = NewGameRecord::from_summary(summary, user_id, session_id, played_at);
        let record = if user_id.is_some() {
            let windows = RankingPartition::ALL.map(|p| RankingWindow::containing(p, played_at));
            self.repository
                .record_game_with_rankings(new_record, &windows, now())?
        } else {
            self.repository.record_game(new_record)?
        };
        Ok(record)
    }

    /// Returns a user's games, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the profile is missing.
    #[instrument(skip(self))]
    pub fn get_history(&self, user_id: i32) -> Result<Vec<GameRecord>, ServiceError> {
        self.get_profile(user_id)?;
        Ok(self.repository.get_user_records(user_id)?)
    }

    /// Returns lifetime statistics and the personal best of a user.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the profile is missing.
    #[instrument(skip(self))]
    pub fn get_statistics(&self, user_id: i32) -> Result<StatisticsReport, ServiceError> {
        let records = self.get_history(user_id)?;
        Ok(StatisticsReport {
            statistics: UserStatistics::from_records(&records),
            personal_best: PersonalBest::from_records(&records),
        })
    }

    // ─────────────────────────────────────────────────────────────
    //  Settings
    // ─────────────────────────────────────────────────────────────

    /// Returns a user's settings, or the defaults if never saved.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the profile is missing or the stored row is
    /// corrupt.
    #[instrument(skip(self))]
    pub fn get_settings(&self, user_id: i32) -> Result<UserSettings, ServiceError> {
        self.get_profile(user_id)?;
        match self.repository.get_settings(user_id)? {
            Some(row) => Ok(UserSettings::try_from(&row)?),
            None => Ok(UserSettings::default()),
        }
    }

    /// Validates and saves a user's settings.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if a value is out of range or the profile is
    /// missing.
    #[instrument(skip(self, settings))]
    pub fn update_settings(
        &self,
        user_id: i32,
        settings: UserSettings,
    ) -> Result<UserSettings, ServiceError> {
        settings.validate()?;
        self.get_profile(user_id)?;
        let row = self.repository.upsert_settings(settings.to_row(user_id, now()))?;
        Ok(UserSettings::try_from(&row)?)
    }

    // ─────────────────────────────────────────────────────────────
    //  Rankings
    // ─────────────────────────────────────────────────────────────

    /// Recomputes and stores the rankings of one window.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the database fails.
    #[instrument(skip(self), fields(partition = %window.partition()))]
    pub fn refresh_rankings(&self, window: RankingWindow) -> Result<usize, ServiceError> {
        Ok(self.repository.refresh_rankings(&window, now())?)
    }

    /// Returns the current leaderboard of `partition`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the database fails.
    #[instrument(skip(self))]
    pub fn get_rankings(&self, partition: RankingPartition) -> Result<Vec<Ranking>, ServiceError> {
        let window = RankingWindow::containing(partition, now());
        Ok(self.repository.list_rankings(partition, *window.start())?)
    }

    /// Returns every ranking row a user holds.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the profile is missing.
    #[instrument(skip(self))]
    pub fn get_user_rankings(&self, user_id: i32) -> Result<Vec<Ranking>, ServiceError> {
        self.get_profile(user_id)?;
        Ok(self.repository.get_user_rankings(user_id)?)
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn validate_username(name: &str) -> Result<(), ServiceError> {
    if name.trim().is_empty() {
        return Err(ServiceError::invalid("Username is empty"));
    }
    if name.chars().count() > MAX_USERNAME_LEN {
        return Err(ServiceError::invalid(format!(
            "Username is longer than {} characters",
            MAX_USERNAME_LEN
        )));
    }
    Ok(())
}

/// Derives a username from the local part of an email address.
pub fn username_from_email(email: Option<&str>) -> String {
    let local = email
        .and_then(|e| e.split('@').next())
        .unwrap_or_default();
    let name: String = local
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .take(MAX_USERNAME_LEN)
        .collect();
    if name.is_empty() {
        "player".to_string()
    } else {
        name
    }
}
