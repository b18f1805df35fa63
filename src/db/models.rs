//! Database models and domain types.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use stacktris_core::GameStats;
use tracing::instrument;

use crate::db::{DbError, schema};
use crate::ranking::RankingPartition;

/// User identity projection.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Selectable, Getters, Serialize)]
#[diesel(table_name = schema::profiles)]
pub struct Profile {
    id: i32,
    auth_user_id: String,
    username: String,
    avatar_url: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

/// Insertable profile for a newly seen user.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::profiles)]
pub struct NewProfile {
    auth_user_id: String,
    username: String,
    avatar_url: Option<String>,
}

/// Editable profile fields. `None` leaves a field unchanged; an avatar of
/// `Some(None)` removes it.
#[derive(Debug, Clone, Default, AsChangeset, Deserialize)]
#[diesel(table_name = schema::profiles)]
pub struct ProfileChanges {
    /// New username.
    pub username: Option<String>,
    /// New avatar URL.
    #[serde(default, with = "double_option")]
    pub avatar_url: Option<Option<String>>,
    /// Set by the repository on update.
    #[serde(skip)]
    pub updated_at: Option<NaiveDateTime>,
}

impl ProfileChanges {
    /// Whether no user-editable field is set.
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.avatar_url.is_none()
    }
}

mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer).map(Some)
    }
}

/// One completed play session.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Selectable, Getters, Serialize)]
#[diesel(table_name = schema::game_records)]
pub struct GameRecord {
    id: i32,
    user_id: Option<i32>,
    session_id: Option<String>,
    score: i32,
    level: i32,
    lines_cleared: i32,
    duration_secs: i32,
    tetromino_count: i32,
    is_guest: bool,
    played_at: NaiveDateTime,
}

/// Final numbers of a finished game, as submitted by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct GameSummary {
    score: u32,
    level: u32,
    lines_cleared: u32,
    duration_secs: u64,
    tetromino_count: u32,
}

impl From<&GameStats> for GameSummary {
    fn from(stats: &GameStats) -> Self {
        Self {
            score: *stats.score(),
            level: *stats.level(),
            lines_cleared: *stats.lines(),
            duration_secs: stats.duration_secs(),
            tetromino_count: *stats.tetrominoes(),
        }
    }
}

/// Insertable game record. Guest status always follows the absence of a
/// user id.
#[derive(Debug, Clone, Insertable, Getters)]
#[diesel(table_name = schema::game_records)]
pub struct NewGameRecord {
    user_id: Option<i32>,
    session_id: Option<String>,
    score: i32,
    level: i32,
    lines_cleared: i32,
    duration_secs: i32,
    tetromino_count: i32,
    is_guest: bool,
    played_at: NaiveDateTime,
}

impl NewGameRecord {
    /// Builds a record from a game summary.
    #[instrument(skip(summary))]
    pub fn from_summary(
        summary: &GameSummary,
        user_id: Option<i32>,
        session_id: Option<String>,
        played_at: NaiveDateTime,
    ) -> Self {
        Self {
            user_id,
            session_id,
            score: clamp_i32(u64::from(summary.score)),
            level: clamp_i32(u64::from(summary.level)),
            lines_cleared: clamp_i32(u64::from(summary.lines_cleared)),
            duration_secs: clamp_i32(summary.duration_secs),
            tetromino_count: clamp_i32(u64::from(summary.tetromino_count)),
            is_guest: user_id.is_none(),
            played_at,
        }
    }
}

fn clamp_i32(value: u64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Stored per-user preferences row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = schema::user_settings)]
#[diesel(primary_key(user_id))]
pub struct UserSettingsRow {
    pub(crate) user_id: i32,
    pub(crate) master_volume: i32,
    pub(crate) bgm_volume: i32,
    pub(crate) sfx_volume: i32,
    pub(crate) theme: String,
    pub(crate) locale: String,
    pub(crate) notify_new_record: bool,
    pub(crate) notify_ranking_change: bool,
    pub(crate) updated_at: NaiveDateTime,
}

/// A user's position in one leaderboard partition and period.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Selectable, Getters, Serialize)]
#[diesel(table_name = schema::rankings)]
pub struct Ranking {
    id: i32,
    user_id: i32,
    partition_name: String,
    period_start: NaiveDateTime,
    period_end: Option<NaiveDateTime>,
    rank: i32,
    best_score: i32,
    games_played: i32,
    updated_at: NaiveDateTime,
}

impl Ranking {
    /// Parses the stored partition name.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the stored name is not a known partition.
    #[instrument(skip(self), fields(partition = %self.partition_name))]
    pub fn partition(&self) -> Result<RankingPartition, DbError> {
        self.partition_name
            .parse()
            .map_err(|_| DbError::new(format!("Invalid partition: '{}'", self.partition_name)))
    }
}

/// Insertable ranking row.
#[derive(Debug, Clone, PartialEq, Eq, Insertable, Getters, new)]
#[diesel(table_name = schema::rankings)]
pub struct NewRanking {
    user_id: i32,
    partition_name: String,
    period_start: NaiveDateTime,
    period_end: Option<NaiveDateTime>,
    rank: i32,
    best_score: i32,
    games_played: i32,
    updated_at: NaiveDateTime,
}
