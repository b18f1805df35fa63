//! Database repository for profiles, game records, settings and rankings.

use chrono::NaiveDateTime;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel_migrations::MigrationHarness;
use tracing::{debug, info, instrument};

use crate::db::{
    DbError, GameRecord, MIGRATIONS, NewGameRecord, NewProfile, NewRanking, Profile,
    ProfileChanges, Ranking, UserSettingsRow, schema,
};
use crate::ranking::{RankingPartition, RankingWindow, compute_rankings, to_new_rankings};

/// Milliseconds a connection waits on a locked database before failing.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Database repository for every persisted record.
#[derive(Debug, Clone)]
pub struct GameRepository {
    db_path: String,
}

impl GameRepository {
    /// Creates a new repository connected to the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        if db_path.trim().is_empty() {
            return Err(DbError::new("Database path is empty"));
        }
        info!(path = %db_path, "Creating GameRepository");
        Ok(Self { db_path })
    }

    /// Returns the database path.
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Establishes a database connection with foreign keys enforced, a busy
    /// timeout and write-ahead logging.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))?;
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL;",
            BUSY_TIMEOUT_MS
        ))?;
        Ok(conn)
    }

    /// Applies all pending embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a migration fails.
    #[instrument(skip(self))]
    pub fn run_migrations(&self) -> Result<usize, DbError> {
        let mut conn = self.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(format!("Migration failed: {}", e)))?;
        info!(count = applied.len(), "Migrations applied");
        Ok(applied.len())
    }

    // ─────────────────────────────────────────────────────────────
    //  Profiles
    // ─────────────────────────────────────────────────────────────

    /// Creates a new profile.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the username or auth id is taken.
    #[instrument(skip(self, profile))]
    pub fn create_profile(&self, profile: NewProfile) -> Result<Profile, DbError> {
        let mut conn = self.connection()?;

        let profile = diesel::insert_into(schema::profiles::table)
            .values(&profile)
            .returning(Profile::as_returning())
            .get_result(&mut conn)?;

        info!(user_id = profile.id(), username = %profile.username(), "Profile created");
        Ok(profile)
    }

    /// Gets a profile by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_profile(&self, id: i32) -> Result<Option<Profile>, DbError> {
        let mut conn = self.connection()?;
        let profile = schema::profiles::table
            .find(id)
            .select(Profile::as_select())
            .first(&mut conn)
            .optional()?;
        debug!(found = profile.is_some(), "Profile lookup by id");
        Ok(profile)
    }

    /// Gets a profile by username.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_profile_by_username(&self, username: &str) -> Result<Option<Profile>, DbError> {
        let mut conn = self.connection()?;
        let profile = schema::profiles::table
            .filter(schema::profiles::username.eq(username))
            .select(Profile::as_select())
            .first(&mut conn)
            .optional()?;
        debug!(found = profile.is_some(), "Profile lookup by username");
        Ok(profile)
    }

    /// Gets the profile linked to an auth provider identity.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_profile_by_auth_id(&self, auth_user_id: &str) -> Result<Option<Profile>, DbError> {
        let mut conn = self.connection()?;
        let profile = schema::profiles::table
            .filter(schema::profiles::auth_user_id.eq(auth_user_id))
            .select(Profile::as_select())
            .first(&mut conn)
            .optional()?;
        debug!(found = profile.is_some(), "Profile lookup by auth id");
        Ok(profile)
    }

    /// Lists all profiles, ordered by creation time.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_profiles(&self) -> Result<Vec<Profile>, DbError> {
        let mut conn = self.connection()?;
        let profiles = schema::profiles::table
            .order((schema::profiles::created_at.asc(), schema::profiles::id.asc()))
            .select(Profile::as_select())
            .load(&mut conn)?;
        info!(count = profiles.len(), "Profiles loaded");
        Ok(profiles)
    }

    /// Applies edits to a profile. Returns `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the new username is taken.
    #[instrument(skip(self, changes))]
    pub fn update_profile(
        &self,
        id: i32,
        mut changes: ProfileChanges,
        now: NaiveDateTime,
    ) -> Result<Option<Profile>, DbError> {
        let mut conn = self.connection()?;
        changes.updated_at = Some(now);

        let profile = diesel::update(schema::profiles::table.find(id))
            .set(&changes)
            .returning(Profile::as_returning())
            .get_result(&mut conn)
            .optional()?;

        if let Some(ref p) = profile {
            info!(user_id = p.id(), username = %p.username(), "Profile updated");
        }
        Ok(profile)
    }

    // ─────────────────────────────────────────────────────────────
    //  Game records
    // ─────────────────────────────────────────────────────────────

    /// Records a completed game.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the user does not exist or a database error occurs.
    #[instrument(skip(self, record), fields(user_id = ?record.user_id(), score = record.score()))]
    pub fn record_game(&self, record: NewGameRecord) -> Result<GameRecord, DbError> {
        let mut conn = self.connection()?;

        let record = diesel::insert_into(schema::game_records::table)
            .values(&record)
            .returning(GameRecord::as_returning())
            .get_result(&mut conn)?;

        info!(
            record_id = record.id(),
            user_id = ?record.user_id(),
            score = record.score(),
            is_guest = record.is_guest(),
            "Game recorded"
        );
        Ok(record)
    }

    /// Records a completed game and rebuilds the rankings of `windows` in the
    /// same write transaction, so the game and its rankings commit together.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the user does not exist or a database error
    /// occurs; nothing is changed.
    #[instrument(
        skip(self, record, windows),
        fields(user_id = ?record.user_id(), windows = windows.len())
    )]
    pub fn record_game_with_rankings(
        &self,
        record: NewGameRecord,
        windows: &[RankingWindow],
        now: NaiveDateTime,
    ) -> Result<GameRecord, DbError> {
        let mut conn = self.connection()?;
        let saved = conn.immediate_transaction::<_, DbError, _>(|conn| {
            let saved = diesel::insert_into(schema::game_records::table)
                .values(&record)
                .returning(GameRecord::as_returning())
                .get_result(conn)?;
            for window in windows {
                rebuild_window(conn, window, now)?;
            }
            Ok(saved)
        })?;

        info!(
            record_id = saved.id(),
            score = saved.score(),
            is_guest = saved.is_guest(),
            "Game recorded with rankings"
        );
        Ok(saved)
    }

    /// Gets all game records for a user, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_user_records(&self, user_id: i32) -> Result<Vec<GameRecord>, DbError> {
        let mut conn = self.connection()?;
        let records = schema::game_records::table
            .filter(schema::game_records::user_id.eq(user_id))
            .order((
                schema::game_records::played_at.desc(),
                schema::game_records::id.desc(),
            ))
            .select(GameRecord::as_select())
            .load(&mut conn)?;
        debug!(count = records.len(), "User records loaded");
        Ok(records)
    }

    /// Gets non-guest records played in `[start, end)`; an open `end` means
    /// no upper bound.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_member_records_between(
        &self,
        start: NaiveDateTime,
        end: Option<NaiveDateTime>,
    ) -> Result<Vec<GameRecord>, DbError> {
        let mut conn = self.connection()?;
        member_records_between(&mut conn, start, end)
    }

    // ─────────────────────────────────────────────────────────────
    //  Settings
    // ─────────────────────────────────────────────────────────────

    /// Gets a user's stored settings.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_settings(&self, user_id: i32) -> Result<Option<UserSettingsRow>, DbError> {
        let mut conn = self.connection()?;
        let row = schema::user_settings::table
            .find(user_id)
            .select(UserSettingsRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row)
    }

    /// Inserts or replaces a user's settings.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the user does not exist or a database error occurs.
    #[instrument(skip(self, row), fields(user_id = row.user_id))]
    pub fn upsert_settings(&self, row: UserSettingsRow) -> Result<UserSettingsRow, DbError> {
        let mut conn = self.connection()?;
        let saved = diesel::insert_into(schema::user_settings::table)
            .values(&row)
            .on_conflict(schema::user_settings::user_id)
            .do_update()
            .set(&row)
            .returning(UserSettingsRow::as_returning())
            .get_result(&mut conn)?;
        info!(user_id = saved.user_id, "Settings saved");
        Ok(saved)
    }

    // ─────────────────────────────────────────────────────────────
    //  Rankings
    // ─────────────────────────────────────────────────────────────

    /// Replaces every row of one partition period with `rows`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs; nothing is changed.
    #[instrument(skip(self, rows), fields(partition = %partition, rows = rows.len()))]
    pub fn replace_rankings(
        &self,
        partition: RankingPartition,
        period_start: NaiveDateTime,
        rows: Vec<NewRanking>,
    ) -> Result<usize, DbError> {
        let mut conn = self.connection()?;
        let inserted = conn.immediate_transaction::<_, DbError, _>(|conn| {
            replace_period(conn, partition, period_start, &rows)
        })?;

        info!(inserted, "Rankings replaced");
        Ok(inserted)
    }

    /// Recomputes one window from the stored records and replaces its rows.
    /// The read and the write share one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs; nothing is changed.
    #[instrument(skip(self), fields(partition = %window.partition()))]
    pub fn refresh_rankings(
        &self,
        window: &RankingWindow,
        now: NaiveDateTime,
    ) -> Result<usize, DbError> {
        let mut conn = self.connection()?;
        let inserted =
            conn.immediate_transaction::<_, DbError, _>(|conn| rebuild_window(conn, window, now))?;
        info!(inserted, "Rankings refreshed");
        Ok(inserted)
    }

    /// Lists one partition period, best rank first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_rankings(
        &self,
        partition: RankingPartition,
        period_start: NaiveDateTime,
    ) -> Result<Vec<Ranking>, DbError> {
        use schema::rankings::dsl;

        let mut conn = self.connection()?;
        let rows = dsl::rankings
            .filter(dsl::partition_name.eq(partition.to_string()))
            .filter(dsl::period_start.eq(period_start))
            .order(dsl::rank.asc())
            .select(Ranking::as_select())
            .load(&mut conn)?;
        debug!(count = rows.len(), "Rankings loaded");
        Ok(rows)
    }

    /// Gets every ranking row held by a user, newest period first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_user_rankings(&self, user_id: i32) -> Result<Vec<Ranking>, DbError> {
        use schema::rankings::dsl;

        let mut conn = self.connection()?;
        let rows = dsl::rankings
            .filter(dsl::user_id.eq(user_id))
            .order((dsl::period_start.desc(), dsl::partition_name.asc()))
            .select(Ranking::as_select())
            .load(&mut conn)?;
        Ok(rows)
    }
}

fn member_records_between(
    conn: &mut SqliteConnection,
    start: NaiveDateTime,
    end: Option<NaiveDateTime>,
) -> Result<Vec<GameRecord>, DbError> {
    let mut query = schema::game_records::table
        .filter(schema::game_records::is_guest.eq(false))
        .filter(schema::game_records::played_at.ge(start))
        .into_boxed();
    if let Some(end) = end {
        query = query.filter(schema::game_records::played_at.lt(end));
    }
    let records = query
        .order(schema::game_records::played_at.asc())
        .select(GameRecord::as_select())
        .load(conn)?;
    debug!(count = records.len(), "Window records loaded");
    Ok(records)
}

fn replace_period(
    conn: &mut SqliteConnection,
    partition: RankingPartition,
    period_start: NaiveDateTime,
    rows: &[NewRanking],
) -> Result<usize, DbError> {
    use schema::rankings::dsl;

    let removed = diesel::delete(
        dsl::rankings
            .filter(dsl::partition_name.eq(partition.to_string()))
            .filter(dsl::period_start.eq(period_start)),
    )
    .execute(conn)?;
    debug!(removed, "Old ranking rows removed");
    if rows.is_empty() {
        return Ok(0);
    }
    let inserted = diesel::insert_into(dsl::rankings)
        .values(rows)
        .execute(conn)?;
    Ok(inserted)
}

fn rebuild_window(
    conn: &mut SqliteConnection,
    window: &RankingWindow,
    now: NaiveDateTime,
) -> Result<usize, DbError> {
    let records = member_records_between(conn, *window.start(), *window.end())?;
    let entries = compute_rankings(&records, window);
    let rows = to_new_rankings(&entries, window, now);
    replace_period(conn, *window.partition(), *window.start(), &rows)
}
