//! Stacktris library - Tetris with profiles, statistics and rankings
//!
//! The game rules live in [`stacktris_core`]; this crate adds everything
//! around a game: persistence, per-user statistics, leaderboards, settings,
//! the auth callback and client-side auth store, and the HTTP API.
//!
//! # Architecture
//!
//! - **Core**: board, pieces, 7-bag, gravity, scoring (`stacktris_core`)
//! - **Db**: diesel/SQLite repository for profiles, games, settings, rankings
//! - **Service**: [`ProfileService`] business rules over the repository
//! - **Auth**: provider seam, callback redirects, persisted [`AuthStore`]
//! - **Server**: axum router exposing the service over JSON
//!
//! # Example
//!
//! ```no_run
//! use stacktris::{GameConfig, GameRepository, ProfileService, SimpleBot, play_game};
//!
//! # fn example() -> anyhow::Result<()> {
//! let repository = GameRepository::new("stacktris.db".to_string())?;
//! repository.run_migrations()?;
//! let service = ProfileService::new(repository);
//!
//! let game = play_game(&SimpleBot::new("bot"), GameConfig::default(), 7, 1_000, 1_000)?;
//! if game.is_over() {
//!     service.record_finished_game(&game, None, None)?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod autoplay;
mod config;
mod db;
mod profile_service;
mod ranking;
mod server;
mod settings;
mod stats;

pub mod auth;
pub mod navigation;

// Crate-level exports - Game engine
pub use stacktris_core::{
    BOARD_HEIGHT, BOARD_WIDTH, Board, GameConfig, GameError, GameState, GameStats, GameStatus,
    Rotation, Tetromino, TetrominoKind,
};

// Crate-level exports - Database
pub use db::{
    DbError, GameRecord, GameRepository, GameSummary, MIGRATIONS, NewGameRecord, NewProfile,
    NewRanking, Profile, ProfileChanges, Ranking, UserSettingsRow,
};

// Crate-level exports - Services
pub use profile_service::{
    MAX_USERNAME_LEN, ProfileService, ServiceError, ServiceErrorKind, StatisticsReport,
    username_from_email,
};
pub use ranking::{
    RankedEntry, RankingPartition, RankingWindow, compute_rankings, to_new_rankings,
};
pub use settings::{Locale, MAX_VOLUME, SettingsError, Theme, UserSettings};
pub use stats::{PersonalBest, UserStatistics};

// Crate-level exports - Auth
pub use auth::{
    AuthError, AuthErrorKind, AuthProvider, AuthSession, AuthStore, AuthUser, CallbackOutcome,
    CallbackRedirect, HostedAuthClient, PersistedAuth, resolve_callback,
};

// Crate-level exports - Navigation
pub use navigation::{NAV_ITEMS, NavItem, ROUTES, active_item, is_active};

// Crate-level exports - Configuration
pub use config::{AppConfig, ConfigError};

// Crate-level exports - HTTP API
pub use server::{ApiError, AppError, AppState, CallbackQuery, SubmitGameRequest, create_router};

// Crate-level exports - Autoplay
pub use autoplay::{Placement, SimpleBot, play_game};
