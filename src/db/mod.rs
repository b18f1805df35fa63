//! Database persistence layer for profiles, game records, settings and rankings.

mod error;
mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only

use diesel_migrations::{EmbeddedMigrations, embed_migrations};

pub use error::DbError;
pub use models::{
    GameRecord, GameSummary, NewGameRecord, NewProfile, NewRanking, Profile, ProfileChanges,
    Ranking, UserSettingsRow,
};
pub use repository::GameRepository;

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");
