//! Per-user aggregates derived from game records.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::db::GameRecord;

/// A user's best values across all recorded games.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
pub struct PersonalBest {
    best_score: i32,
    best_score_level: i32,
    best_score_lines: i32,
    best_score_at: NaiveDateTime,
    highest_level: i32,
    most_lines: i32,
    longest_duration_secs: i32,
}

impl PersonalBest {
    /// Folds records into a personal best. `None` when there are no records.
    ///
    /// Ties on best score keep the earlier game.
    #[instrument(skip(records), fields(records = records.len()))]
    pub fn from_records(records: &[GameRecord]) -> Option<Self> {
        let first = records.first()?;
        let seed = Self {
            best_score: *first.score(),
            best_score_level: *first.level(),
            best_score_lines: *first.lines_cleared(),
            best_score_at: *first.played_at(),
            highest_level: *first.level(),
            most_lines: *first.lines_cleared(),
            longest_duration_secs: *first.duration_secs(),
        };

        let best = records.iter().skip(1).fold(seed, |mut acc, r| {
            let score = *r.score();
            let earlier = *r.played_at() < acc.best_score_at;
            if score > acc.best_score || (score == acc.best_score && earlier) {
                acc.best_score = score;
                acc.best_score_level = *r.level();
                acc.best_score_lines = *r.lines_cleared();
                acc.best_score_at = *r.played_at();
            }
            acc.highest_level = acc.highest_level.max(*r.level());
            acc.most_lines = acc.most_lines.max(*r.lines_cleared());
            acc.longest_duration_secs = acc.longest_duration_secs.max(*r.duration_secs());
            acc
        });

        debug!(best_score = best.best_score, "Personal best computed");
        Some(best)
    }
}

/// Lifetime totals and averages for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Default, Getters)]
pub struct UserStatistics {
    total_games: u64,
    total_score: u64,
    total_lines: u64,
    total_play_secs: u64,
    total_tetrominoes: u64,
    average_score: f64,
    average_duration_secs: f64,
}

impl UserStatistics {
    /// Sums records. Zero records yield all zeroes.
    #[instrument(skip(records), fields(records = records.len()))]
    pub fn from_records(records: &[GameRecord]) -> Self {
        let mut stats = records.iter().fold(Self::default(), |mut acc, r| {
            acc.total_games += 1;
            acc.total_score += non_negative(*r.score());
            acc.total_lines += non_negative(*r.lines_cleared());
            acc.total_play_secs += non_negative(*r.duration_secs());
            acc.total_tetrominoes += non_negative(*r.tetromino_count());
            acc
        });

        if stats.total_games > 0 {
            let games = stats.total_games as f64;
            stats.average_score = stats.total_score as f64 / games;
            stats.average_duration_secs = stats.total_play_secs as f64 / games;
        }

        debug!(total_games = stats.total_games, "Statistics computed");
        stats
    }
}

fn non_negative(value: i32) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
