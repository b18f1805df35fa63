//! Leaderboard partitions, their time windows and rank computation.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use tracing::{debug, instrument};

use crate::db::{GameRecord, NewRanking};

/// Named leaderboard scope.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RankingPartition {
    /// All time.
    Overall,
    /// Monday 00:00 UTC to the following Monday.
    Weekly,
    /// Calendar month.
    Monthly,
    /// Calendar year.
    Yearly,
}

impl RankingPartition {
    /// Every partition.
    pub const ALL: [RankingPartition; 4] = [
        RankingPartition::Overall,
        RankingPartition::Weekly,
        RankingPartition::Monthly,
        RankingPartition::Yearly,
    ];
}

/// Half-open period `[start, end)` a partition ranks over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Getters)]
pub struct RankingWindow {
    partition: RankingPartition,
    start: NaiveDateTime,
    end: Option<NaiveDateTime>,
}

impl RankingWindow {
    /// The window of `partition` that contains `now` (UTC).
    #[instrument]
    pub fn containing(partition: RankingPartition, now: NaiveDateTime) -> Self {
        let today = now.date();
        let (start, end) = match partition {
            RankingPartition::Overall => (DateTime::UNIX_EPOCH.naive_utc(), None),
            RankingPartition::Weekly => {
                let back = i64::from(today.weekday().num_days_from_monday());
                let start = midnight(today - TimeDelta::days(back));
                (start, Some(start + TimeDelta::days(7)))
            }
            RankingPartition::Monthly => {
                let (year, month) = if today.month() == 12 {
                    (today.year() + 1, 1)
                } else {
                    (today.year(), today.month() + 1)
                };
                (
                    midnight(first_of_month(today.year(), today.month())),
                    Some(midnight(first_of_month(year, month))),
                )
            }
            RankingPartition::Yearly => (
                midnight(first_of_month(today.year(), 1)),
                Some(midnight(first_of_month(today.year() + 1, 1))),
            ),
        };
        Self {
            partition,
            start,
            end,
        }
    }

    /// Whether `at` falls inside the window.
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        at >= self.start && self.end.is_none_or(|end| at < end)
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    // month is always 1..=12 here
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

/// One user's computed position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
pub struct RankedEntry {
    user_id: i32,
    rank: i32,
    best_score: i32,
    games_played: i32,
    best_at: NaiveDateTime,
}

/// Ranks users by their best score inside `window`.
///
/// Guest records and records outside the window are ignored. Ties on score
/// go to whoever reached it first, then to the lower user id.
#[instrument(skip(records), fields(records = records.len()))]
pub fn compute_rankings(records: &[GameRecord], window: &RankingWindow) -> Vec<RankedEntry> {
    let mut by_user: HashMap<i32, (i32, NaiveDateTime, i32)> = HashMap::new();

    for record in records {
        let Some(user_id) = *record.user_id() else {
            continue;
        };
        if *record.is_guest() || !window.contains(*record.played_at()) {
            continue;
        }
        let score = *record.score();
        let at = *record.played_at();
        by_user
            .entry(user_id)
            .and_modify(|(best, best_at, games)| {
                *games += 1;
                if score > *best || (score == *best && at < *best_at) {
                    *best = score;
                    *best_at = at;
                }
            })
            .or_insert((score, at, 1));
    }

    let mut entries: Vec<_> = by_user
        .into_iter()
        .map(|(user_id, (best_score, best_at, games_played))| RankedEntry {
            user_id,
            rank: 0,
            best_score,
            games_played,
            best_at,
        })
        .collect();

    entries.sort_by(|a, b| {
        b.best_score
            .cmp(&a.best_score)
            .then(a.best_at.cmp(&b.best_at))
            .then(a.user_id.cmp(&b.user_id))
    });
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.rank = index as i32 + 1;
    }

    debug!(ranked = entries.len(), partition = %window.partition, "Rankings computed");
    entries
}

/// Converts computed entries into insertable rows for `window`.
pub fn to_new_rankings(
    entries: &[RankedEntry],
    window: &RankingWindow,
    now: NaiveDateTime,
) -> Vec<NewRanking> {
    entries
        .iter()
        .map(|e| {
            NewRanking::new(
                e.user_id,
                window.partition.to_string(),
                window.start,
                window.end,
                e.rank,
                e.best_score,
                e.games_played,
                now,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn weekly_window_starts_monday() {
        // 2026-10-17 is a Saturday
        let window = RankingWindow::containing(RankingPartition::Weekly, at(2026, 10, 17, 15));
        assert_eq!(*window.start(), at(2026, 10, 12, 0));
        assert_eq!(*window.end(), Some(at(2026, 10, 19, 0)));
        assert!(window.contains(at(2026, 10, 12, 0)));
        assert!(!window.contains(at(2026, 10, 19, 0)));
    }

    #[test]
    fn monthly_window_rolls_over_december() {
        let window = RankingWindow::containing(RankingPartition::Monthly, at(2026, 12, 31, 23));
        assert_eq!(*window.start(), at(2026, 12, 1, 0));
        assert_eq!(*window.end(), Some(at(2027, 1, 1, 0)));
    }

    #[test]
    fn yearly_and_overall_windows() {
        let yearly = RankingWindow::containing(RankingPartition::Yearly, at(2026, 6, 1, 0));
        assert_eq!(*yearly.start(), at(2026, 1, 1, 0));
        let overall = RankingWindow::containing(RankingPartition::Overall, at(2026, 6, 1, 0));
        assert!(overall.end().is_none());
        assert!(overall.contains(at(1999, 1, 1, 0)));
    }

    #[test]
    fn partition_names_are_lowercase() {
        assert_eq!(RankingPartition::Weekly.to_string(), "weekly");
        assert_eq!("monthly".parse::<RankingPartition>().ok(), Some(RankingPartition::Monthly));
        assert!("daily".parse::<RankingPartition>().is_err());
    }
}
