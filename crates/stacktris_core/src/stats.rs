//! Running totals for a game in progress.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

use crate::GameConfig;

/// Score, level and counters accumulated during one game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct GameStats {
    score: u32,
    level: u32,
    lines: u32,
    tetrominoes: u32,
    singles: u32,
    doubles: u32,
    triples: u32,
    tetrises: u32,
    elapsed_ms: u64,
}

impl GameStats {
    /// Creates zeroed stats at the given starting level.
    pub fn new(start_level: u32) -> Self {
        Self {
            level: start_level,
            ..Self::default()
        }
    }

    /// Whole seconds played.
    pub fn duration_secs(&self) -> u64 {
        self.elapsed_ms / 1_000
    }

    pub(crate) fn add_points(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    pub(crate) fn add_elapsed(&mut self, dt_ms: u32) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(u64::from(dt_ms));
    }

    /// Accounts for a locked piece that cleared `cleared` rows. Points use
    /// the level in effect before the clear.
    pub(crate) fn record_lock(&mut self, cleared: usize, config: &GameConfig) -> u32 {
        self.tetrominoes = self.tetrominoes.saturating_add(1);
        match cleared {
            0 => {}
            1 => self.singles += 1,
            2 => self.doubles += 1,
            3 => self.triples += 1,
            _ => self.tetrises += 1,
        }
        let points = config.line_clear_points(cleared, self.level);
        self.add_points(points);
        self.lines = self.lines.saturating_add(cleared as u32);
        self.level = config.level_for_lines(self.lines);
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_up_applies_after_scoring() {
        let config = GameConfig::default();
        let mut stats = GameStats::new(1);
        for _ in 0..2 {
            stats.record_lock(4, &config);
        }
        assert_eq!(*stats.score(), 1_600);
        assert_eq!(*stats.level(), 1);
        let points = stats.record_lock(2, &config);
        assert_eq!(points, 300);
        assert_eq!(*stats.lines(), 10);
        assert_eq!(*stats.level(), 2);
        assert_eq!(*stats.tetrises(), 2);
        assert_eq!(*stats.doubles(), 1);
        assert_eq!(*stats.tetrominoes(), 3);
    }

    #[test]
    fn duration_truncates_to_seconds() {
        let mut stats = GameStats::new(1);
        stats.add_elapsed(1_999);
        assert_eq!(stats.duration_secs(), 1);
    }
}
