//! Game settings: scoring table, level pacing and timing.

use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Maximum number of preview pieces.
pub const MAX_PREVIEW: usize = 5;

/// Tunable rules for one game session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Setters)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct GameConfig {
    /// Level the game starts at (1-based).
    pub start_level: u32,
    /// Lines required to advance one level.
    pub lines_per_level: u32,
    /// Base points for clearing 1, 2, 3 and 4 lines, multiplied by level.
    pub line_clear_scores: [u32; 4],
    /// Points per row for a soft drop.
    pub soft_drop_points: u32,
    /// Points per row for a hard drop.
    pub hard_drop_points: u32,
    /// Number of upcoming pieces kept visible.
    pub preview_count: usize,
    /// Whether the hold slot may be used.
    pub hold_enabled: bool,
    /// Gravity interval at level 1.
    pub base_gravity_ms: u32,
    /// Gravity speed-up per level.
    pub gravity_step_ms: u32,
    /// Fastest gravity interval.
    pub min_gravity_ms: u32,
    /// Time a grounded piece may rest before it locks.
    pub lock_delay_ms: u32,
    /// Moves or rotations that may reset the lock delay per piece.
    pub max_lock_resets: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            start_level: 1,
            lines_per_level: 10,
            line_clear_scores: [100, 300, 500, 800],
            soft_drop_points: 1,
            hard_drop_points: 2,
            preview_count: 1,
            hold_enabled: true,
            base_gravity_ms: 1_000,
            gravity_step_ms: 50,
            min_gravity_ms: 100,
            lock_delay_ms: 500,
            max_lock_resets: 15,
        }
    }
}

impl GameConfig {
    /// Gravity interval for the given level.
    pub fn gravity_ms_for(&self, level: u32) -> u32 {
        let steps = level.saturating_sub(1);
        self.base_gravity_ms
            .saturating_sub(steps.saturating_mul(self.gravity_step_ms))
            .max(self.min_gravity_ms)
            .max(1)
    }

    /// Points awarded for clearing `lines` rows at `level`.
    pub fn line_clear_points(&self, lines: usize, level: u32) -> u32 {
        match lines {
            0 => 0,
            n => {
                let index = n.min(self.line_clear_scores.len()) - 1;
                self.line_clear_scores[index].saturating_mul(level)
            }
        }
    }

    /// Level reached after clearing `lines` rows in total.
    pub fn level_for_lines(&self, lines: u32) -> u32 {
        self.start_level
            .saturating_add(lines / self.lines_per_level.max(1))
    }

    /// Checks the settings are playable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigValidationError`] naming the first invalid field.
    #[instrument(skip(self))]
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.start_level == 0 {
            return Err(ConfigValidationError::ZeroStartLevel);
        }
        if self.lines_per_level == 0 {
            return Err(ConfigValidationError::ZeroLinesPerLevel);
        }
        if self.preview_count == 0 || self.preview_count > MAX_PREVIEW {
            return Err(ConfigValidationError::PreviewCount {
                count: self.preview_count,
            });
        }
        Ok(())
    }
}

/// Rejected [`GameConfig`] values.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ConfigValidationError {
    /// Levels start at 1.
    #[display("start level must be at least 1")]
    ZeroStartLevel,
    /// A level needs at least one line.
    #[display("lines per level must be at least 1")]
    ZeroLinesPerLevel,
    /// Preview length outside `1..=MAX_PREVIEW`.
    #[display("preview count {count} is outside 1..=5")]
    PreviewCount {
        /// Requested preview length.
        count: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn gravity_speeds_up_and_floors() {
        let config = GameConfig::default();
        assert_eq!(config.gravity_ms_for(1), 1_000);
        assert_eq!(config.gravity_ms_for(2), 950);
        assert_eq!(config.gravity_ms_for(40), 100);
    }

    #[test]
    fn line_clear_points_scale_with_level() {
        let config = GameConfig::default();
        assert_eq!(config.line_clear_points(0, 3), 0);
        assert_eq!(config.line_clear_points(1, 1), 100);
        assert_eq!(config.line_clear_points(4, 2), 1_600);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let config = GameConfig::default().with_preview_count(6);
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::PreviewCount { count: 6 })
        );
        let config = GameConfig::default().with_start_level(0);
        assert_eq!(config.validate(), Err(ConfigValidationError::ZeroStartLevel));
    }

    #[test]
    fn level_advances_every_ten_lines() {
        let config = GameConfig::default();
        assert_eq!(config.level_for_lines(9), 1);
        assert_eq!(config.level_for_lines(10), 2);
        assert_eq!(config.with_start_level(5).level_for_lines(25), 7);
    }
}
