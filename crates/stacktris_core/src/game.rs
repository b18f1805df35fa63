//! Game session state machine: spawning, movement, gravity and locking.

use std::collections::VecDeque;

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use strum::Display as StrumDisplay;
use tracing::{debug, info, instrument, warn};

use crate::board::{BOARD_HEIGHT, BOARD_WIDTH, TOTAL_HEIGHT};
use crate::{Board, ConfigValidationError, GameConfig, GameStats, Rotation, SevenBag, Tetromino, TetrominoKind};

/// Offsets tried in order when a rotation collides.
const KICK_OFFSETS: [(i32, i32); 6] = [(0, 0), (-1, 0), (1, 0), (0, 1), (-2, 0), (2, 0)];

/// Lifecycle of a game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, StrumDisplay)]
#[strum(serialize_all = "snake_case")]
pub enum GameStatus {
    /// Created, waiting for [`GameState::start`].
    Ready,
    /// Accepting input and advancing gravity.
    Playing,
    /// Frozen until [`GameState::resume`].
    Paused,
    /// A new piece could not be placed.
    GameOver,
}

/// Lifecycle transition that is not allowed from the current status.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("cannot {action} while {status}")]
pub struct GameError {
    /// Attempted transition.
    pub action: &'static str,
    /// Status at the time of the attempt.
    pub status: GameStatus,
}

/// Complete state of one game session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    config: GameConfig,
    board: Board,
    active: Option<Tetromino>,
    next_queue: VecDeque<TetrominoKind>,
    held: Option<TetrominoKind>,
    hold_used: bool,
    status: GameStatus,
    stats: GameStats,
    randomizer: SevenBag,
    seed: u64,
    gravity_ms: u32,
    lock_ms: u32,
    lock_resets: u32,
    lowest_row: i32,
}

impl GameState {
    /// Creates a game that has not started yet.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigValidationError`] if the config is not playable.
    #[instrument(skip(config))]
    pub fn new(config: GameConfig, seed: u64) -> Result<Self, ConfigValidationError> {
        config.validate()?;
        Ok(Self {
            stats: GameStats::new(config.start_level),
            config,
            board: Board::new(),
            active: None,
            next_queue: VecDeque::new(),
            held: None,
            hold_used: false,
            status: GameStatus::Ready,
            randomizer: SevenBag::new(seed),
            seed,
            gravity_ms: 0,
            lock_ms: 0,
            lock_resets: 0,
            lowest_row: TOTAL_HEIGHT as i32,
        })
    }

    /// Returns the rules in effect.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Returns the playfield.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the falling piece.
    pub fn active(&self) -> Option<&Tetromino> {
        self.active.as_ref()
    }

    /// Returns the next piece to spawn.
    pub fn next_piece(&self) -> Option<TetrominoKind> {
        self.next_queue.front().copied()
    }

    /// Returns the preview queue.
    pub fn next_queue(&self) -> impl Iterator<Item = TetrominoKind> + '_ {
        self.next_queue.iter().copied()
    }

    /// Returns the held piece.
    pub fn held(&self) -> Option<TetrominoKind> {
        self.held
    }

    /// Whether hold is usable for the current piece.
    pub fn can_hold(&self) -> bool {
        self.config.hold_enabled && !self.hold_used && self.status == GameStatus::Playing
    }

    /// Returns the lifecycle status.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Returns the running totals.
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    /// Returns the randomizer seed the game was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Whether the game has ended.
    pub fn is_over(&self) -> bool {
        self.status == GameStatus::GameOver
    }

    /// Fills the preview queue and spawns the first piece.
    ///
    /// # Errors
    ///
    /// Returns [`GameError`] unless the game is [`GameStatus::Ready`].
    #[instrument(skip(self), fields(seed = self.seed))]
    pub fn start(&mut self) -> Result<(), GameError> {
        self.require(GameStatus::Ready, "start")?;
        self.status = GameStatus::Playing;
        self.fill_queue();
        self.spawn_next();
        info!(status = %self.status, "Game started");
        Ok(())
    }

    /// Freezes gravity and input.
    ///
    /// # Errors
    ///
    /// Returns [`GameError`] unless the game is [`GameStatus::Playing`].
    #[instrument(skip(self))]
    pub fn pause(&mut self) -> Result<(), GameError> {
        self.require(GameStatus::Playing, "pause")?;
        self.status = GameStatus::Paused;
        debug!("Game paused");
        Ok(())
    }

    /// Continues a paused game.
    ///
    /// # Errors
    ///
    /// Returns [`GameError`] unless the game is [`GameStatus::Paused`].
    #[instrument(skip(self))]
    pub fn resume(&mut self) -> Result<(), GameError> {
        self.require(GameStatus::Paused, "resume")?;
        self.status = GameStatus::Playing;
        debug!("Game resumed");
        Ok(())
    }

    fn require(&self, expected: GameStatus, action: &'static str) -> Result<(), GameError> {
        if self.status == expected {
            Ok(())
        } else {
            warn!(action, status = %self.status, "Rejected lifecycle transition");
            Err(GameError {
                action,
                status: self.status,
            })
        }
    }

    /// Shifts the active piece one column left.
    pub fn move_left(&mut self) -> bool {
        self.try_shift(-1, 0)
    }

    /// Shifts the active piece one column right.
    pub fn move_right(&mut self) -> bool {
        self.try_shift(1, 0)
    }

    /// Moves the active piece down one row, scoring soft-drop points.
    pub fn soft_drop(&mut self) -> bool {
        if self.try_shift(0, -1) {
            self.stats.add_points(self.config.soft_drop_points);
            self.gravity_ms = 0;
            true
        } else {
            false
        }
    }

    /// Rotates the active piece, trying kick offsets on collision.
    #[instrument(skip(self))]
    pub fn rotate(&mut self, direction: Rotation) -> bool {
        let Some(active) = self.playing_piece() else {
            return false;
        };
        let turned = active.rotated(direction);
        for (dx, dy) in KICK_OFFSETS {
            let candidate = turned.shifted(dx, dy);
            if self.board.fits(&candidate) {
                self.active = Some(candidate);
                self.after_adjustment();
                return true;
            }
        }
        false
    }

    /// Drops the active piece to its landing row and locks it. Returns the
    /// number of rows fallen.
    #[instrument(skip(self))]
    pub fn hard_drop(&mut self) -> u32 {
        let Some(mut piece) = self.playing_piece() else {
            return 0;
        };
        let mut distance = 0u32;
        while self.board.fits(&piece.shifted(0, -1)) {
            piece = piece.shifted(0, -1);
            distance += 1;
        }
        self.active = Some(piece);
        self.stats
            .add_points(distance.saturating_mul(self.config.hard_drop_points));
        self.lock_active();
        distance
    }

    /// Swaps the active piece with the hold slot. Allowed once per spawn.
    #[instrument(skip(self))]
    pub fn hold(&mut self) -> bool {
        if !self.can_hold() {
            return false;
        }
        let Some(current) = self.active.take() else {
            return false;
        };
        let previous = self.held.replace(current.kind());
        match previous {
            Some(kind) => {
                self.spawn(kind);
            }
            None => self.spawn_next(),
        }
        self.hold_used = true;
        true
    }

    /// Landing position of the active piece.
    pub fn ghost(&self) -> Option<Tetromino> {
        let mut piece = self.active?;
        while self.board.fits(&piece.shifted(0, -1)) {
            piece = piece.shifted(0, -1);
        }
        Some(piece)
    }

    /// Advances time by `dt_ms`: accrues play time, applies gravity and
    /// locks a grounded piece once its lock delay expires.
    pub fn tick(&mut self, dt_ms: u32) {
        if self.status != GameStatus::Playing {
            return;
        }
        self.stats.add_elapsed(dt_ms);
        let Some(active) = self.active else {
            return;
        };

        if !self.board.fits(&active.shifted(0, -1)) {
            self.lock_ms = self.lock_ms.saturating_add(dt_ms);
            if self.lock_ms >= self.config.lock_delay_ms {
                self.lock_active();
            }
            return;
        }

        self.gravity_ms = self.gravity_ms.saturating_add(dt_ms);
        let interval = self.config.gravity_ms_for(*self.stats.level());
        while self.gravity_ms >= interval {
            self.gravity_ms -= interval;
            if !self.step_down() {
                self.gravity_ms = 0;
                break;
            }
        }
    }

    /// Text rendering of the visible playfield with the active piece drawn
    /// in, top row first.
    pub fn render_rows(&self) -> Vec<String> {
        let active_cells = self.active.map(|p| p.cells());
        (0..BOARD_HEIGHT as i32)
            .rev()
            .map(|y| {
                (0..BOARD_WIDTH as i32)
                    .map(|x| {
                        if active_cells.is_some_and(|cells| cells.contains(&(x, y))) {
                            '@'
                        } else {
                            self.board.cell(x, y).map_or('.', TetrominoKind::symbol)
                        }
                    })
                    .collect()
            })
            .collect()
    }

    fn playing_piece(&self) -> Option<Tetromino> {
        if self.status == GameStatus::Playing {
            self.active
        } else {
            None
        }
    }

    fn try_shift(&mut self, dx: i32, dy: i32) -> bool {
        let Some(active) = self.playing_piece() else {
            return false;
        };
        let moved = active.shifted(dx, dy);
        if !self.board.fits(&moved) {
            return false;
        }
        self.active = Some(moved);
        self.after_adjustment();
        true
    }

    fn step_down(&mut self) -> bool {
        let Some(active) = self.active else {
            return false;
        };
        let moved = active.shifted(0, -1);
        if self.board.fits(&moved) {
            self.active = Some(moved);
            self.reached_new_low();
            true
        } else {
            false
        }
    }

    fn after_adjustment(&mut self) {
        if self.reached_new_low() {
            return;
        }
        if self.lock_ms > 0 && self.lock_resets < self.config.max_lock_resets {
            self.lock_ms = 0;
            self.lock_resets += 1;
        }
    }

    /// Restarts the lock delay and its reset budget when the active piece
    /// sits lower than it has been since spawning.
    fn reached_new_low(&mut self) -> bool {
        let Some(bottom) = self.active.map(|p| p.bottom()) else {
            return false;
        };
        if bottom >= self.lowest_row {
            return false;
        }
        self.lowest_row = bottom;
        self.lock_ms = 0;
        self.lock_resets = 0;
        true
    }

    fn fill_queue(&mut self) {
        while self.next_queue.len() < self.config.preview_count {
            let kind = self.randomizer.next_kind();
            self.next_queue.push_back(kind);
        }
    }

    fn spawn_next(&mut self) {
        let kind = self
            .next_queue
            .pop_front()
            .unwrap_or_else(|| self.randomizer.next_kind());
        self.fill_queue();
        self.hold_used = false;
        self.spawn(kind);
    }

    fn spawn(&mut self, kind: TetrominoKind) -> bool {
        let piece = Tetromino::spawn(kind, BOARD_WIDTH as i32, TOTAL_HEIGHT as i32 - 1);
        self.gravity_ms = 0;
        self.lock_ms = 0;
        self.lock_resets = 0;
        if !self.board.fits(&piece) {
            self.active = None;
            self.end_game("block out");
            return false;
        }
        debug!(kind = %kind, "Spawned piece");
        self.lowest_row = piece.bottom();
        self.active = Some(piece);
        true
    }

    fn lock_active(&mut self) {
        let Some(piece) = self.active.take() else {
            return;
        };
        self.board.lock(&piece);
        let cleared = self.board.clear_full_rows();
        let points = self.stats.record_lock(cleared, &self.config);
        debug!(
            kind = %piece.kind(),
            cleared,
            points,
            score = self.stats.score(),
            level = self.stats.level(),
            "Locked piece"
        );

        if cleared == 0 && piece.bottom() >= BOARD_HEIGHT as i32 {
            self.end_game("lock out");
            return;
        }
        self.spawn_next();
    }

    fn end_game(&mut self, reason: &'static str) {
        self.status = GameStatus::GameOver;
        info!(
            reason,
            score = self.stats.score(),
            level = self.stats.level(),
            lines = self.stats.lines(),
            "Game over"
        );
    }
}
