//! Headless bot that plays a game to completion.

use stacktris_core::{BOARD_WIDTH, Board, GameConfig, GameState, Rotation, Tetromino};
use tracing::{debug, info, instrument};

const HEIGHT_WEIGHT: f64 = -0.51;
const LINES_WEIGHT: f64 = 0.76;
const HOLES_WEIGHT: f64 = -0.36;
const BUMPINESS_WEIGHT: f64 = -0.18;

/// Where the bot wants the active piece to land.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Clockwise quarter turns from the spawn orientation.
    pub turns: u8,
    /// Target grid left edge.
    pub x: i32,
    /// Heuristic value of the resulting board.
    pub score: f64,
}

/// Greedy one-piece lookahead bot.
#[derive(Debug, Clone)]
pub struct SimpleBot {
    name: String,
}

impl SimpleBot {
    /// Creates a new bot.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the bot's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Best placement for the active piece, if there is one.
    #[instrument(skip(self, game), fields(bot = %self.name))]
    pub fn choose(&self, game: &GameState) -> Option<Placement> {
        let active = *game.active()?;
        let board = game.board();
        let mut best: Option<Placement> = None;
        let mut turned = active;

        for turns in 0..active.kind().rotation_states() {
            for dx in -(BOARD_WIDTH as i32)..=BOARD_WIDTH as i32 {
                let candidate = turned.shifted(dx, 0);
                if !board.fits(&candidate) {
                    continue;
                }
                let score = evaluate(board, candidate);
                if best.is_none_or(|b| score > b.score) {
                    best = Some(Placement {
                        turns,
                        x: candidate.x(),
                        score,
                    });
                }
            }
            turned = turned.rotated(Rotation::Clockwise);
        }

        debug!(placement = ?best, "Placement chosen");
        best
    }

    /// Moves the active piece to the chosen placement and hard drops it.
    /// Returns `false` when there is nothing to play.
    pub fn play_turn(&self, game: &mut GameState) -> bool {
        let Some(placement) = self.choose(game) else {
            return false;
        };
        for _ in 0..placement.turns {
            game.rotate(Rotation::Clockwise);
        }
        while let Some(x) = game.active().map(Tetromino::x) {
            let moved = if x < placement.x {
                game.move_right()
            } else if x > placement.x {
                game.move_left()
            } else {
                break;
            };
            if !moved {
                break;
            }
        }
        game.hard_drop();
        true
    }
}

fn evaluate(board: &Board, piece: Tetromino) -> f64 {
    let mut landed = piece;
    while board.fits(&landed.shifted(0, -1)) {
        landed = landed.shifted(0, -1);
    }
    let mut after = board.clone();
    after.lock(&landed);
    let lines = after.clear_full_rows();

    let heights = after.column_heights();
    let aggregate: usize = heights.iter().sum();
    let bumpiness: usize = heights.windows(2).map(|w| w[0].abs_diff(w[1])).sum();

    HEIGHT_WEIGHT * aggregate as f64
        + LINES_WEIGHT * lines as f64
        + HOLES_WEIGHT * after.holes() as f64
        + BUMPINESS_WEIGHT * bumpiness as f64
}

/// Plays a seeded game with `bot` until game over or `max_pieces` pieces
/// have been dropped. Each drop advances the clock by `ms_per_piece`.
///
/// # Errors
///
/// Returns an error if the config is invalid.
#[instrument(skip(bot, config))]
pub fn play_game(
    bot: &SimpleBot,
    config: GameConfig,
    seed: u64,
    max_pieces: u32,
    ms_per_piece: u32,
) -> anyhow::Result<GameState> {
    let mut game = GameState::new(config, seed)?;
    game.start()?;

    let mut dropped = 0;
    while !game.is_over() && dropped < max_pieces {
        if !bot.play_turn(&mut game) {
            break;
        }
        game.tick(ms_per_piece);
        dropped += 1;
    }

    info!(
        bot = %bot.name(),
        dropped,
        score = game.stats().score(),
        lines = game.stats().lines(),
        over = game.is_over(),
        "Autoplay finished"
    );
    Ok(game)
}
