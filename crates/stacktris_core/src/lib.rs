//! Pure Tetris game logic.
//!
//! No I/O: the session is driven by input calls and [`GameState::tick`].
//!
//! # Example
//!
//! ```
//! use stacktris_core::{GameConfig, GameState, GameStatus};
//!
//! let mut game = GameState::new(GameConfig::default(), 42).unwrap();
//! game.start().unwrap();
//! game.hard_drop();
//! assert_eq!(game.status(), GameStatus::Playing);
//! assert_eq!(*game.stats().tetrominoes(), 1);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod board;
mod config;
mod game;
mod randomizer;
mod stats;
mod tetromino;

pub use board::{BOARD_HEIGHT, BOARD_WIDTH, Board, HIDDEN_ROWS, TOTAL_HEIGHT};
pub use config::{ConfigValidationError, GameConfig, MAX_PREVIEW};
pub use game::{GameError, GameState, GameStatus};
pub use randomizer::SevenBag;
pub use stats::GameStats;
pub use tetromino::{Rotation, Tetromino, TetrominoKind};
