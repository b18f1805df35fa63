//! Tetromino shapes, rotation states and board placement.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use tracing::instrument;

/// One of the seven standard four-cell piece types.
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
pub enum TetrominoKind {
    /// Four in a row.
    I,
    /// Two-by-two square.
    O,
    /// T shape.
    T,
    /// S shape.
    S,
    /// Z shape.
    Z,
    /// J shape.
    J,
    /// L shape.
    L,
}

impl TetrominoKind {
    /// All seven kinds, in bag order before shuffling.
    pub const ALL: [TetrominoKind; 7] = [
        TetrominoKind::I,
        TetrominoKind::O,
        TetrominoKind::T,
        TetrominoKind::S,
        TetrominoKind::Z,
        TetrominoKind::J,
        TetrominoKind::L,
    ];

    /// Side length of the square grid the shape is defined on.
    pub const fn grid_size(self) -> i32 {
        match self {
            TetrominoKind::I => 4,
            TetrominoKind::O => 2,
            _ => 3,
        }
    }

    /// Number of distinct rotation states.
    pub const fn rotation_states(self) -> u8 {
        match self {
            TetrominoKind::O => 1,
            _ => 4,
        }
    }

    /// Single-character symbol used in text renderings.
    pub const fn symbol(self) -> char {
        match self {
            TetrominoKind::I => 'I',
            TetrominoKind::O => 'O',
            TetrominoKind::T => 'T',
            TetrominoKind::S => 'S',
            TetrominoKind::Z => 'Z',
            TetrominoKind::J => 'J',
            TetrominoKind::L => 'L',
        }
    }

    /// Occupied `(column, row)` cells of the spawn orientation, rows counted
    /// downward from the top of the shape grid.
    const fn base_cells(self) -> [(i32, i32); 4] {
        match self {
            TetrominoKind::I => [(0, 1), (1, 1), (2, 1), (3, 1)],
            TetrominoKind::O => [(0, 0), (1, 0), (0, 1), (1, 1)],
            TetrominoKind::T => [(1, 0), (0, 1), (1, 1), (2, 1)],
            TetrominoKind::S => [(1, 0), (2, 0), (0, 1), (1, 1)],
            TetrominoKind::Z => [(0, 0), (1, 0), (1, 1), (2, 1)],
            TetrominoKind::J => [(0, 0), (0, 1), (1, 1), (2, 1)],
            TetrominoKind::L => [(2, 0), (0, 1), (1, 1), (2, 1)],
        }
    }

    /// Grid cells for the given rotation state.
    pub fn grid_cells(self, rotation: u8) -> [(i32, i32); 4] {
        let size = self.grid_size();
        let steps = rotation % self.rotation_states();
        let mut cells = self.base_cells();
        for _ in 0..steps {
            // Clockwise: (x, y) -> (size - 1 - y, x)
            for cell in &mut cells {
                *cell = (size - 1 - cell.1, cell.0);
            }
        }
        cells
    }
}

/// Direction of a rotation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    /// Clockwise quarter turn.
    Clockwise,
    /// Counter-clockwise quarter turn.
    CounterClockwise,
}

impl Rotation {
    /// Applies this rotation to a rotation state.
    pub fn apply(self, rotation: u8, states: u8) -> u8 {
        let states = states.max(1);
        match self {
            Rotation::Clockwise => (rotation + 1) % states,
            Rotation::CounterClockwise => (rotation + states - 1) % states,
        }
    }
}

/// A piece placed on the board: kind, rotation state and grid origin.
///
/// `x` is the board column of the shape grid's left edge and `y` is the
/// board row of its top edge. Board rows count upward from 0 at the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tetromino {
    kind: TetrominoKind,
    rotation: u8,
    x: i32,
    y: i32,
}

impl Tetromino {
    /// Creates a tetromino at an explicit position.
    pub fn new(kind: TetrominoKind, rotation: u8, x: i32, y: i32) -> Self {
        Self {
            kind,
            rotation: rotation % kind.rotation_states(),
            x,
            y,
        }
    }

    /// Creates a tetromino in its spawn orientation, centred horizontally in
    /// a board `width` wide with its top edge on row `top`.
    #[instrument]
    pub fn spawn(kind: TetrominoKind, width: i32, top: i32) -> Self {
        let x = (width - kind.grid_size()) / 2;
        Self::new(kind, 0, x, top)
    }

    /// Returns the kind.
    pub fn kind(&self) -> TetrominoKind {
        self.kind
    }

    /// Returns the rotation state.
    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    /// Returns the grid origin column.
    pub fn x(&self) -> i32 {
        self.x
    }

    /// Returns the grid origin row.
    pub fn y(&self) -> i32 {
        self.y
    }

    /// Board `(column, row)` cells occupied by this piece.
    pub fn cells(&self) -> [(i32, i32); 4] {
        let mut cells = self.kind.grid_cells(self.rotation);
        for cell in &mut cells {
            *cell = (self.x + cell.0, self.y - cell.1);
        }
        cells
    }

    /// Returns a copy moved by `(dx, dy)`.
    pub fn shifted(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Returns a copy turned in place.
    pub fn rotated(&self, direction: Rotation) -> Self {
        Self {
            rotation: direction.apply(self.rotation, self.kind.rotation_states()),
            ..*self
        }
    }

    /// Lowest board row occupied by the piece.
    pub fn bottom(&self) -> i32 {
        self.cells().iter().map(|c| c.1).min().unwrap_or(self.y)
    }
}
