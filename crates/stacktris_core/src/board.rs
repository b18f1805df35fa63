//! Playfield grid: collision, locking and line clearing.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{Tetromino, TetrominoKind};

/// Playfield width in cells.
pub const BOARD_WIDTH: usize = 10;
/// Visible playfield height in cells.
pub const BOARD_HEIGHT: usize = 20;
/// Rows above the visible area where pieces spawn.
pub const HIDDEN_ROWS: usize = 2;
/// Total rows including the hidden spawn area.
pub const TOTAL_HEIGHT: usize = BOARD_HEIGHT + HIDDEN_ROWS;

/// One board row; `None` is an empty cell.
pub type Row = [Option<TetrominoKind>; BOARD_WIDTH];

/// The playfield. Row 0 is the floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    rows: Vec<Row>,
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self {
            rows: vec![[None; BOARD_WIDTH]; TOTAL_HEIGHT],
        }
    }

    /// Returns all rows, floor first, including hidden rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Returns the cell at `(x, y)`, or `None` when out of bounds or empty.
    pub fn cell(&self, x: i32, y: i32) -> Option<TetrominoKind> {
        if x < 0 || y < 0 {
            return None;
        }
        self.rows
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
            .flatten()
    }

    /// Sets a single cell. Out-of-bounds writes are ignored.
    pub fn set_cell(&mut self, x: usize, y: usize, value: Option<TetrominoKind>) {
        if let Some(cell) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            *cell = value;
        }
    }

    /// Whether `(x, y)` is inside the board and unoccupied.
    pub fn is_free(&self, x: i32, y: i32) -> bool {
        x >= 0
            && x < BOARD_WIDTH as i32
            && y >= 0
            && y < TOTAL_HEIGHT as i32
            && self.cell(x, y).is_none()
    }

    /// Whether every cell of the piece is free.
    pub fn fits(&self, piece: &Tetromino) -> bool {
        piece.cells().iter().all(|&(x, y)| self.is_free(x, y))
    }

    /// Writes the piece into the grid.
    #[instrument(skip(self))]
    pub fn lock(&mut self, piece: &Tetromino) {
        for (x, y) in piece.cells() {
            if x >= 0 && y >= 0 {
                self.set_cell(x as usize, y as usize, Some(piece.kind()));
            }
        }
    }

    /// Indices of completely filled rows, floor first.
    pub fn full_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.iter().all(Option::is_some))
            .map(|(y, _)| y)
            .collect()
    }

    /// Removes filled rows, shifting everything above down. Returns the
    /// number of rows removed.
    #[instrument(skip(self))]
    pub fn clear_full_rows(&mut self) -> usize {
        let before = self.rows.len();
        self.rows.retain(|row| !row.iter().all(Option::is_some));
        let cleared = before - self.rows.len();
        self.rows.resize(TOTAL_HEIGHT, [None; BOARD_WIDTH]);
        if cleared > 0 {
            debug!(cleared, "Cleared rows");
        }
        cleared
    }

    /// Height of each column (index of the highest filled cell plus one).
    pub fn column_heights(&self) -> [usize; BOARD_WIDTH] {
        let mut heights = [0; BOARD_WIDTH];
        for (y, row) in self.rows.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if cell.is_some() {
                    heights[x] = y + 1;
                }
            }
        }
        heights
    }

    /// Number of empty cells with a filled cell somewhere above them.
    pub fn holes(&self) -> usize {
        let heights = self.column_heights();
        let mut holes = 0;
        for (x, height) in heights.iter().enumerate() {
            holes += (0..*height)
                .filter(|&y| self.rows[y][x].is_none())
                .count();
        }
        holes
    }

    /// Whether the board has no filled cells.
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.iter().all(Option::is_none))
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_row(board: &mut Board, y: usize, gap: Option<usize>) {
        for x in 0..BOARD_WIDTH {
            if Some(x) != gap {
                board.set_cell(x, y, Some(TetrominoKind::I));
            }
        }
    }

    #[test]
    fn new_board_is_empty() {
        let board = Board::new();
        assert!(board.is_empty());
        assert_eq!(board.rows().len(), TOTAL_HEIGHT);
    }

    #[test]
    fn walls_and_floor_block_pieces() {
        let board = Board::new();
        let t = Tetromino::new(TetrominoKind::T, 0, -1, 5);
        assert!(!board.fits(&t));
        let t = Tetromino::new(TetrominoKind::T, 0, 3, 0);
        assert!(!board.fits(&t), "second grid row would be at y = -1");
        let t = Tetromino::new(TetrominoKind::T, 0, 3, 1);
        assert!(board.fits(&t));
    }

    #[test]
    fn clearing_shifts_rows_down() {
        let mut board = Board::new();
        fill_row(&mut board, 0, None);
        fill_row(&mut board, 1, Some(3));
        fill_row(&mut board, 2, None);
        board.set_cell(0, 3, Some(TetrominoKind::Z));

        assert_eq!(board.clear_full_rows(), 2);
        assert_eq!(board.cell(3, 0), None);
        assert_eq!(board.cell(4, 0), Some(TetrominoKind::I));
        assert_eq!(board.cell(0, 1), Some(TetrominoKind::Z));
        assert_eq!(board.rows().len(), TOTAL_HEIGHT);
    }

    #[test]
    fn holes_counts_covered_gaps() {
        let mut board = Board::new();
        board.set_cell(0, 2, Some(TetrominoKind::O));
        assert_eq!(board.holes(), 2);
        assert_eq!(board.column_heights()[0], 3);
    }
}
