//! The 3x3 grid, its marks and line evaluation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::domain::{DomainError, ValidationKind};

pub const CELL_COUNT: usize = 9;
pub const CENTER: u8 = 4;
pub const CORNERS: [u8; 4] = [0, 2, 6, 8];

/// Rows, columns and both diagonals.
pub const WINNING_LINES: [[u8; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub const fn other(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    pub const fn symbol(self) -> char {
        match self {
            Mark::X => 'X',
            Mark::O => 'O',
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// How a finished round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "mark", rename_all = "snake_case")]
pub enum Verdict {
    Win(Mark),
    Draw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: [Option<Mark>; CELL_COUNT],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: [Option<Mark>; CELL_COUNT]) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Option<Mark>; CELL_COUNT] {
        &self.cells
    }

    pub fn get(&self, cell: u8) -> Option<Mark> {
        self.cells.get(usize::from(cell)).copied().flatten()
    }

    pub fn is_free(&self, cell: u8) -> bool {
        usize::from(cell) < CELL_COUNT && self.get(cell).is_none()
    }

    pub fn empty_cells(&self) -> Vec<u8> {
        (0..CELL_COUNT as u8).filter(|&c| self.is_free(c)).collect()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    /// Check that `cell` is on the grid and unoccupied.
    pub fn check_placeable(&self, cell: u8) -> Result<(), DomainError> {
        if usize::from(cell) >= CELL_COUNT {
            return Err(DomainError::validation(
                ValidationKind::InvalidCell,
                format!("cell {cell} is outside the grid (0-8)"),
            ));
        }
        if let Some(mark) = self.get(cell) {
            return Err(DomainError::validation(
                ValidationKind::CellOccupied,
                format!("cell {cell} already holds {mark}"),
            ));
        }
        Ok(())
    }

    pub fn place(&mut self, cell: u8, mark: Mark) -> Result<(), DomainError> {
        self.check_placeable(cell)?;
        self.cells[usize::from(cell)] = Some(mark);
        Ok(())
    }

    /// A copy of the board with `mark` written to `cell`, ignoring legality.
    pub fn with_mark(&self, cell: u8, mark: Mark) -> Board {
        let mut next = *self;
        if let Some(slot) = next.cells.get_mut(usize::from(cell)) {
            *slot = Some(mark);
        }
        next
    }

    pub fn winning_line(&self) -> Option<(Mark, [u8; 3])> {
        WINNING_LINES.iter().find_map(|line| {
            let [a, b, c] = *line;
            match (self.get(a), self.get(b), self.get(c)) {
                (Some(x), Some(y), Some(z)) if x == y && y == z => Some((x, *line)),
                _ => None,
            }
        })
    }

    /// `None` while the round is still open. A completed line wins even on a full board.
    pub fn verdict(&self) -> Option<Verdict> {
        if let Some((mark, _)) = self.winning_line() {
            return Some(Verdict::Win(mark));
        }
        if self.is_full() {
            return Some(Verdict::Draw);
        }
        None
    }

    /// First free cell (by line order) that would complete a line for `mark`.
    pub fn winning_cell(&self, mark: Mark) -> Option<u8> {
        WINNING_LINES.iter().find_map(|line| {
            let owned = line.iter().filter(|&&c| self.get(c) == Some(mark)).count();
            let free: Vec<u8> = line.iter().copied().filter(|&c| self.is_free(c)).collect();
            (owned == 2 && free.len() == 1).then(|| free[0])
        })
    }

    pub fn count(&self, mark: Mark) -> usize {
        self.cells.iter().filter(|c| **c == Some(mark)).count()
    }
}

/// Advice for the player about to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "cell", rename_all = "snake_case")]
pub enum Hint {
    CanWin(u8),
    MustBlock(u8),
}

pub fn hint_for(board: &Board, to_move: Mark) -> Option<Hint> {
    if board.verdict().is_some() {
        return None;
    }
    if let Some(cell) = board.winning_cell(to_move) {
        return Some(Hint::CanWin(cell));
    }
    board.winning_cell(to_move.other()).map(Hint::MustBlock)
}
