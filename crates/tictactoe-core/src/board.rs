//! Board representation for the 3x3 grid.
//!
//! Cells are addressed by a zero-based, row-major index:
//!
//! ```text
//!  0 | 1 | 2
//! ---+---+---
//!  3 | 4 | 5
//! ---+---+---
//!  6 | 7 | 8
//! ```
//!
//! A board serializes as its nine-character string form (`-`, `X`, `O`),
//! the same encoding the datastore stores and the API returns.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of cells on the board
pub const BOARD_CELLS: usize = 9;

/// The eight winning lines: three rows, three columns, two diagonals
pub const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Which side a mark belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    /// The human player, rendered as `X`
    Player,
    /// The scripted opponent, rendered as `O`
    Opponent,
}

impl Mark {
    /// Character used for this mark in the string form
    pub fn symbol(&self) -> char {
        match self {
            Mark::Player => 'X',
            Mark::Opponent => 'O',
        }
    }
}

/// A single cell on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Marked(Mark),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Character used for this cell in the string form
    pub fn symbol(&self) -> char {
        match self {
            Cell::Empty => '-',
            Cell::Marked(mark) => mark.symbol(),
        }
    }
}

/// Errors from parsing a board string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseBoardError {
    #[error("board must be exactly {BOARD_CELLS} characters, got {0}")]
    BadLength(usize),

    #[error("invalid cell character '{0}'")]
    BadCell(char),
}

/// The 3x3 board, row-major, zero-indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Board {
    cells: [Cell; BOARD_CELLS],
}

impl Board {
    /// An all-empty board
    pub fn new() -> Self {
        Self::default()
    }

    /// The cell at `index`, or `None` when out of range
    pub fn cell(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    /// Place a mark. Callers go through the engine, which validates first.
    pub(crate) fn set(&mut self, index: usize, mark: Mark) {
        self.cells[index] = Cell::Marked(mark);
    }

    /// Indices of all empty cells, in board order
    pub fn open_cells(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_empty())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| !cell.is_empty())
    }

    /// Number of cells carrying the given mark
    pub fn count(&self, mark: Mark) -> usize {
        self.cells
            .iter()
            .filter(|cell| **cell == Cell::Marked(mark))
            .count()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cell in &self.cells {
            write!(f, "{}", cell.symbol())?;
        }
        Ok(())
    }
}

impl FromStr for Board {
    type Err = ParseBoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != BOARD_CELLS {
            return Err(ParseBoardError::BadLength(chars.len()));
        }

        let mut cells = [Cell::Empty; BOARD_CELLS];
        for (i, c) in chars.into_iter().enumerate() {
            cells[i] = match c {
                '-' => Cell::Empty,
                'X' => Cell::Marked(Mark::Player),
                'O' => Cell::Marked(Mark::Opponent),
                other => return Err(ParseBoardError::BadCell(other)),
            };
        }

        Ok(Self { cells })
    }
}

impl Serialize for Board {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Board {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
