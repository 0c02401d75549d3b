//! Concrete state spaces for exercising the engine
//!
//! - `grid`: shortest paths on a 4-connected grid with walls
//! - `sliding`: the n×n sliding tile puzzle

pub mod grid;
pub mod sliding;

pub use grid::{GridProblem, Position};
pub use sliding::{Board, SlidingPuzzle};

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One of the four axis-aligned moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Column and row offsets, rows growing downwards
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Direction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" | "u" => Ok(Direction::Up),
            "down" | "d" => Ok(Direction::Down),
            "left" | "l" => Ok(Direction::Left),
            "right" | "r" => Ok(Direction::Right),
            _ => Err(ParseError::UnknownDirection(s.to_string())),
        }
    }
}

/// Errors from parsing problem descriptions
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid position '{0}', expected 'x,y'")]
    InvalidPosition(String),

    #[error("Unknown direction '{0}'")]
    UnknownDirection(String),

    #[error("Grid map is empty")]
    EmptyMap,

    #[error("Grid map rows differ in width (row {row} has {found}, expected {expected})")]
    RaggedMap {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("Unexpected cell '{cell}' at row {row}, column {column}")]
    InvalidCell { cell: char, row: usize, column: usize },

    #[error("Grid map needs exactly one '{0}'")]
    MarkerCount(char),

    #[error("Invalid tile '{0}'")]
    InvalidTile(String),

    #[error("A board of {0} tiles is not a square of side 2 or more")]
    NotSquare(usize),

    #[error("Tiles must be a permutation of 0..{0}")]
    NotPermutation(usize),

    #[error("Board side {0} is outside 2..=16")]
    UnsupportedSide(usize),
}
