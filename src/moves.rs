use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::game::Game;

/// A cell coordinate, `(row, col)`, 0-indexed from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

impl Position {
    pub const fn new(row: u8, col: u8) -> Self {
        Position { row, col }
    }

    /// Step one cell in the given direction.
    /// Returns None if the new position would fall outside a `rows x cols` grid.
    pub fn step(self, dir: Direction, rows: usize, cols: usize) -> Option<Position> {
        let (dr, dc) = dir.delta();
        let row = self.row as i32 + dr as i32;
        let col = self.col as i32 + dc as i32;

        if row >= 0 && col >= 0 && (row as usize) < rows && (col as usize) < cols {
            Some(Position::new(row as u8, col as u8))
        } else {
            None
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// `(row, col)` offset of a single step.
    fn delta(&self) -> (i8, i8) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    /// Direction of travel from `from` toward `to`, if the two share a row or column.
    pub fn toward(from: Position, to: Position) -> Option<Direction> {
        if from == to {
            None
        } else if from.row == to.row {
            Some(if to.col > from.col {
                Direction::Right
            } else {
                Direction::Left
            })
        } else if from.col == to.col {
            Some(if to.row > from.row {
                Direction::Down
            } else {
                Direction::Up
            })
        } else {
            None
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "Up"),
            Direction::Down => write!(f, "Down"),
            Direction::Left => write!(f, "Left"),
            Direction::Right => write!(f, "Right"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown direction '{0}', expected one of u(p), d(own), l(eft), r(ight)")]
pub struct ParseDirectionError(String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "u" | "up" => Ok(Direction::Up),
            "d" | "down" => Ok(Direction::Down),
            "l" | "left" => Ok(Direction::Left),
            "r" | "right" => Ok(Direction::Right),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

/// A request to slide whatever sits at `origin` in `direction`.
/// The destination is not part of the move; the slide rule works it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Move {
    pub origin: Position,
    pub direction: Direction,
}

impl Move {
    pub const fn new(origin: Position, direction: Direction) -> Self {
        Move { origin, direction }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.origin, self.direction)
    }
}

impl Game {
    /// Enumerate every legal move on the current board.
    ///
    /// Each ordered pair of distinct pieces sharing a row or column proposes
    /// the first piece sliding toward the second. A proposal is kept when the
    /// slide rule accepts it, and each move is kept only once. Pieces are
    /// visited in registry order (the controlled piece, then obstacles by id),
    /// so the result is reproducible for a given board.
    pub fn possible_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        let mut seen = HashSet::new();
        let pieces = self.pieces();

        for &(piece, from) in pieces {
            for &(other, to) in pieces {
                if piece == other {
                    continue;
                }
                let Some(direction) = Direction::toward(from, to) else {
                    continue;
                };
                let candidate = Move::new(from, direction);
                if seen.contains(&candidate) {
                    continue;
                }
                if self.resolve(candidate).is_ok() {
                    seen.insert(candidate);
                    moves.push(candidate);
                }
            }
        }

        moves
    }

    /// A single legal move, if one exists.
    pub fn hint(&self) -> Option<Move> {
        self.possible_moves().into_iter().next()
    }
}
