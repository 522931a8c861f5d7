//! A sliding-piece puzzle engine.
//!
//! A rectangular board holds one controlled piece, a handful of obstacles and
//! a fixed target cell. Pieces slide in straight lines until they come to
//! rest against another piece; the puzzle is solved once the controlled piece
//! stands on the target.

pub mod game;
pub mod moves;
pub mod puzzle;
pub mod repl;
pub mod solver;
pub mod zobrist;

pub use game::{Game, GameState, MoveError, MoveEvent, Piece, ResolvedMove, Symbol};
pub use moves::{Direction, Move, Position};
pub use puzzle::{Puzzle, PuzzleError};
pub use solver::{SolveResult, Solver, Transpositions, solve};
