use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use crate::game::{Game, MAX_SIZE, Symbol};
use crate::moves::Position;

/// Error type for puzzle loading operations.
#[derive(Debug, thiserror::Error)]
pub enum PuzzleError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("missing '<rows> <cols>' header")]
    MissingHeader,
    #[error("malformed header '{0}', expected '<rows> <cols>'")]
    MalformedHeader(String),
    #[error("board size {rows}x{cols} must be between 1x1 and {max}x{max}", max = MAX_SIZE)]
    InvalidSize { rows: usize, cols: usize },
    #[error("expected {expected} rows, found {found}")]
    RowCount { expected: usize, found: usize },
    #[error("row {row} has {found} cells, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("invalid character '{ch}' at ({row}, {col})")]
    InvalidCharacter { ch: char, row: usize, col: usize },
    #[error("no controlled piece 'P' on the board")]
    MissingControlled,
    #[error("more than one controlled piece 'P' on the board")]
    DuplicateControlled,
    #[error("no target 'T' on the board")]
    MissingTarget,
    #[error("more than one target 'T' on the board")]
    DuplicateTarget,
    #[error("obstacle '{0}' appears more than once")]
    DuplicateObstacle(char),
}

/// Loader for the puzzle text format.
///
/// The first line holds the dimensions, `"<rows> <cols>"`. It is followed by
/// `rows` lines of exactly `cols` characters:
/// - `-` = Empty
/// - `T` = Target (exactly one)
/// - `P` = Controlled piece (exactly one)
/// - `0`..`8` = Obstacles (each id at most once)
pub struct Puzzle;

impl Puzzle {
    /// Parse a puzzle from a string.
    pub fn from_text(text: &str) -> Result<Game, PuzzleError> {
        let mut lines = text.lines();

        let header = lines
            .by_ref()
            .find(|line| !line.trim().is_empty())
            .ok_or(PuzzleError::MissingHeader)?;
        let (rows, cols) = parse_header(header)?;

        // Blank lines after the board are tolerated, not inside it.
        let body: Vec<&str> = lines.collect();
        let body_len = body
            .iter()
            .rposition(|line| !line.trim().is_empty())
            .map_or(0, |last| last + 1);
        if body_len != rows {
            return Err(PuzzleError::RowCount {
                expected: rows,
                found: body_len,
            });
        }

        let mut grid = Vec::with_capacity(rows * cols);
        let mut controlled = false;
        let mut target = false;
        let mut obstacles = HashSet::new();

        for (row, line) in body[..rows].iter().enumerate() {
            let line = line.trim_end();
            let width = line.chars().count();
            if width != cols {
                return Err(PuzzleError::RowWidth {
                    row,
                    expected: cols,
                    found: width,
                });
            }

            for (col, ch) in line.chars().enumerate() {
                let symbol = Symbol::from_char(ch)
                    .ok_or(PuzzleError::InvalidCharacter { ch, row, col })?;
                match symbol {
                    Symbol::Controlled if controlled => {
                        return Err(PuzzleError::DuplicateControlled);
                    }
                    Symbol::Controlled => controlled = true,
                    Symbol::Target if target => return Err(PuzzleError::DuplicateTarget),
                    Symbol::Target => target = true,
                    Symbol::Obstacle(id) if !obstacles.insert(id) => {
                        return Err(PuzzleError::DuplicateObstacle(ch));
                    }
                    _ => {}
                }
                grid.push(symbol);
            }
        }

        if !controlled {
            return Err(PuzzleError::MissingControlled);
        }
        if !target {
            return Err(PuzzleError::MissingTarget);
        }

        Ok(Game::from_grid(rows, cols, grid))
    }

    /// Parse a puzzle from a text file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Game, PuzzleError> {
        let contents = fs::read_to_string(path)?;
        Self::from_text(&contents)
    }

    /// Write the current board back out in the puzzle format.
    pub fn to_text(game: &Game) -> String {
        let mut text = format!("{} {}\n", game.rows(), game.cols());
        for row in 0..game.rows() {
            for col in 0..game.cols() {
                let pos = Position::new(row as u8, col as u8);
                text.push(game.symbol_at(pos).to_char());
            }
            text.push('\n');
        }
        text
    }
}

fn parse_header(line: &str) -> Result<(usize, usize), PuzzleError> {
    let malformed = || PuzzleError::MalformedHeader(line.trim().to_string());

    let mut fields = line.split_whitespace();
    let rows = fields.next().and_then(|f| f.parse::<usize>().ok());
    let cols = fields.next().and_then(|f| f.parse::<usize>().ok());
    let (Some(rows), Some(cols), None) = (rows, cols, fields.next()) else {
        return Err(malformed());
    };

    if rows == 0 || cols == 0 || rows > MAX_SIZE || cols > MAX_SIZE {
        return Err(PuzzleError::InvalidSize { rows, cols });
    }
    Ok((rows, cols))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Piece;

    const SCENARIO: &str = include_str!("../puzzles/scenario_5_5.txt");

    #[test]
    fn test_from_text_basic() {
        let game = Puzzle::from_text(SCENARIO).unwrap();

        assert_eq!(game.rows(), 5);
        assert_eq!(game.cols(), 5);
        assert_eq!(game.target(), Position::new(2, 2));
        assert_eq!(game.controlled(), Position::new(3, 2));
        assert_eq!(game.move_count(), 0);
        assert_eq!(game.pieces().len(), 5);
        assert_eq!(game.position_of(Piece::Obstacle(1)), Some(Position::new(0, 2)));
        assert_eq!(game.position_of(Piece::Obstacle(3)), Some(Position::new(4, 1)));
    }

    #[test]
    fn test_round_trip() {
        let game = Puzzle::from_text(SCENARIO).unwrap();
        assert_eq!(Puzzle::to_text(&game), SCENARIO);
    }

    #[test]
    fn test_trailing_blank_lines() {
        let game = Puzzle::from_text("1 3\nP0T\n\n\n").unwrap();
        assert_eq!(game.cols(), 3);
    }

    #[test]
    fn test_header_errors() {
        assert!(matches!(
            Puzzle::from_text(""),
            Err(PuzzleError::MissingHeader)
        ));
        assert!(matches!(
            Puzzle::from_text("5\n"),
            Err(PuzzleError::MalformedHeader(_))
        ));
        assert!(matches!(
            Puzzle::from_text("a b\n"),
            Err(PuzzleError::MalformedHeader(_))
        ));
        assert!(matches!(
            Puzzle::from_text("1 3 7\nP0T\n"),
            Err(PuzzleError::MalformedHeader(_))
        ));
        assert!(matches!(
            Puzzle::from_text("0 3\n"),
            Err(PuzzleError::InvalidSize { rows: 0, cols: 3 })
        ));
        assert!(matches!(
            Puzzle::from_text("1 65\n"),
            Err(PuzzleError::InvalidSize { .. })
        ));
    }

    #[test]
    fn test_shape_errors() {
        assert!(matches!(
            Puzzle::from_text("2 3\nP0T\n"),
            Err(PuzzleError::RowCount {
                expected: 2,
                found: 1
            })
        ));
        assert!(matches!(
            Puzzle::from_text("1 3\nP0T\n---\n"),
            Err(PuzzleError::RowCount {
                expected: 1,
                found: 2
            })
        ));
        assert!(matches!(
            Puzzle::from_text("2 3\nP0T\n--\n"),
            Err(PuzzleError::RowWidth {
                row: 1,
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn test_symbol_errors() {
        assert!(matches!(
            Puzzle::from_text("1 3\nP#T\n"),
            Err(PuzzleError::InvalidCharacter {
                ch: '#',
                row: 0,
                col: 1
            })
        ));
        assert!(matches!(
            Puzzle::from_text("1 3\n-0T\n"),
            Err(PuzzleError::MissingControlled)
        ));
        assert!(matches!(
            Puzzle::from_text("1 3\nPPT\n"),
            Err(PuzzleError::DuplicateControlled)
        ));
        assert!(matches!(
            Puzzle::from_text("1 3\nP0-\n"),
            Err(PuzzleError::MissingTarget)
        ));
        assert!(matches!(
            Puzzle::from_text("1 3\nTPT\n"),
            Err(PuzzleError::DuplicateTarget)
        ));
        assert!(matches!(
            Puzzle::from_text("1 4\nP00T\n"),
            Err(PuzzleError::DuplicateObstacle('0'))
        ));
    }

    #[test]
    fn test_from_file_no_file() {
        let result = Puzzle::from_file("nonexistent_puzzle.txt");
        assert!(matches!(result, Err(PuzzleError::Io(_))));
    }

    #[test]
    fn test_from_file() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/puzzles/scenario_5_5.txt");
        let game = Puzzle::from_file(path).unwrap();
        assert_eq!(game, Puzzle::from_text(SCENARIO).unwrap());
    }
}
