use std::fmt;
use std::rc::Rc;

use arrayvec::ArrayVec;

use crate::moves::{Direction, Move, Position};

pub const MAX_SIZE: usize = 64;
pub const MAX_OBSTACLE_ID: u8 = 8;
/// The controlled piece plus one obstacle per id.
pub const MAX_PIECES: usize = MAX_OBSTACLE_ID as usize + 2;

/// Identity of a movable piece.
///
/// Ordering is the registry order: the controlled piece first, then
/// obstacles by ascending id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Piece {
    Controlled,
    Obstacle(u8),
}

impl Piece {
    pub fn symbol(self) -> Symbol {
        match self {
            Piece::Controlled => Symbol::Controlled,
            Piece::Obstacle(id) => Symbol::Obstacle(id),
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Piece::Controlled => write!(f, "controlled piece"),
            Piece::Obstacle(id) => write!(f, "obstacle {}", id),
        }
    }
}

/// What a single cell of the grid displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Empty,
    Target,
    Controlled,
    Obstacle(u8),
}

impl Symbol {
    /// Parse a cell character.
    ///
    /// Characters:
    /// - `-` = Empty
    /// - `T` = Target
    /// - `P` = Controlled piece
    /// - `0`..`8` = Obstacle
    pub fn from_char(ch: char) -> Option<Symbol> {
        match ch {
            '-' => Some(Symbol::Empty),
            'T' => Some(Symbol::Target),
            'P' => Some(Symbol::Controlled),
            '0'..='8' => Some(Symbol::Obstacle(ch as u8 - b'0')),
            _ => None,
        }
    }

    /// Cell character; an obstacle id with no single digit shows as `?`.
    pub fn to_char(self) -> char {
        match self {
            Symbol::Empty => '-',
            Symbol::Target => 'T',
            Symbol::Controlled => 'P',
            Symbol::Obstacle(id) => char::from_digit(u32::from(id), 10).unwrap_or('?'),
        }
    }

    /// The piece shown by this symbol, if any. The target marker is not a piece.
    pub fn piece(self) -> Option<Piece> {
        match self {
            Symbol::Controlled => Some(Piece::Controlled),
            Symbol::Obstacle(id) => Some(Piece::Obstacle(id)),
            Symbol::Empty | Symbol::Target => None,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    InProgress,
    Won,
}

/// Why a move was refused. None of these are fatal; the board is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("position {0} is outside the board")]
    OutOfBounds(Position),
    #[error("the target at {0} cannot be moved")]
    ImmovableTarget(Position),
    #[error("there is no piece at {0}")]
    NoPieceAtOrigin(Position),
    #[error("there is no piece to stop a move {1} from {0}")]
    NoBlockingPiece(Position, Direction),
}

/// A move that was carried out, with the destination the slide rule picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedMove {
    pub piece: Piece,
    pub from: Position,
    pub to: Position,
    pub direction: Direction,
}

impl fmt::Display for ResolvedMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} from {} to {}",
            self.piece, self.direction, self.from, self.to
        )
    }
}

/// Outcome of a move requested from outside, for a front end to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveEvent {
    Applied(ResolvedMove),
    GoalReached(ResolvedMove),
    Rejected(MoveError),
}

type Pieces = ArrayVec<(Piece, Position), MAX_PIECES>;

/// Grid and registry as captured at load time.
#[derive(Debug, PartialEq, Eq)]
struct Layout {
    grid: Vec<Symbol>,
    pieces: Pieces,
}

/// A puzzle board: grid, piece registry and target cell.
///
/// The grid and the registry always agree: every piece symbol on the grid has
/// exactly one registry entry at the same coordinate. Both are private and
/// only change through [`Game::apply`] and [`Game::reset`].
///
/// Cloning copies the live grid and registry; the load-time layout is
/// immutable and shared between clones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    rows: u8,
    cols: u8,
    grid: Vec<Symbol>,
    // Sorted by piece.
    pieces: Pieces,
    target: Position,
    move_count: usize,
    initial: Rc<Layout>,
}

impl Game {
    /// Build a game from a validated row-major grid.
    ///
    /// The caller guarantees the grid is `rows x cols`, holds exactly one
    /// `Controlled` and one `Target` cell, and no obstacle id twice.
    pub(crate) fn from_grid(rows: usize, cols: usize, grid: Vec<Symbol>) -> Self {
        debug_assert_eq!(grid.len(), rows * cols);

        let mut pieces = Pieces::new();
        let mut target = Position::new(0, 0);
        for (index, &symbol) in grid.iter().enumerate() {
            let pos = Position::new((index / cols) as u8, (index % cols) as u8);
            if symbol == Symbol::Target {
                target = pos;
            }
            if let Some(piece) = symbol.piece() {
                pieces.push((piece, pos));
            }
        }
        pieces.sort();

        let initial = Rc::new(Layout {
            grid: grid.clone(),
            pieces: pieces.clone(),
        });

        Game {
            rows: rows as u8,
            cols: cols as u8,
            grid,
            pieces,
            target,
            move_count: 0,
            initial,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows as usize
    }

    pub fn cols(&self) -> usize {
        self.cols as usize
    }

    pub fn target(&self) -> Position {
        self.target
    }

    pub fn move_count(&self) -> usize {
        self.move_count
    }

    /// The piece registry, in piece order.
    pub fn pieces(&self) -> &[(Piece, Position)] {
        &self.pieces
    }

    pub fn position_of(&self, piece: Piece) -> Option<Position> {
        self.pieces
            .iter()
            .find(|(p, _)| *p == piece)
            .map(|&(_, pos)| pos)
    }

    /// Position of the controlled piece.
    pub fn controlled(&self) -> Position {
        // The controlled piece sorts first.
        self.pieces[0].1
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        (pos.row as usize) < self.rows() && (pos.col as usize) < self.cols()
    }

    fn index(&self, pos: Position) -> usize {
        pos.row as usize * self.cols() + pos.col as usize
    }

    /// Symbol displayed at `pos`; anything off the board reads as `Empty`.
    pub fn symbol_at(&self, pos: Position) -> Symbol {
        if self.in_bounds(pos) {
            self.grid[self.index(pos)]
        } else {
            Symbol::Empty
        }
    }

    /// Check if the controlled piece stands on the target (win condition)
    pub fn is_goal(&self) -> bool {
        self.controlled() == self.target
    }

    pub fn state(&self) -> GameState {
        if self.is_goal() {
            GameState::Won
        } else {
            GameState::InProgress
        }
    }

    /// Work out where a move would take its piece without changing anything.
    pub fn resolve(&self, mv: Move) -> Result<Position, MoveError> {
        self.slide(mv).map(|(_, to)| to)
    }

    /// The slide rule.
    ///
    /// The piece at the origin travels in the move's direction and stops on
    /// the cell just before the first piece in its way. The target marker is
    /// not a piece and is slid over. With no piece ahead, or with a piece
    /// directly adjacent, there is nowhere to stop and the move is refused.
    fn slide(&self, mv: Move) -> Result<(Piece, Position), MoveError> {
        let origin = mv.origin;
        if !self.in_bounds(origin) {
            return Err(MoveError::OutOfBounds(origin));
        }

        let piece = match self.symbol_at(origin) {
            Symbol::Target => return Err(MoveError::ImmovableTarget(origin)),
            Symbol::Empty => return Err(MoveError::NoPieceAtOrigin(origin)),
            Symbol::Controlled => Piece::Controlled,
            Symbol::Obstacle(id) => Piece::Obstacle(id),
        };

        let mut stop = origin;
        while let Some(next) = stop.step(mv.direction, self.rows(), self.cols()) {
            if self.symbol_at(next).piece().is_some() {
                if stop == origin {
                    break;
                }
                return Ok((piece, stop));
            }
            stop = next;
        }

        Err(MoveError::NoBlockingPiece(origin, mv.direction))
    }

    /// Apply a move, sliding the piece at its origin until it is stopped.
    ///
    /// On success the grid and registry are updated together, the move count
    /// goes up by one and the target cell is repainted if it is left vacant.
    /// On failure nothing changes.
    pub fn apply(&mut self, mv: Move) -> Result<ResolvedMove, MoveError> {
        let (piece, to) = self.slide(mv)?;
        let from = mv.origin;

        if let Some(entry) = self.pieces.iter_mut().find(|(p, _)| *p == piece) {
            entry.1 = to;
        }
        let from_index = self.index(from);
        let to_index = self.index(to);
        self.grid[from_index] = Symbol::Empty;
        self.grid[to_index] = piece.symbol();

        let target_index = self.index(self.target);
        if self.grid[target_index] == Symbol::Empty {
            self.grid[target_index] = Symbol::Target;
        }

        self.move_count += 1;

        Ok(ResolvedMove {
            piece,
            from,
            to,
            direction: mv.direction,
        })
    }

    /// Apply a move requested by a front end and describe what happened.
    pub fn request_move(&mut self, origin: Position, direction: Direction) -> MoveEvent {
        match self.apply(Move::new(origin, direction)) {
            Ok(resolved) if self.is_goal() => MoveEvent::GoalReached(resolved),
            Ok(resolved) => MoveEvent::Applied(resolved),
            Err(err) => MoveEvent::Rejected(err),
        }
    }

    /// Put every piece back where it was at load time and zero the move count.
    pub fn reset(&mut self) {
        self.grid.clone_from(&self.initial.grid);
        self.pieces.clone_from(&self.initial.pieces);
        self.move_count = 0;
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label_width = (self.rows().saturating_sub(1)).to_string().len();

        write!(f, "{:width$}", "", width = label_width)?;
        for col in 0..self.cols() {
            write!(f, " {}", col % 10)?;
        }
        writeln!(f)?;

        for row in 0..self.rows() {
            write!(f, "{:>width$}", row, width = label_width)?;
            for col in 0..self.cols() {
                write!(f, " {}", self.grid[row * self.cols() + col])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
