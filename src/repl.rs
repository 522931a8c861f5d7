use std::io::{self, BufRead, Write};
use std::str::FromStr;

use tracing::{debug, info};

use crate::game::{Game, GameState, MoveEvent};
use crate::moves::{Direction, Move, ParseDirectionError, Position};
use crate::puzzle::Puzzle;
use crate::solver::{SolveResult, Solver, Transpositions};

const HELP: &str = "\
Commands:
   help - this help menu
   board - display current board
   reset - resets the current puzzle
   new <puzzle_filename> - start a new puzzle
   move <row> <col> <direction> - moves the piece at <row>, <col>
     where <direction> one of u(p), d(own), l(eft), r(ight)
   hint - get a valid move, if one exists
   solve - solve the current puzzle
   quit - quit";

const GAME_OVER: &str = "There must be an active game to use this command";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Coordinates are kept as typed; the board decides if they are valid.
    Move {
        row: usize,
        col: usize,
        direction: Direction,
    },
    Hint,
    Solve,
    Reset,
    New(String),
    Board,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("No command entered. Type 'help' for a list of commands.")]
    Empty,
    #[error("Invalid command '{0}'. Type 'help' for a list of commands.")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("invalid coordinate '{0}'")]
    InvalidCoordinate(String),
    #[error(transparent)]
    Direction(#[from] ParseDirectionError),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Err(CommandError::Empty);
        }
        let (name, rest) = line
            .split_once(char::is_whitespace)
            .unwrap_or((line, ""));
        let rest = rest.trim();

        match name.to_ascii_lowercase().as_str() {
            "move" => {
                let args: Vec<&str> = rest.split_whitespace().collect();
                let [row, col, direction] = args[..] else {
                    return Err(CommandError::Usage("move <row> <col> <direction>"));
                };
                let coordinate = |token: &str| {
                    token
                        .parse::<usize>()
                        .map_err(|_| CommandError::InvalidCoordinate(token.to_string()))
                };
                Ok(Command::Move {
                    row: coordinate(row)?,
                    col: coordinate(col)?,
                    direction: direction.parse()?,
                })
            }
            "new" if rest.is_empty() => Err(CommandError::Usage("new <puzzle_filename>")),
            "new" => Ok(Command::New(rest.to_string())),
            "hint" => Ok(Command::Hint),
            "solve" => Ok(Command::Solve),
            "reset" => Ok(Command::Reset),
            "board" => Ok(Command::Board),
            "help" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            _ => Err(CommandError::Unknown(name.to_string())),
        }
    }
}

/// Spell a move the way the `move` command takes it.
fn as_command(mv: Move) -> String {
    format!(
        "move {} {} {}",
        mv.origin.row,
        mv.origin.col,
        mv.direction.to_string().to_lowercase()
    )
}

/// An interactive session on one puzzle at a time.
pub struct Session<W: Write> {
    game: Game,
    output: W,
    max_nodes: usize,
}

impl<W: Write> Session<W> {
    pub fn new(game: Game, output: W, max_nodes: usize) -> Self {
        Session {
            game,
            output,
            max_nodes,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Read commands from `input` until `quit` or end of input.
    pub fn run<R: BufRead>(&mut self, mut input: R) -> io::Result<()> {
        writeln!(self.output, "{}", HELP)?;
        writeln!(self.output)?;
        write!(self.output, "{}", self.game)?;

        loop {
            writeln!(self.output, "Moves: {}", self.game.move_count())?;
            write!(self.output, "Command: ")?;
            self.output.flush()?;

            let mut bytes = Vec::new();
            if input.read_until(b'\n', &mut bytes)? == 0 {
                writeln!(self.output)?;
                break;
            }
            let line = String::from_utf8_lossy(&bytes);

            match line.parse::<Command>() {
                Ok(Command::Quit) => break,
                Ok(command) => self.execute(command)?,
                Err(err) => writeln!(self.output, "{}", err)?,
            }
        }

        writeln!(self.output, "Good bye!")
    }

    pub fn execute(&mut self, command: Command) -> io::Result<()> {
        debug!(?command, "executing");
        match command {
            Command::Move { .. } | Command::Hint | Command::Solve
                if self.game.state() == GameState::Won => {
                writeln!(self.output, "{}", GAME_OVER)
            }
            Command::Move {
                row,
                col,
                direction,
            } => match (u8::try_from(row), u8::try_from(col)) {
                (Ok(row), Ok(col)) => self.make_move(Position::new(row, col), direction),
                // Too large for any board.
                _ => writeln!(
                    self.output,
                    "Invalid move: position ({}, {}) is outside the board",
                    row, col
                ),
            },
            Command::Hint => match self.game.hint() {
                Some(mv) => writeln!(self.output, "Hint: {}", as_command(mv)),
                None => writeln!(self.output, "No moves available"),
            },
            Command::Solve => self.solve(),
            Command::Reset => {
                self.game.reset();
                write!(self.output, "{}", self.game)
            }
            Command::New(path) => match Puzzle::from_file(&path) {
                Ok(game) => {
                    info!(%path, "loaded puzzle");
                    self.game = game;
                    write!(self.output, "{}", self.game)
                }
                Err(err) => writeln!(self.output, "Failed to load puzzle: {}", err),
            },
            Command::Board => write!(self.output, "{}", self.game),
            Command::Help => writeln!(self.output, "{}", HELP),
            Command::Quit => Ok(()),
        }
    }

    fn make_move(&mut self, origin: Position, direction: Direction) -> io::Result<()> {
        match self.game.request_move(origin, direction) {
            MoveEvent::Applied(resolved) => {
                writeln!(self.output, "Moved {}", resolved)?;
                write!(self.output, "{}", self.game)
            }
            MoveEvent::GoalReached(resolved) => {
                writeln!(self.output, "Moved {}", resolved)?;
                write!(self.output, "{}", self.game)?;
                writeln!(self.output, "Congratulations, you reached the summit!")
            }
            MoveEvent::Rejected(err) => writeln!(self.output, "Invalid move: {}", err),
        }
    }

    fn solve(&mut self) -> io::Result<()> {
        let mut solver = Solver::new(self.max_nodes, None, Transpositions::Global);
        match solver.solve(&self.game) {
            SolveResult::Solved(moves) => {
                let total = moves.len();
                for (count, mv) in moves.into_iter().enumerate() {
                    writeln!(self.output, "{} ({}/{})", as_command(mv), count + 1, total)?;
                    self.make_move(mv.origin, mv.direction)?;
                }
                Ok(())
            }
            SolveResult::Cutoff => writeln!(
                self.output,
                "Gave up after exploring {} states",
                solver.nodes_explored()
            ),
            SolveResult::Impossible => {
                writeln!(self.output, "No solution from the current position")
            }
        }
    }
}
