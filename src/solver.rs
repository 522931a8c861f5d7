use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::game::Game;
use crate::moves::Move;
use crate::zobrist::Zobrist;

/// How the search treats a board it has already seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transpositions {
    /// Plain tree walk over move sequences. A cycle of moves can only be
    /// escaped through the node budget or the depth limit.
    Off,
    /// Skip boards already on the current path.
    Path,
    /// Skip every board visited before, anywhere in the search. Under a
    /// depth limit a board is revisited when reached by a shorter path.
    Global,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveResult {
    Solved(Vec<Move>),
    /// A budget stopped the search before it could finish.
    Cutoff,
    /// Everything reachable was explored without reaching the goal.
    Impossible,
}

/// A board on the search path, with its moves left to try.
struct Frame {
    game: Game,
    hash: u64,
    moves: Vec<Move>,
    next: usize,
}

impl Frame {
    fn new(game: Game, hash: u64) -> Self {
        let moves = game.possible_moves();
        Frame {
            game,
            hash,
            moves,
            next: 0,
        }
    }
}

/// Depth-first backtracking search over cloned boards.
///
/// Children are tried in move generator order, so the result is
/// deterministic, but it is the first solution found rather than the
/// shortest one.
pub struct Solver {
    max_nodes: usize,
    max_depth: Option<usize>,
    transpositions: Transpositions,
    nodes_explored: usize,
}

impl Solver {
    pub fn new(max_nodes: usize, max_depth: Option<usize>, transpositions: Transpositions) -> Self {
        Solver {
            max_nodes,
            max_depth,
            transpositions,
            nodes_explored: 0,
        }
    }

    pub fn nodes_explored(&self) -> usize {
        self.nodes_explored
    }

    /// Search for a move sequence that takes `game` to the goal.
    /// The caller's board is never modified.
    pub fn solve(&mut self, game: &Game) -> SolveResult {
        self.nodes_explored = 1;

        // Check if already solved
        if game.is_goal() {
            return SolveResult::Solved(Vec::new());
        }

        debug!(
            rows = game.rows(),
            cols = game.cols(),
            pieces = game.pieces().len(),
            transpositions = ?self.transpositions,
            "starting search"
        );

        let zobrist = Zobrist::new(game);
        let root_hash = zobrist.compute_hash(game);
        // Shallowest depth each board was reached at.
        let mut visited: HashMap<u64, usize> = HashMap::new();
        visited.insert(root_hash, 0);

        let mut stack = vec![Frame::new(game.clone(), root_hash)];
        let mut path: Vec<Move> = Vec::new();
        let mut cutoff = false;

        while let Some(frame) = stack.last_mut() {
            let Some(&mv) = frame.moves.get(frame.next) else {
                // All children tried: backtrack.
                stack.pop();
                path.pop();
                continue;
            };
            frame.next += 1;

            let mut child = frame.game.clone();
            if let Err(err) = child.apply(mv) {
                warn!(%mv, %err, "generated move was rejected");
                continue;
            }

            let hash = zobrist.compute_hash(&child);
            let depth = path.len() + 1;
            let seen = match self.transpositions {
                Transpositions::Off => false,
                Transpositions::Path => stack.iter().any(|frame| frame.hash == hash),
                Transpositions::Global => self.should_skip(&mut visited, hash, depth),
            };
            if seen {
                continue;
            }

            self.nodes_explored += 1;
            path.push(mv);
            trace!(
                depth = path.len(),
                nodes = self.nodes_explored,
                %mv,
                "expanded node"
            );

            if child.is_goal() {
                debug!(
                    steps = path.len(),
                    nodes = self.nodes_explored,
                    "solution found"
                );
                return SolveResult::Solved(path);
            }

            if self.nodes_explored >= self.max_nodes {
                debug!(nodes = self.nodes_explored, "node budget exhausted");
                return SolveResult::Cutoff;
            }

            if self.max_depth.is_some_and(|limit| path.len() >= limit) {
                cutoff = true;
                path.pop();
                continue;
            }

            stack.push(Frame::new(child, hash));
        }

        debug!(nodes = self.nodes_explored, cutoff, "search exhausted");
        if cutoff {
            SolveResult::Cutoff
        } else {
            SolveResult::Impossible
        }
    }

    /// Whether a board already in the table can be skipped at `depth`.
    ///
    /// Without a depth limit the first visit explores everything below the
    /// board, so any revisit is skipped. With one, a shallower revisit has
    /// more depth left to spend and is explored again.
    fn should_skip(&self, visited: &mut HashMap<u64, usize>, hash: u64, depth: usize) -> bool {
        match visited.get(&hash) {
            Some(&seen) if self.max_depth.is_none() || seen <= depth => true,
            _ => {
                visited.insert(hash, depth);
                false
            }
        }
    }
}

impl Default for Solver {
    fn default() -> Self {
        Self::new(usize::MAX, None, Transpositions::Global)
    }
}

/// Find a move sequence from `game` to the goal, if one exists.
pub fn solve(game: &Game) -> Option<Vec<Move>> {
    match Solver::default().solve(game) {
        SolveResult::Solved(moves) => Some(moves),
        SolveResult::Cutoff | SolveResult::Impossible => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::{Direction, Position};
    use crate::puzzle::Puzzle;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    const SCENARIO: &str = include_str!("../puzzles/scenario_5_5.txt");
    const CLIMB: &str = include_str!("../puzzles/climb_5_5.txt");
    const LEDGE: &str = include_str!("../puzzles/ledge_5_5.txt");

    const ALL_MODES: [Transpositions; 3] = [
        Transpositions::Off,
        Transpositions::Path,
        Transpositions::Global,
    ];

    fn mv(row: u8, col: u8, direction: Direction) -> Move {
        Move::new(Position::new(row, col), direction)
    }

    fn assert_solves(game: &Game, moves: &[Move]) {
        let mut test_game = game.clone();
        for &step in moves {
            test_game.apply(step).unwrap();
        }
        assert!(test_game.is_goal());
    }

    #[test]
    fn test_solve_simple() {
        let input = "1 4\nP-T0\n";
        let game = Puzzle::from_text(input).unwrap();

        let solution = solve(&game);

        assert_eq!(solution, Some(vec![mv(0, 0, Direction::Right)]));
    }

    #[test]
    fn test_solve_already_solved() {
        let mut game = Puzzle::from_text("1 4\nP-T0\n").unwrap();
        game.apply(mv(0, 0, Direction::Right)).unwrap();
        assert!(game.is_goal());

        let mut solver = Solver::default();
        assert_eq!(solver.solve(&game), SolveResult::Solved(Vec::new()));
        assert_eq!(solver.nodes_explored(), 1);
    }

    #[test]
    fn test_solve_climb() {
        let game = Puzzle::from_text(CLIMB).unwrap();
        let expected = vec![
            mv(0, 2, Direction::Right),
            mv(0, 3, Direction::Down),
            mv(0, 1, Direction::Right),
            mv(2, 3, Direction::Up),
        ];

        for mode in ALL_MODES {
            let mut solver = Solver::new(100_000, None, mode);
            let result = solver.solve(&game);
            assert_eq!(result, SolveResult::Solved(expected.clone()), "{:?}", mode);
        }
        assert_solves(&game, &expected);
    }

    #[test]
    fn test_solve_leaves_board_untouched() {
        let game = Puzzle::from_text(CLIMB).unwrap();
        let before = game.clone();
        let _ = solve(&game);
        assert_eq!(game, before);
    }

    #[test]
    fn test_solve_ledge() {
        let game = Puzzle::from_text(LEDGE).unwrap();
        let expected = vec![
            mv(4, 2, Direction::Left),
            mv(4, 3, Direction::Up),
            mv(4, 0, Direction::Up),
            mv(1, 3, Direction::Left),
            mv(4, 1, Direction::Up),
            mv(2, 1, Direction::Right),
        ];

        let mut global = Solver::new(100_000, None, Transpositions::Global);
        assert_eq!(global.solve(&game), SolveResult::Solved(expected.clone()));

        let mut on_path = Solver::new(100_000, None, Transpositions::Path);
        assert_eq!(on_path.solve(&game), SolveResult::Solved(expected.clone()));

        // Skipping every revisited board never explores more than skipping
        // only those on the current path.
        assert!(global.nodes_explored() <= on_path.nodes_explored());
        assert_solves(&game, &expected);
    }

    #[test]
    fn test_cycle_without_transpositions_hits_budget() {
        let game = Puzzle::from_text(LEDGE).unwrap();

        let mut solver = Solver::new(10_000, None, Transpositions::Off);
        assert_eq!(solver.solve(&game), SolveResult::Cutoff);
        assert_eq!(solver.nodes_explored(), 10_000);
    }

    #[test]
    fn test_depth_limit_bounds_tree_walk() {
        let game = Puzzle::from_text(LEDGE).unwrap();

        let mut solver = Solver::new(usize::MAX, Some(6), Transpositions::Off);
        let SolveResult::Solved(moves) = solver.solve(&game) else {
            panic!("expected a solution within six moves");
        };
        assert!(moves.len() <= 6);
        assert_solves(&game, &moves);
    }

    #[test]
    fn test_depth_limit_cutoff() {
        let game = Puzzle::from_text(CLIMB).unwrap();

        for mode in ALL_MODES {
            let mut solver = Solver::new(usize::MAX, Some(3), mode);
            assert_eq!(solver.solve(&game), SolveResult::Cutoff, "{:?}", mode);

            let mut solver = Solver::new(usize::MAX, Some(4), mode);
            assert!(matches!(solver.solve(&game), SolveResult::Solved(_)));
        }
    }

    #[test]
    fn test_global_revisits_board_reached_by_shorter_path() {
        // The board after (0,2) Left is first reached at depth 3, where the
        // limit leaves no room below it, and only later at depth 1.
        let game = Puzzle::from_text("4 4\n2-4P\n---5\n3-T-\n0-1-\n").unwrap();
        let expected = vec![
            mv(0, 2, Direction::Left),
            mv(0, 3, Direction::Left),
            mv(0, 2, Direction::Down),
        ];

        for mode in ALL_MODES {
            let mut solver = Solver::new(usize::MAX, Some(3), mode);
            assert_eq!(
                solver.solve(&game),
                SolveResult::Solved(expected.clone()),
                "{:?}",
                mode
            );
        }
        assert_solves(&game, &expected);
    }

    fn random_board(rng: &mut ChaCha8Rng) -> Game {
        let mut cells: Vec<usize> = (0..16).collect();
        cells.shuffle(rng);

        let mut grid = ['-'; 16];
        grid[cells[0]] = 'P';
        grid[cells[1]] = 'T';
        let obstacles = rng.gen_range(3..=6);
        for (id, &cell) in cells[2..2 + obstacles].iter().enumerate() {
            grid[cell] = char::from_digit(id as u32, 10).unwrap();
        }

        let mut text = String::from("4 4\n");
        for row in grid.chunks(4) {
            text.extend(row);
            text.push('\n');
        }
        Puzzle::from_text(&text).unwrap()
    }

    #[test]
    fn test_modes_agree_under_depth_limit() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut games: Vec<Game> = [SCENARIO, CLIMB, LEDGE]
            .iter()
            .map(|text| Puzzle::from_text(text).unwrap())
            .collect();
        games.extend((0..40).map(|_| random_board(&mut rng)));

        for game in &games {
            for depth in 1..=5 {
                let solved: Vec<bool> = ALL_MODES
                    .iter()
                    .map(|&mode| {
                        let mut solver = Solver::new(usize::MAX, Some(depth), mode);
                        match solver.solve(game) {
                            SolveResult::Solved(moves) => {
                                assert!(moves.len() <= depth);
                                assert_solves(game, &moves);
                                true
                            }
                            SolveResult::Cutoff | SolveResult::Impossible => false,
                        }
                    })
                    .collect();
                assert!(
                    solved.iter().all(|&s| s == solved[0]),
                    "modes disagree at depth {} on\n{}",
                    depth,
                    game
                );
            }
        }
    }

    #[test]
    fn test_unsolvable() {
        let game = Puzzle::from_text(SCENARIO).unwrap();

        for mode in ALL_MODES {
            let mut solver = Solver::new(100_000, None, mode);
            assert_eq!(solver.solve(&game), SolveResult::Impossible, "{:?}", mode);
        }
        assert_eq!(solve(&game), None);
    }

    #[test]
    fn test_no_moves_at_all() {
        let game = Puzzle::from_text("2 4\nP0--\nT---\n").unwrap();
        let mut solver = Solver::default();
        assert_eq!(solver.solve(&game), SolveResult::Impossible);
        assert_eq!(solver.nodes_explored(), 1);
    }
}
