use clap::{Parser, ValueEnum};
use std::io::{self, BufRead, Write};
use std::time::Instant;
use summit::repl::Session;
use summit::{Game, Move, Puzzle, SolveResult, Solver, Transpositions};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TranspositionMode {
    Off,
    Path,
    Global,
}

impl From<TranspositionMode> for Transpositions {
    fn from(mode: TranspositionMode) -> Self {
        match mode {
            TranspositionMode::Off => Transpositions::Off,
            TranspositionMode::Path => Transpositions::Path,
            TranspositionMode::Global => Transpositions::Global,
        }
    }
}

fn print_solution(game: &Game, solution: &[Move]) {
    println!("\nStarting position:\n{}", game);
    let mut game = game.clone();
    let total = solution.len();
    for (count, &mv) in solution.iter().enumerate() {
        match game.apply(mv) {
            Ok(resolved) => println!("{} ({}/{}):\n{}", resolved, count + 1, total, game),
            Err(err) => {
                eprintln!("Error: solution step {} failed: {}", mv, err);
                return;
            }
        }
    }
}

struct SolveOpts {
    max_nodes: usize,
    max_depth: Option<usize>,
    transpositions: Transpositions,
    print_solution: bool,
}

fn solve_puzzle(game: &Game, opts: SolveOpts) -> bool {
    let mut solver = Solver::new(opts.max_nodes, opts.max_depth, opts.transpositions);
    let start = Instant::now();
    let result = solver.solve(game);
    let elapsed_ms = start.elapsed().as_millis();

    let (solved_char, solution_len) = match &result {
        SolveResult::Solved(solution) => ('Y', solution.len()),
        SolveResult::Cutoff => ('N', 0),
        SolveResult::Impossible => ('X', 0),
    };

    println!(
        "solved: {}  steps: {:<5}  states: {:<12}  elapsed: {} ms",
        solved_char,
        solution_len,
        solver.nodes_explored(),
        elapsed_ms
    );

    match result {
        SolveResult::Solved(solution) => {
            if opts.print_solution {
                print_solution(game, &solution);
            }
            true
        }
        SolveResult::Cutoff | SolveResult::Impossible => false,
    }
}

fn prompt_for_filename() -> io::Result<String> {
    print!("Puzzle filename: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[derive(Parser)]
#[command(name = "summit")]
#[command(about = "A sliding-piece puzzle solver", long_about = None)]
struct Args {
    /// Path to the puzzle file (prompted for when omitted in interactive mode)
    #[arg(value_name = "FILE")]
    puzzle_file: Option<String>,

    /// Solve the puzzle and exit instead of starting the interactive prompt
    #[arg(short, long)]
    solve: bool,

    /// Print the solution step-by-step
    #[arg(short, long)]
    print_solution: bool,

    /// Maximum number of nodes to explore before giving up
    #[arg(short = 'n', long, default_value = "5000000")]
    max_nodes: usize,

    /// Maximum solution length to search
    #[arg(short = 'd', long)]
    max_depth: Option<usize>,

    /// How the search treats boards it has already seen
    #[arg(short = 't', long, value_enum, default_value = "global")]
    transpositions: TranspositionMode,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("summit=warn")),
        )
        .with_writer(io::stderr)
        .init();

    if args.print_solution && !args.solve {
        eprintln!("Error: --print-solution only applies together with --solve");
        std::process::exit(1);
    }

    if args.max_nodes == 0 {
        eprintln!("Error: max nodes must be at least 1");
        std::process::exit(1);
    }

    let filename = match args.puzzle_file {
        Some(filename) => filename,
        None if args.solve => {
            eprintln!("Error: a puzzle file is required with --solve");
            std::process::exit(1);
        }
        None => match prompt_for_filename() {
            Ok(filename) => filename,
            Err(e) => {
                eprintln!("Error reading filename: {}", e);
                std::process::exit(1);
            }
        },
    };

    // Load the puzzle from file
    let game = match Puzzle::from_file(&filename) {
        Ok(game) => game,
        Err(e) => {
            eprintln!("Failed to load puzzle: {}", e);
            std::process::exit(1);
        }
    };

    if args.solve {
        let opts = SolveOpts {
            max_nodes: args.max_nodes,
            max_depth: args.max_depth,
            transpositions: args.transpositions.into(),
            print_solution: args.print_solution,
        };
        if !solve_puzzle(&game, opts) {
            std::process::exit(2);
        }
        return;
    }

    let mut session = Session::new(game, io::stdout(), args.max_nodes);
    if let Err(e) = session.run(io::stdin().lock()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
