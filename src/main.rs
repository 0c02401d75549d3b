use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use crossbeam_channel::{Receiver, bounded};
use parallel_astar::problems::{Board, GridProblem, Position, SlidingPuzzle};
use parallel_astar::search::progress::Progress;
use parallel_astar::search::{
    Algorithm, Search, SearchAlgorithm, SearchConfig, SearchStatistics, StorageKind,
    TransitionAStar,
};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread::{self, JoinHandle};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// --- Command Line Arguments ---

#[derive(Parser)]
#[command(name = "pastar")]
#[command(about = "pastar - parallel A* search")]
#[command(version)]
#[command(subcommand_required = true)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// CLI algorithm selection
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliAlgorithm {
    /// Single-threaded A*
    Sequential,
    /// Lockstep batches, one item per worker per round
    Symmetric,
    /// Coordinator refills each worker as soon as it answers
    Served,
    /// Workers pull from a shared storage proxy
    Pulled,
}

impl From<CliAlgorithm> for Algorithm {
    fn from(cli: CliAlgorithm) -> Self {
        match cli {
            CliAlgorithm::Sequential => Algorithm::Sequential,
            CliAlgorithm::Symmetric => Algorithm::Symmetric,
            CliAlgorithm::Served => Algorithm::Served,
            CliAlgorithm::Pulled => Algorithm::Pulled,
        }
    }
}

/// CLI frontier storage selection
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliStorage {
    /// Keep every discovered item, duplicates included
    Layered,
    /// Queue each state only the first time it is seen
    Unique,
}

impl From<CliStorage> for StorageKind {
    fn from(cli: CliStorage) -> Self {
        match cli {
            CliStorage::Layered => StorageKind::Layered,
            CliStorage::Unique => StorageKind::Unique,
        }
    }
}

/// Options shared by every subcommand
#[derive(Args, Clone)]
struct SearchArgs {
    /// Search strategy
    #[arg(long, value_enum, default_value = "sequential")]
    algorithm: CliAlgorithm,
    /// Frontier storage
    #[arg(long, value_enum, default_value = "unique")]
    storage: CliStorage,
    /// Number of worker threads for the parallel strategies (default: CPU count)
    #[arg(long, short = 'j')]
    workers: Option<usize>,
    /// Disable the prefetching storage proxy of the pulled strategy
    #[arg(long)]
    no_prepared: bool,
    /// Print the frontier estimate as the search advances
    #[arg(long)]
    progress: bool,
    /// Print the action sequence instead of the visited states
    #[arg(long)]
    moves: bool,
    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,
}

impl SearchArgs {
    fn config(&self) -> SearchConfig {
        SearchConfig::default()
            .with_algorithm(self.algorithm.into())
            .with_storage(self.storage.into())
            .with_workers_option(self.workers)
            .with_prepared(!self.no_prepared)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Find a shortest path on a grid with walls
    Grid {
        /// Text map: '#' wall, '.' open, 'S' start, 'G' goal
        #[arg(long, conflicts_with_all = ["size", "start", "goal", "walls"])]
        map: Option<PathBuf>,
        /// Grid dimensions as WIDTHxHEIGHT
        #[arg(long, default_value = "3x3", value_parser = parse_size)]
        size: (usize, usize),
        /// Start cell as x,y
        #[arg(long, default_value = "0,0")]
        start: Position,
        /// Goal cell as x,y (default: bottom-right corner)
        #[arg(long)]
        goal: Option<Position>,
        /// Wall cell as x,y (repeatable)
        #[arg(long = "wall")]
        walls: Vec<Position>,

        #[command(flatten)]
        search: SearchArgs,
    },
    /// Solve a sliding tile puzzle
    Slide {
        /// Tiles in row-major order, 0 or _ for the blank
        #[arg(required = true, num_args = 1..)]
        tiles: Vec<String>,

        #[command(flatten)]
        search: SearchArgs,
    },
}

fn parse_size(s: &str) -> Result<(usize, usize), String> {
    let invalid = || format!("invalid size '{}', expected WIDTHxHEIGHT", s);
    let (width, height) = s.split_once(['x', 'X']).ok_or_else(invalid)?;
    let width: usize = width.trim().parse().map_err(|_| invalid())?;
    let height: usize = height.trim().parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok((width, height))
}

// --- Entry Point ---

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Grid {
            map,
            size,
            start,
            goal,
            walls,
            search,
        } => {
            setup_logging(search.verbose)?;
            let (problem, start) = match map {
                Some(path) => load_map(&path)?,
                None => {
                    let (width, height) = size;
                    let goal = goal.unwrap_or(Position::new(width - 1, height - 1));
                    let problem = GridProblem::new(width, height, goal).with_walls(walls);
                    (problem, start)
                }
            };
            solve_grid(problem, start, &search)
        }
        Commands::Slide { tiles, search } => {
            setup_logging(search.verbose)?;
            let board: Board = tiles
                .join(" ")
                .parse()
                .context("Invalid board")?;
            solve_slide(board, &search)
        }
    }
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("parallel_astar=debug,pastar=debug,warn")
    } else {
        EnvFilter::new("parallel_astar=info,pastar=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}

// --- Problems ---

fn load_map(path: &Path) -> Result<(GridProblem, Position)> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read map {}", path.display()))?;
    GridProblem::parse(&text).with_context(|| format!("Invalid map {}", path.display()))
}

fn solve_grid(problem: GridProblem, start: Position, args: &SearchArgs) -> Result<()> {
    if !problem.is_open(start) {
        bail!("Start {} is outside the grid or on a wall", start);
    }
    if !problem.is_open(problem.goal()) {
        bail!("Goal {} is outside the grid or on a wall", problem.goal());
    }
    info!(
        width = problem.width(),
        height = problem.height(),
        start = %start,
        goal = %problem.goal(),
        "Solving grid"
    );

    if args.moves {
        let solver = TransitionAStar::new(start, problem, args.config());
        let (actions, stats) = run_transitions(solver, args.progress)?;
        print_actions(actions.as_deref());
        print_statistics(&stats);
        return Ok(());
    }

    let search = Search::new(start, problem.clone(), args.config());
    let (path, stats) = run_search(search, args.progress)?;
    match path {
        Some(path) => {
            println!("Path ({} states):", path.len());
            for position in &path {
                println!("  {}", position);
            }
            print!("{}", problem.render(start, &path));
        }
        None => println!("No solution found"),
    }
    print_statistics(&stats);
    Ok(())
}

fn solve_slide(board: Board, args: &SearchArgs) -> Result<()> {
    println!("Board:\n{}", board);
    if !board.is_solvable() {
        println!("No solution: board is not solvable");
        return Ok(());
    }
    let puzzle = SlidingPuzzle::for_board(&board);

    if args.moves {
        let solver = TransitionAStar::new(board, puzzle, args.config());
        let (actions, stats) = run_transitions(solver, args.progress)?;
        print_actions(actions.as_deref());
        print_statistics(&stats);
        return Ok(());
    }

    let search = Search::new(board, puzzle, args.config());
    let (path, stats) = run_search(search, args.progress)?;
    match path {
        Some(path) => {
            println!("Solution ({} moves):", path.len().saturating_sub(1));
            for (step, board) in path.iter().enumerate().skip(1) {
                println!("Step {}:\n{}", step, board);
            }
        }
        None => println!("No solution found"),
    }
    print_statistics(&stats);
    Ok(())
}

// --- Running ---

fn run_search<P>(
    search: Search<P>,
    progress: bool,
) -> Result<(Option<Vec<P::State>>, SearchStatistics)>
where
    P: parallel_astar::SearchProblem,
{
    let (mut search, printer) = if progress {
        let (tx, rx) = bounded(1024);
        (search.with_reporting(tx), Some(spawn_progress_printer(rx)))
    } else {
        (search, None)
    };

    let path = search.solve().context("Search failed")?;
    let stats = search.statistics();
    drop(search);
    finish_printer(printer);
    Ok((path, stats))
}

fn run_transitions<P>(
    solver: TransitionAStar<P>,
    progress: bool,
) -> Result<(Option<Vec<P::Action>>, SearchStatistics)>
where
    P: parallel_astar::TransitionProblem,
{
    let (mut solver, printer) = if progress {
        let (tx, rx) = bounded(1024);
        (solver.with_reporting(tx), Some(spawn_progress_printer(rx)))
    } else {
        (solver, None)
    };

    let actions = solver.solve().context("Search failed")?;
    let stats = solver.statistics();
    drop(solver);
    finish_printer(printer);
    Ok((actions, stats))
}

/// Print each new lowest estimate; exits once the search drops its sender
fn spawn_progress_printer(samples: Receiver<Progress>) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut layer = None;
        for sample in samples {
            if layer.map_or(true, |seen| sample.estimate > seen) {
                eprintln!("progress: estimate {} (cost {})", sample.estimate, sample.cost);
                layer = Some(sample.estimate);
            }
        }
    })
}

fn finish_printer(printer: Option<JoinHandle<()>>) {
    if let Some(handle) = printer {
        let _ = handle.join();
    }
}

// --- Output ---

fn print_actions<A: Display>(actions: Option<&[A]>) {
    match actions {
        Some(actions) => {
            let names: Vec<String> = actions.iter().map(|a| a.to_string()).collect();
            println!("Moves ({}): {}", actions.len(), names.join(" "));
        }
        None => println!("No solution found"),
    }
}

/// Print search statistics
fn print_statistics(stats: &SearchStatistics) {
    println!("\nSearch Statistics:");
    for line in stats.format_summary().lines() {
        println!("  {}", line);
    }
}
