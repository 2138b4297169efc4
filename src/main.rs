use std::fs;
use std::io;

use clap::{Parser, ValueEnum};
use derive_more::{Display, Error, From};
use sokoengine::{BoardGraph, HashedBoardManager, Mover, SolvingMode};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Tessellation {
    Sokoban,
    Hexoban,
    Trioban,
    Octoban,
}

impl From<Tessellation> for sokoengine::Tessellation {
    fn from(t: Tessellation) -> Self {
        match t {
            Tessellation::Sokoban => sokoengine::Tessellation::Sokoban,
            Tessellation::Hexoban => sokoengine::Tessellation::Hexoban,
            Tessellation::Trioban => sokoengine::Tessellation::Trioban,
            Tessellation::Octoban => sokoengine::Tessellation::Octoban,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Direction {
    Forward,
    Reverse,
}

impl From<Direction> for SolvingMode {
    fn from(dir: Direction) -> Self {
        match dir {
            Direction::Forward => SolvingMode::Forward,
            Direction::Reverse => SolvingMode::Reverse,
        }
    }
}

#[derive(Debug, Display, Error, From)]
enum CliError {
    #[display("IO error: {_0}")]
    Io(io::Error),
    #[display("{_0}")]
    Engine(sokoengine::Error),
}

#[derive(Parser)]
#[command(name = "sokoengine")]
#[command(about = "Replays moves on a Sokoban-family board", long_about = None)]
struct Args {
    /// Path to a file holding a single board
    #[arg(value_name = "FILE")]
    board_file: String,

    /// Board geometry
    #[arg(short, long, value_enum, default_value = "sokoban")]
    tessellation: Tessellation,

    /// Solving mode
    #[arg(short = 'd', long, value_enum, default_value = "forward")]
    direction: Direction,

    /// Steps to replay, lowercase for moves and uppercase for pushes or
    /// reverse-mode pulls
    #[arg(short, long, default_value = "")]
    moves: String,

    /// Sokoban+ box order; enables Sokoban+ together with --goalorder
    #[arg(long, requires = "goalorder")]
    boxorder: Option<String>,

    /// Sokoban+ goal order
    #[arg(long, requires = "boxorder")]
    goalorder: Option<String>,

    /// Number of steps to undo after replaying
    #[arg(short, long, default_value = "0")]
    undo: usize,

    /// Print the board after every step
    #[arg(short, long)]
    print_steps: bool,
}

fn run(args: &Args) -> Result<(), CliError> {
    let text = fs::read_to_string(&args.board_file)?;
    let tessellation: sokoengine::Tessellation = args.tessellation.into();
    let board = BoardGraph::from_text(&text, tessellation)?;

    let mut manager = HashedBoardManager::new(board);
    if let (Some(boxorder), Some(goalorder)) = (&args.boxorder, &args.goalorder) {
        manager.set_sokoban_plus(boxorder, goalorder);
        manager.enable_sokoban_plus()?;
    }

    let mut mover = Mover::from_manager(manager, args.direction.into())?;
    println!("Starting position:\n{}", mover);

    let total = args.moves.chars().filter(|c| !c.is_whitespace()).count();
    for (count, ch) in args.moves.chars().filter(|c| !c.is_whitespace()).enumerate() {
        let recorded = tessellation.char_to_pusher_step(ch)?;
        let step = mover.replay_step(&recorded).inspect_err(|err| {
            warn!(%ch, position = count + 1, %err, "step doesn't replay");
        })?;
        if args.print_steps {
            println!("{} ({}/{}):\n{}", step, count + 1, total, mover);
        }
    }

    for _ in 0..args.undo {
        let step = mover.undo_last()?;
        if args.print_steps {
            println!("undo {}:\n{}", step, mover);
        }
    }

    info!(steps = mover.history().count(), "replay finished");
    println!("Final position:\n{}", mover);
    println!(
        "solved: {}  state hash: {:016x}  normalized hash: {:016x}",
        if mover.is_solved() { 'Y' } else { 'N' },
        mover.state_hash(),
        mover.manager().normalized_state_hash()
    );
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
