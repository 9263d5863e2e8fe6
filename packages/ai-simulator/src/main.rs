//! AI Simulator CLI - plays computer-vs-computer grid games in memory.
//!
//! Games run on a bare board with no sessions or delays, so thousands of
//! rounds take well under a second. Use it to compare difficulties.

mod metrics;
mod output;
mod simulator;
mod types;

use std::time::{Duration, Instant};

use cafebot::ai::registry::by_difficulty;
use cafebot::domain::{Difficulty, Mark};
use clap::Parser;
use metrics::{build_game_metrics, Outcome};
use output::OutputWriter;
use simulator::{GameResult, Simulator};
use tracing::{info, warn};
use types::{Level, OutputFormat};

#[derive(Parser)]
#[command(name = "ai-simulator")]
#[command(about = "Computer-vs-computer simulator for the grid game")]
struct Args {
    /// Number of games to simulate
    #[arg(short, long, default_value = "100")]
    games: u32,

    /// Difficulty playing X
    #[arg(long, default_value = "hard")]
    x: Level,

    /// Difficulty playing O
    #[arg(long, default_value = "hard")]
    o: Level,

    /// Base seed; game N uses seed + N
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output directory for results
    #[arg(long, default_value = "./simulation-results")]
    output_dir: String,

    /// Output format
    #[arg(long, default_value = "jsonl")]
    output_format: OutputFormat,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let x: Difficulty = args.x.into();
    let o: Difficulty = args.o.into();
    info!(games = args.games, %x, %o, "starting simulation");

    let mut output_writer = OutputWriter::new(&args.output_dir, &args.output_format)?;
    let simulator = Simulator::new(x, o);

    let start = Instant::now();
    let mut results = Vec::new();
    let mut errors = 0;

    for game_num in 1..=args.games {
        let game_start = Instant::now();
        let game_seed = match args.seed {
            Some(base) => base.wrapping_add(u64::from(game_num)),
            None => rand::random(),
        };

        match simulator.simulate_game(game_num, game_seed) {
            Ok(result) => {
                let duration_ms = game_start.elapsed().as_secs_f64() * 1000.0;
                let metrics =
                    build_game_metrics(game_num, game_seed, (x, o), args.games, &result, duration_ms);
                if let Err(e) = output_writer.write_game(&metrics) {
                    warn!("Failed to write metrics for game {}: {}", game_num, e);
                }
                if args.verbose {
                    info!(game = game_num, verdict = ?result.verdict, "game completed");
                }
                results.push(result);
            }
            Err(e) => {
                errors += 1;
                warn!("Game {} failed: {}", game_num, e);
            }
        }
    }

    let elapsed = start.elapsed();
    let (jsonl_path, csv_path) = output_writer.output_paths();
    let (jsonl_path, csv_path) = (jsonl_path.cloned(), csv_path.clone());
    output_writer.finish()?;

    print_summary(&results, errors, elapsed, args.games, (x, o));
    if let Some(path) = jsonl_path {
        println!("Detailed results: {}", path.display());
    }
    println!("Summary CSV: {}", csv_path.display());

    Ok(())
}

#[derive(Default)]
struct Counts {
    x_wins: u32,
    o_wins: u32,
    draws: u32,
}

impl Counts {
    fn add(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::XWin => self.x_wins += 1,
            Outcome::OWin => self.o_wins += 1,
            Outcome::Draw => self.draws += 1,
        }
    }

    fn total(&self) -> u32 {
        self.x_wins + self.o_wins + self.draws
    }

    fn line(&self) -> String {
        let pct = |n: u32| match self.total() {
            0 => 0.0,
            t => f64::from(n) * 100.0 / f64::from(t),
        };
        format!(
            "X wins {} ({:.1}%), O wins {} ({:.1}%), draws {} ({:.1}%)",
            self.x_wins,
            pct(self.x_wins),
            self.o_wins,
            pct(self.o_wins),
            self.draws,
            pct(self.draws)
        )
    }
}

fn print_summary(
    results: &[GameResult],
    errors: u32,
    elapsed: Duration,
    total: u32,
    (x, o): (Difficulty, Difficulty),
) {
    println!("\n=== Simulation Summary ===");
    println!(
        "X: {} ({}), O: {} ({})",
        x,
        by_difficulty(x).name,
        o,
        by_difficulty(o).name
    );
    println!("Games completed: {}/{}", results.len(), total);
    if errors > 0 {
        println!("Errors: {}", errors);
    }
    println!("Total time: {:?}", elapsed);
    if results.is_empty() {
        return;
    }

    let mut overall = Counts::default();
    let mut x_first = Counts::default();
    let mut o_first = Counts::default();
    for result in results {
        let outcome = Outcome::from(result.verdict);
        overall.add(outcome);
        match result.first_mover {
            Mark::X => x_first.add(outcome),
            Mark::O => o_first.add(outcome),
        }
    }

    println!("\n=== Results ===");
    println!("Overall:        {}", overall.line());
    println!("X moved first:  {}", x_first.line());
    println!("O moved first:  {}", o_first.line());
}
