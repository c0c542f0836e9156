use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

use twenty48::engine::{Game, DEFAULT_SIZE};
use twenty48::serialization;

#[derive(Debug, Parser)]
#[command(name = "simulate", about = "Batch 2048 runner with a random-legal-move policy")]
struct Args {
    /// Number of games to play
    #[arg(long, default_value_t = 100)]
    games: u64,

    /// Base RNG seed; game i runs with seed + i
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Board dimension (N x N)
    #[arg(long, default_value_t = DEFAULT_SIZE)]
    size: usize,

    /// Stop a game after this many moves
    #[arg(long)]
    steps: Option<u64>,

    /// Write each game's final snapshot as JSON into this directory
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Suppress the progress bar
    #[arg(long)]
    quiet: bool,
}

struct RunStats {
    score: u64,
    highest_tile: u32,
    moves: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(dir) = &args.out_dir {
        fs::create_dir_all(dir)?;
    }
    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(args.games);
        pb.set_style(ProgressStyle::with_template(
            "{bar:40} {pos}/{len} | elapsed: {elapsed_precise}",
        )?);
        pb
    };

    let start = Instant::now();
    let results: Vec<RunStats> = (0..args.games)
        .into_par_iter()
        .map(|i| {
            let stats = run_single_game(&args, i)?;
            pb.inc(1);
            Ok(stats)
        })
        .collect::<Result<Vec<_>>>()?;
    pb.finish_and_clear();

    let elapsed = start.elapsed().as_secs_f64().max(1e-6);
    let total_moves: u64 = results.iter().map(|r| r.moves).sum();
    let best_score = results.iter().map(|r| r.score).max().unwrap_or(0);
    let best_tile = results.iter().map(|r| r.highest_tile).max().unwrap_or(0);
    let mean_score =
        results.iter().map(|r| r.score).sum::<u64>() as f64 / results.len().max(1) as f64;
    println!(
        "Games: {} | mean score: {:.1} | best score: {} | best tile: {} | moves/sec: {:.1}",
        results.len(),
        mean_score,
        best_score,
        best_tile,
        (total_moves as f64) / elapsed
    );
    Ok(())
}

fn run_single_game(args: &Args, index: u64) -> Result<RunStats> {
    let mut rng = StdRng::seed_from_u64(args.seed + index);
    let mut game = Game::with_size(args.size, &mut rng);
    let mut moves = 0u64;
    loop {
        let available = game.available_moves();
        let direction = match available.choose(&mut rng) {
            Some(&dir) => dir,
            None => break,
        };
        moves += 1;
        let result = game.apply_move(direction, &mut rng);
        if result.game_over {
            break;
        }
        if let Some(limit) = args.steps {
            if moves >= limit {
                break;
            }
        }
    }
    if let Some(dir) = &args.out_dir {
        serialization::write_json_to_path(run_path(dir, args.seed + index), &game.snapshot())?;
    }
    Ok(RunStats {
        score: game.score(),
        highest_tile: game.highest_tile(),
        moves,
    })
}

fn run_path(dir: &Path, seed: u64) -> PathBuf {
    dir.join(format!("run-{:06}.json", seed))
}
