//! chessbench CLI - command-line interface
//!
//! Commands:
//! - tournament: Run a colour-balanced round robin and report metrics
//! - play: Play a single game

mod agent_spec;
mod game_args;
mod play_cmd;
mod tournament_cmd;

use clap::{Parser, Subcommand};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chessbench")]
#[command(about = "Time-boxed chess agent tournaments")]
struct Cli {
    /// Base seed for random agents without an explicit seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a round-robin tournament
    Tournament(tournament_cmd::TournamentArgs),
    /// Play a single game
    Play(play_cmd::PlayArgs),
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so JSON output stays clean; RUST_LOG overrides
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let seed = resolve_seed(cli.seed);

    match cli.command {
        Commands::Tournament(args) => tournament_cmd::run(args, seed),
        Commands::Play(args) => play_cmd::run(args, seed),
    }
}

/// Use the given seed or draw one from entropy
fn resolve_seed(seed: Option<u64>) -> u64 {
    match seed {
        Some(s) => s,
        None => {
            let s = ChaCha8Rng::from_entropy().gen();
            tracing::info!("Using seed {}", s);
            s
        }
    }
}
