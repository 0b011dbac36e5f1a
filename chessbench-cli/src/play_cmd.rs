//! Play command - a single game between two command-line agents

use anyhow::{Context, Result};
use clap::Args;

use chessbench_core::GameResult;
use chessbench_tournament::MatchExecutor;

use crate::agent_spec::AgentSpec;
use crate::game_args::GameArgs;

#[derive(Args)]
pub struct PlayArgs {
    /// White agent as [name=]kind[:arg]
    #[arg(long, value_name = "SPEC")]
    pub white: AgentSpec,

    /// Black agent as [name=]kind[:arg]
    #[arg(long, value_name = "SPEC")]
    pub black: AgentSpec,

    #[command(flatten)]
    pub game: GameArgs,

    /// Output the game record as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run play command
pub fn run(args: PlayArgs, seed: u64) -> Result<()> {
    let white = args.white.build(0, seed)?;
    let black = args.black.build(1, seed)?;
    anyhow::ensure!(
        white.name() != black.name(),
        "both agents are named '{}'",
        white.name()
    );

    let config = args
        .game
        .tournament_config(1)
        .match_config()
        .context("Invalid game configuration")?;
    let executor = MatchExecutor::new(config)?;

    tracing::info!("Playing {} (white) vs {} (black)", white.name(), black.name());
    let result = executor.play(&white, &black);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_game(&result);
    }
    Ok(())
}

fn print_game(result: &GameResult) {
    println!("\n=== Game Result ===");
    println!("White:    {}", result.white_agent_name);
    println!("Black:    {}", result.black_agent_name);
    match result.winner_name() {
        Some(name) => println!("Winner:   {} ({})", name, result.winner),
        None => println!("Winner:   draw"),
    }
    println!("Ended by: {}", result.termination);
    println!("Moves:    {}", result.move_count);
    println!(
        "Time:     white {:.3}s, black {:.3}s",
        result.time_white, result.time_black
    );
    println!("Final:    {}", result.final_position);
}
