//! Tournament command - round robin between command-line agents
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_tournament(), play_tournament(), report_results()
//! - Level 3: table printing
//! - Level 4: formatting utilities

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use chessbench_core::{GameResult, ResultLog};
use chessbench_tournament::{
    AgentStats, GameLengthStats, MetricsAggregator, PairRecord, ProgressObserver, ThinkTime,
    Tournament, TournamentConfig,
};

use crate::agent_spec::{build_agents, AgentSpec};
use crate::game_args::GameArgs;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct TournamentArgs {
    /// Agent as [name=]kind[:arg], e.g. random:7 or fool=replay:f2f3,g2g4
    #[arg(long = "agent", value_name = "SPEC", required = true)]
    pub agents: Vec<AgentSpec>,

    /// Repetitions per pair; each plays both colour assignments
    #[arg(long, default_value = "2")]
    pub games_per_pair: u32,

    #[command(flatten)]
    pub game: GameArgs,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Drives an indicatif bar from scheduler progress updates
struct ProgressDisplay {
    bar: ProgressBar,
}

impl ProgressDisplay {
    fn new(total: usize, hidden: bool) -> Self {
        let bar = if hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(total as u64)
        };
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} games ({eta})",
            )
            .expect("valid template")
            .progress_chars("##-"),
        );
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressObserver for ProgressDisplay {
    fn on_progress(&mut self, completed: usize, _total: usize) {
        self.bar.set_position(completed as u64);
    }
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run tournament command
///
/// 1. Build agents and validate the configuration
/// 2. Play every scheduled game
/// 3. Report tables or JSON
pub fn run(args: TournamentArgs, seed: u64) -> Result<()> {
    let mut tournament = build_tournament(&args, seed)?;

    tracing::info!(
        "Starting tournament: {} ({} games)",
        tournament.agent_names().join(", "),
        tournament.total_games()
    );

    let roster: Vec<String> = tournament.agent_names().iter().map(|n| n.to_string()).collect();
    let config = tournament.config().clone();
    let log = play_tournament(&mut tournament, args.no_progress || args.json);

    report_results(&log, &roster, &config, seed, args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn build_tournament(args: &TournamentArgs, seed: u64) -> Result<Tournament> {
    let agents = build_agents(&args.agents, seed)?;
    let config = args.game.tournament_config(args.games_per_pair);
    Tournament::new(agents, config).context("Invalid tournament configuration")
}

fn play_tournament(tournament: &mut Tournament, hide_progress: bool) -> ResultLog {
    let mut progress = ProgressDisplay::new(tournament.total_games(), hide_progress);
    tournament.run(&mut progress);
    progress.finish();
    tournament.results().clone()
}

fn report_results(
    log: &ResultLog,
    roster: &[String],
    config: &TournamentConfig,
    seed: u64,
    json: bool,
) -> Result<()> {
    let metrics = MetricsAggregator::new(log).with_roster(roster.iter().cloned());
    let report = Report {
        generated_at: chrono::Utc::now().to_rfc3339(),
        seed,
        config,
        win_rates: metrics.win_rates(),
        game_lengths: metrics.average_game_lengths(),
        head_to_head: metrics.head_to_head(),
        think_times: metrics.think_times(),
        games: log.as_slice(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text_report(&report);
    }
    Ok(())
}

/// JSON report
#[derive(Serialize)]
struct Report<'a> {
    generated_at: String,
    seed: u64,
    config: &'a TournamentConfig,
    win_rates: Vec<AgentStats>,
    game_lengths: Vec<GameLengthStats>,
    head_to_head: Vec<PairRecord>,
    think_times: Vec<ThinkTime>,
    games: &'a [GameResult],
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn print_text_report(report: &Report<'_>) {
    println!("\n=== Tournament Results ===");
    println!("Games played: {}", report.games.len());
    println!(
        "Time limit:   {}s per move ({:?})",
        report.config.time_limit_seconds, report.config.deadline
    );

    println!("\n--- Win Rates ---");
    let rows: Vec<Vec<String>> = report.win_rates.iter().map(|s| s.to_row().to_vec()).collect();
    print_table(&AgentStats::COLUMNS, &rows);

    println!("\n--- Average Game Length ---");
    let rows: Vec<Vec<String>> = report.game_lengths.iter().map(|s| s.to_row().to_vec()).collect();
    print_table(&GameLengthStats::COLUMNS, &rows);

    println!("\n--- Head to Head ---");
    for pair in &report.head_to_head {
        println!(
            "{} vs {}: +{} ={} -{} ({} games)",
            pair.first, pair.second, pair.first_wins, pair.draws, pair.second_wins, pair.games
        );
    }

    println!("\n--- Think Time ---");
    for t in &report.think_times {
        println!(
            "{}: {:.3}s over {} moves (avg {})",
            t.agent_name,
            t.total_seconds,
            t.moves,
            format_seconds(t.average_seconds)
        );
    }

    let forfeits = report.games.iter().filter(|g| g.termination.is_forfeit()).count();
    if forfeits > 0 {
        println!("\n{} game(s) ended by forfeit", forfeits);
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Print left-aligned columns sized to their widest cell
fn print_table(columns: &[&str], rows: &[Vec<String>]) {
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            rows.iter()
                .map(|row| row.get(i).map_or(0, String::len))
                .max()
                .unwrap_or(0)
                .max(col.len())
        })
        .collect();

    let format_row = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", format_row(columns.to_vec()));
    for row in rows {
        println!("{}", format_row(row.iter().map(String::as_str).collect()));
    }
}

fn format_seconds(seconds: Option<f64>) -> String {
    match seconds {
        Some(s) => format!("{:.4}s", s),
        None => "-".to_string(),
    }
}
