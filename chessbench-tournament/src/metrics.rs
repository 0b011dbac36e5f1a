//! Metrics aggregation - per-agent tables derived from a result log
//!
//! Level 2 - Phases
//!
//! Every table is recomputed from the log on each call; nothing is cached.

use chessbench_core::{ResultLog, Side, Winner};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

// ============================================================================
// TABLE ROWS
// ============================================================================

/// Win/loss/draw record for one colour
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRecord {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub games: u32,
}

impl ColorRecord {
    fn record(&mut self, outcome: Outcome) {
        self.games += 1;
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Draw => self.draws += 1,
        }
    }
}

/// Win-rate row for one agent
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentStats {
    pub agent_name: String,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    /// (wins + 0.5 * draws) / games_played, 0 with no games
    pub win_rate: f64,
    pub as_white: ColorRecord,
    pub as_black: ColorRecord,
}

impl AgentStats {
    pub const COLUMNS: [&'static str; 6] =
        ["agent_name", "games_played", "wins", "losses", "draws", "win_rate"];

    fn from_colors(agent_name: String, as_white: ColorRecord, as_black: ColorRecord) -> Self {
        let wins = as_white.wins + as_black.wins;
        let losses = as_white.losses + as_black.losses;
        let draws = as_white.draws + as_black.draws;
        let games_played = as_white.games + as_black.games;
        let win_rate = if games_played == 0 {
            0.0
        } else {
            (wins as f64 + 0.5 * draws as f64) / games_played as f64
        };
        Self {
            agent_name,
            games_played,
            wins,
            losses,
            draws,
            win_rate,
            as_white,
            as_black,
        }
    }

    pub fn to_row(&self) -> [String; 6] {
        [
            self.agent_name.clone(),
            self.games_played.to_string(),
            self.wins.to_string(),
            self.losses.to_string(),
            self.draws.to_string(),
            format!("{:.4}", self.win_rate),
        ]
    }
}

/// Average game length for one agent
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameLengthStats {
    pub agent_name: String,
    /// Mean move count over all games played; None with no games
    pub average_move_count: Option<f64>,
}

impl GameLengthStats {
    pub const COLUMNS: [&'static str; 2] = ["agent_name", "average_move_count"];

    pub fn to_row(&self) -> [String; 2] {
        [
            self.agent_name.clone(),
            self.average_move_count
                .map(|avg| format!("{:.2}", avg))
                .unwrap_or_default(),
        ]
    }
}

/// Results between two agents, from the first agent's point of view
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairRecord {
    pub first: String,
    pub second: String,
    pub first_wins: u32,
    pub second_wins: u32,
    pub draws: u32,
    pub games: u32,
}

/// Decision time spent on accepted moves
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThinkTime {
    pub agent_name: String,
    pub total_seconds: f64,
    pub moves: u32,
    /// total_seconds / moves; None with no moves
    pub average_seconds: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Win,
    Loss,
    Draw,
}

fn outcome_for(side: Side, winner: Winner) -> Outcome {
    match winner {
        Winner::Draw => Outcome::Draw,
        w if w == Winner::side(side) => Outcome::Win,
        _ => Outcome::Loss,
    }
}

// ============================================================================
// AGGREGATOR
// ============================================================================

/// Computes per-agent tables from a result log
#[derive(Clone, Debug)]
pub struct MetricsAggregator<'a> {
    log: &'a ResultLog,
    roster: Vec<String>,
}

impl<'a> MetricsAggregator<'a> {
    pub fn new(log: &'a ResultLog) -> Self {
        Self {
            log,
            roster: Vec::new(),
        }
    }

    /// Agents listed here appear in every table, even with no games, and
    /// come first in tie order
    pub fn with_roster<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roster = names.into_iter().map(Into::into).collect();
        self
    }

    /// Win-rate table, highest first; ties keep insertion order
    pub fn win_rates(&self) -> Vec<AgentStats> {
        let (names, index) = self.agent_index();
        let mut white = vec![ColorRecord::default(); names.len()];
        let mut black = vec![ColorRecord::default(); names.len()];

        for game in self.log {
            let w = index[game.white_agent_name.as_str()];
            let b = index[game.black_agent_name.as_str()];
            white[w].record(outcome_for(Side::White, game.winner));
            black[b].record(outcome_for(Side::Black, game.winner));
        }

        let mut stats: Vec<AgentStats> = names
            .into_iter()
            .zip(white.into_iter().zip(black))
            .map(|(name, (w, b))| AgentStats::from_colors(name, w, b))
            .collect();

        // sort_by is stable
        stats.sort_by(|a, b| {
            b.win_rate
                .partial_cmp(&a.win_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        stats
    }

    /// Mean move count per agent over games as either colour
    pub fn average_game_lengths(&self) -> Vec<GameLengthStats> {
        let (names, index) = self.agent_index();
        let mut totals = vec![(0u64, 0u32); names.len()];

        for game in self.log {
            for name in [&game.white_agent_name, &game.black_agent_name] {
                let entry = &mut totals[index[name.as_str()]];
                entry.0 += game.move_count as u64;
                entry.1 += 1;
            }
        }

        names
            .into_iter()
            .zip(totals)
            .map(|(agent_name, (moves, games))| GameLengthStats {
                agent_name,
                average_move_count: (games > 0).then(|| moves as f64 / games as f64),
            })
            .collect()
    }

    /// One record per unordered pair that met, in first-meeting order
    pub fn head_to_head(&self) -> Vec<PairRecord> {
        let mut records: Vec<PairRecord> = Vec::new();
        let mut index: FxHashMap<(&str, &str), usize> = FxHashMap::default();

        for game in self.log {
            let white = game.white_agent_name.as_str();
            let black = game.black_agent_name.as_str();
            let existing = index
                .get(&(white, black))
                .or_else(|| index.get(&(black, white)))
                .copied();
            let slot = match existing {
                Some(slot) => slot,
                None => {
                    index.insert((white, black), records.len());
                    records.push(PairRecord {
                        first: white.to_string(),
                        second: black.to_string(),
                        first_wins: 0,
                        second_wins: 0,
                        draws: 0,
                        games: 0,
                    });
                    records.len() - 1
                }
            };

            let record = &mut records[slot];
            record.games += 1;
            match game.winner_name() {
                None => record.draws += 1,
                Some(name) if name == record.first => record.first_wins += 1,
                Some(_) => record.second_wins += 1,
            }
        }
        records
    }

    /// Decision time per agent; games with an unreadable final FEN are skipped
    pub fn think_times(&self) -> Vec<ThinkTime> {
        let (names, index) = self.agent_index();
        let mut totals = vec![(0.0f64, 0u32); names.len()];

        for game in self.log {
            let (Some(white_moves), Some(black_moves)) =
                (game.moves_by(Side::White), game.moves_by(Side::Black))
            else {
                tracing::debug!("Skipping game with unreadable FEN: {}", game.final_position);
                continue;
            };
            let w = index[game.white_agent_name.as_str()];
            let b = index[game.black_agent_name.as_str()];
            add_time(&mut totals[w], game.time_white, white_moves);
            add_time(&mut totals[b], game.time_black, black_moves);
        }

        names
            .into_iter()
            .zip(totals)
            .map(|(agent_name, (total_seconds, moves))| ThinkTime {
                agent_name,
                total_seconds,
                moves,
                average_seconds: (moves > 0).then(|| total_seconds / moves as f64),
            })
            .collect()
    }

    // ========================================================================
    // Level 4 - Utilities
    // ========================================================================

    /// Agent names in insertion order (roster, then first appearance) and
    /// their positions
    fn agent_index(&self) -> (Vec<String>, FxHashMap<&str, usize>) {
        let mut names: Vec<String> = Vec::new();
        let mut index: FxHashMap<&str, usize> = FxHashMap::default();

        let from_log = self
            .log
            .iter()
            .flat_map(|g| [g.white_agent_name.as_str(), g.black_agent_name.as_str()]);
        for name in self.roster.iter().map(String::as_str).chain(from_log) {
            if !index.contains_key(name) {
                index.insert(name, names.len());
                names.push(name.to_string());
            }
        }
        (names, index)
    }
}

fn add_time(entry: &mut (f64, u32), seconds: f64, moves: u32) {
    entry.0 += seconds;
    entry.1 += moves;
}
