//! Configuration types for matches and tournaments
//!
//! Level 4 - Utilities and configuration

use std::collections::HashSet;
use std::time::Duration;

use chessbench_core::{CoreError, Position};
use serde::{Deserialize, Serialize};

/// How the per-move time limit is enforced
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeadlinePolicy {
    /// Move requests run on a worker thread; the executor stops waiting at
    /// the deadline and forfeits the mover without waiting for the call
    Enforced,
    /// Move requests run on the calling thread and are timed after they
    /// return. An agent that never returns blocks the caller.
    Measured,
}

impl Default for DeadlinePolicy {
    fn default() -> Self {
        DeadlinePolicy::Enforced
    }
}

/// Invalid match or tournament parameters
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("a tournament needs at least 2 agents, got {count}")]
    TooFewAgents { count: usize },

    #[error("duplicate agent name '{0}'")]
    DuplicateAgentName(String),

    #[error("games per pair must be at least 1")]
    ZeroGamesPerPair,

    #[error("time limit must be a positive number of seconds, got {0}")]
    InvalidTimeLimit(f64),

    #[error("invalid start position")]
    InvalidStartFen(#[source] CoreError),
}

/// Configuration for a single game
#[derive(Clone, Debug, PartialEq)]
pub struct MatchConfig {
    /// Maximum decision time per move
    pub time_limit: Duration,
    /// How the time limit is enforced
    pub deadline: DeadlinePolicy,
    /// Optional cap on applied moves; reaching it ends the game as a draw
    pub max_moves: Option<u32>,
    /// Starting position (None = standard start)
    pub start_fen: Option<String>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(1),
            deadline: DeadlinePolicy::default(),
            max_moves: None,
            start_fen: None,
        }
    }
}

impl MatchConfig {
    /// Create config with the given per-move time limit
    pub fn new(time_limit: Duration) -> Self {
        Self {
            time_limit,
            ..Default::default()
        }
    }

    pub fn with_deadline(mut self, deadline: DeadlinePolicy) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_max_moves(mut self, max_moves: u32) -> Self {
        self.max_moves = Some(max_moves);
        self
    }

    pub fn with_start_fen(mut self, fen: impl Into<String>) -> Self {
        self.start_fen = Some(fen.into());
        self
    }

    /// Validate and build the starting position
    pub fn start_position(&self) -> Result<Position, ConfigError> {
        if self.time_limit.is_zero() {
            return Err(ConfigError::InvalidTimeLimit(0.0));
        }
        match &self.start_fen {
            Some(fen) => Position::from_fen(fen).map_err(ConfigError::InvalidStartFen),
            None => Ok(Position::new()),
        }
    }
}

/// Tournament configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentConfig {
    /// Repetitions per pair; each repetition plays both colour assignments
    pub games_per_pair: u32,
    /// Maximum decision time per move, in seconds
    pub time_limit_seconds: f64,
    #[serde(default)]
    pub deadline: DeadlinePolicy,
    #[serde(default)]
    pub max_moves: Option<u32>,
    #[serde(default)]
    pub start_fen: Option<String>,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            games_per_pair: 2,
            time_limit_seconds: 1.0,
            deadline: DeadlinePolicy::default(),
            max_moves: None,
            start_fen: None,
        }
    }
}

impl TournamentConfig {
    /// Create round-robin config
    pub fn new(games_per_pair: u32, time_limit_seconds: f64) -> Self {
        Self {
            games_per_pair,
            time_limit_seconds,
            ..Default::default()
        }
    }

    pub fn with_deadline(mut self, deadline: DeadlinePolicy) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_max_moves(mut self, max_moves: u32) -> Self {
        self.max_moves = Some(max_moves);
        self
    }

    pub fn with_start_fen(mut self, fen: impl Into<String>) -> Self {
        self.start_fen = Some(fen.into());
        self
    }

    /// Check the scalar parameters and derive the per-game config
    pub fn match_config(&self) -> Result<MatchConfig, ConfigError> {
        if self.games_per_pair == 0 {
            return Err(ConfigError::ZeroGamesPerPair);
        }
        let time_limit = parse_time_limit(self.time_limit_seconds)?;

        let config = MatchConfig {
            time_limit,
            deadline: self.deadline,
            max_moves: self.max_moves,
            start_fen: self.start_fen.clone(),
        };
        config.start_position()?;
        Ok(config)
    }

    /// Check the participant list: at least two agents, all names distinct
    pub fn validate_roster<'a, I>(&self, names: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = HashSet::new();
        for name in names {
            if !seen.insert(name) {
                return Err(ConfigError::DuplicateAgentName(name.to_string()));
            }
        }
        if seen.len() < 2 {
            return Err(ConfigError::TooFewAgents { count: seen.len() });
        }
        Ok(())
    }
}

/// Convert seconds to a duration, rejecting zero, negative and non-finite values
fn parse_time_limit(seconds: f64) -> Result<Duration, ConfigError> {
    if !(seconds.is_finite() && seconds > 0.0) {
        return Err(ConfigError::InvalidTimeLimit(seconds));
    }
    match Duration::try_from_secs_f64(seconds) {
        Ok(limit) if !limit.is_zero() => Ok(limit),
        _ => Err(ConfigError::InvalidTimeLimit(seconds)),
    }
}
