//! Per-game options shared by the `tournament` and `play` commands

use clap::{Args, ValueEnum};

use chessbench_tournament::{DeadlinePolicy, TournamentConfig};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DeadlineArg {
    /// Stop waiting for a move at the deadline
    Enforced,
    /// Time each move after it returns
    Measured,
}

impl From<DeadlineArg> for DeadlinePolicy {
    fn from(arg: DeadlineArg) -> Self {
        match arg {
            DeadlineArg::Enforced => DeadlinePolicy::Enforced,
            DeadlineArg::Measured => DeadlinePolicy::Measured,
        }
    }
}

#[derive(Args, Clone, Debug)]
pub struct GameArgs {
    /// Per-move time limit in seconds
    #[arg(long, default_value = "1.0", value_name = "SECS")]
    pub time_limit: f64,

    /// How the time limit is enforced
    #[arg(long, value_enum, default_value = "enforced")]
    pub deadline: DeadlineArg,

    /// End games as a draw after this many moves
    #[arg(long, value_name = "N")]
    pub max_moves: Option<u32>,

    /// Starting position as FEN (default: standard start)
    #[arg(long, value_name = "FEN")]
    pub start_fen: Option<String>,
}

impl GameArgs {
    /// Tournament configuration with these per-game options
    pub fn tournament_config(&self, games_per_pair: u32) -> TournamentConfig {
        let mut config = TournamentConfig::new(games_per_pair, self.time_limit)
            .with_deadline(self.deadline.into());
        if let Some(max_moves) = self.max_moves {
            config = config.with_max_moves(max_moves);
        }
        if let Some(fen) = &self.start_fen {
            config = config.with_start_fen(fen.clone());
        }
        config
    }
}
