//! chessbench tournament - time-boxed games, round robins and statistics
//!
//! This crate provides the tournament engine:
//! - Match execution between two agents under a per-move time limit
//! - Colour-balanced round-robin scheduling into an ordered result log
//! - Aggregation of the log into win-rate and game-length tables
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: Tournament::run (orchestration)
//! - Level 2: MatchExecutor::play, MetricsAggregator (phases)
//! - Level 3: move requests, terminal classification (steps)
//! - Level 4: configuration and validation

mod config;
mod executor;
mod metrics;
mod scheduler;

#[cfg(test)]
mod test_agents;

pub use config::{ConfigError, DeadlinePolicy, MatchConfig, TournamentConfig};
pub use executor::MatchExecutor;
pub use metrics::{
    AgentStats, ColorRecord, GameLengthStats, MetricsAggregator, PairRecord, ThinkTime,
};
pub use scheduler::{run_round_robin, NoProgress, Pairing, ProgressObserver, Tournament};
