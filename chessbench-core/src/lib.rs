//! chessbench core - agents, rules adapter and game records
//!
//! This crate provides the pieces every other crate builds on:
//! - The `Agent` capability and its shared handle
//! - A rules-engine adapter over `cozy_chess` (terminal classification, FEN)
//! - Immutable per-game records and the append-only result log
//! - Baseline agents (uniform random, move-list replay)

pub mod agent;
pub mod error;
pub mod position;
pub mod result;

// Re-exports for convenient access
pub use agent::{Agent, AgentHandle, RandomAgent, ReplayAgent};
pub use error::{AgentError, CoreError};
pub use position::{GameStatus, Position, Side};
pub use result::{GameResult, ResultLog, Termination, Winner};

pub use cozy_chess::{Board, Move};
