//! Agent capability and baseline agents
//!
//! An agent chooses moves for whichever side it is playing. The tournament
//! never looks behind the trait, so any strategy (search, neural, remote
//! engine) plugs in the same way.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use cozy_chess::{Board, Move};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::error::AgentError;
use crate::result::GameResult;

// ============================================================================
// AGENT TRAIT
// ============================================================================

/// Trait that every competing agent implements
pub trait Agent: Send {
    /// Name used in result records; must be unique within a tournament
    fn name(&self) -> &str;

    /// Choose a move for the side to move on `board`
    ///
    /// Returning an error forfeits the game.
    fn choose_move(&mut self, board: &Board) -> Result<Move, AgentError>;

    /// Learn from historical games. Never called by the tournament itself.
    fn train(&mut self, games: &[GameResult]) -> Result<(), AgentError> {
        let _ = games;
        Ok(())
    }

    /// Reset per-game state before a new game starts
    fn new_game(&mut self) {}
}

// ============================================================================
// SHARED HANDLE
// ============================================================================

/// Shared, lockable handle to a boxed agent
///
/// The name is cached outside the lock so an agent stuck inside
/// `choose_move` can still be reported on.
#[derive(Clone)]
pub struct AgentHandle {
    name: Arc<str>,
    inner: Arc<Mutex<Box<dyn Agent>>>,
}

impl AgentHandle {
    pub fn new<A: Agent + 'static>(agent: A) -> Self {
        Self::from_boxed(Box::new(agent))
    }

    pub fn from_boxed(agent: Box<dyn Agent>) -> Self {
        Self {
            name: Arc::from(agent.name()),
            inner: Arc::new(Mutex::new(agent)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lock the agent, blocking until it is free
    ///
    /// A panic during an earlier call poisons the mutex; the agent is still
    /// handed out since every call starts from a fresh board.
    pub fn lock(&self) -> MutexGuard<'_, Box<dyn Agent>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Lock the agent if no other call currently holds it
    pub fn try_lock(&self) -> Option<MutexGuard<'_, Box<dyn Agent>>> {
        match self.inner.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    /// Forward historical games to the agent's training hook
    pub fn train(&self, games: &[GameResult]) -> Result<(), AgentError> {
        self.lock().train(games)
    }
}

impl fmt::Debug for AgentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentHandle").field("name", &self.name).finish()
    }
}

// ============================================================================
// BASELINE AGENTS
// ============================================================================

/// Plays a uniformly random legal move
pub struct RandomAgent {
    name: String,
    rng: ChaCha8Rng,
}

impl RandomAgent {
    pub fn new(name: impl Into<String>, seed: u64) -> Self {
        Self {
            name: name.into(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Agent for RandomAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose_move(&mut self, board: &Board) -> Result<Move, AgentError> {
        let mut moves = Vec::new();
        board.generate_moves(|piece_moves| {
            moves.extend(piece_moves);
            false
        });
        moves.choose(&mut self.rng).copied().ok_or(AgentError::NoLegalMoves)
    }
}

/// Replays a fixed list of moves, one per call
///
/// The list is not checked against the board; a move that does not fit the
/// position is rejected by the rules engine like any other illegal move.
pub struct ReplayAgent {
    name: String,
    moves: Vec<Move>,
    cursor: usize,
}

impl ReplayAgent {
    pub fn new(name: impl Into<String>, moves: Vec<Move>) -> Self {
        Self {
            name: name.into(),
            moves,
            cursor: 0,
        }
    }

    /// Parse a comma or whitespace separated list of moves in `cozy_chess`
    /// notation (`e2e4`, `e7e8q`; castling as king-takes-rook, `e1h1`)
    pub fn parse(name: impl Into<String>, line: &str) -> Result<Self, AgentError> {
        let moves = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<Move>()
                    .map_err(|_| AgentError::Failed(format!("cannot parse move '{}'", s)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(name, moves))
    }

    pub fn remaining(&self) -> usize {
        self.moves.len() - self.cursor
    }
}

impl Agent for ReplayAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose_move(&mut self, _board: &Board) -> Result<Move, AgentError> {
        let mv = self
            .moves
            .get(self.cursor)
            .copied()
            .ok_or(AgentError::ScriptExhausted { ply: self.cursor })?;
        self.cursor += 1;
        Ok(mv)
    }

    fn new_game(&mut self) {
        self.cursor = 0;
    }
}
