//! Agents with scripted misbehaviour for unit tests

use std::thread;
use std::time::Duration;

use chessbench_core::{Agent, AgentError, Board, Move, Side};

/// Plays the first legal move, optionally sleeping first
pub struct FirstMoveAgent {
    pub name: String,
    pub delay: Duration,
}

impl FirstMoveAgent {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn slow(name: &str, delay: Duration) -> Self {
        Self {
            name: name.to_string(),
            delay,
        }
    }
}

impl Agent for FirstMoveAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose_move(&mut self, board: &Board) -> Result<Move, AgentError> {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        first_legal(board).ok_or(AgentError::NoLegalMoves)
    }
}

/// Plays the first legal move as white, errors as black
pub struct WhiteOnlyAgent {
    pub name: String,
}

impl Agent for WhiteOnlyAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose_move(&mut self, board: &Board) -> Result<Move, AgentError> {
        if Side::from(board.side_to_move()) == Side::Black {
            return Err(AgentError::Failed("refuses to play black".to_string()));
        }
        first_legal(board).ok_or(AgentError::NoLegalMoves)
    }
}

/// Always reports an error
pub struct FailingAgent {
    pub name: String,
}

impl Agent for FailingAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose_move(&mut self, _board: &Board) -> Result<Move, AgentError> {
        Err(AgentError::Failed("no move today".to_string()))
    }
}

/// Panics inside choose_move
pub struct PanickingAgent {
    pub name: String,
}

impl Agent for PanickingAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose_move(&mut self, _board: &Board) -> Result<Move, AgentError> {
        panic!("agent crashed");
    }
}

pub fn first_legal(board: &Board) -> Option<Move> {
    let mut first = None;
    board.generate_moves(|moves| {
        first = moves.into_iter().next();
        first.is_some()
    });
    first
}
