//! Error types for the rules adapter and agents

/// Errors raised by the rules-engine adapter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("illegal move {mv} in position {fen}")]
    IllegalMove { mv: String, fen: String },
}

/// Errors an agent may report instead of producing a move
///
/// Any of these is treated as a forfeit by the match executor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    #[error("no legal moves available")]
    NoLegalMoves,

    #[error("move list exhausted at ply {ply}")]
    ScriptExhausted { ply: usize },

    #[error("{0}")]
    Failed(String),
}
