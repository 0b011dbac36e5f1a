//! Game records - one immutable result per game, collected in an append-only log

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::position::Side;

// ============================================================================
// OUTCOME TYPES
// ============================================================================

/// Winner of a completed game
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    White,
    Black,
    Draw,
}

impl Winner {
    /// A win for the given side
    pub fn side(side: Side) -> Self {
        match side {
            Side::White => Winner::White,
            Side::Black => Winner::Black,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Winner::White => "white",
            Winner::Black => "black",
            Winner::Draw => "draw",
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a game ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    SeventyFiveMoves,
    FivefoldRepetition,
    /// Configured move cap reached
    MoveLimit,
    /// Mover exceeded the per-move time limit
    Timeout,
    /// Mover proposed a move the rules engine rejected
    IllegalMove,
    /// Mover reported an error or panicked
    AgentFault,
}

impl Termination {
    /// True when the game was lost by forfeit rather than on the board
    pub fn is_forfeit(self) -> bool {
        matches!(
            self,
            Termination::Timeout | Termination::IllegalMove | Termination::AgentFault
        )
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Termination::Checkmate => "checkmate",
            Termination::Stalemate => "stalemate",
            Termination::InsufficientMaterial => "insufficient material",
            Termination::SeventyFiveMoves => "75-move rule",
            Termination::FivefoldRepetition => "fivefold repetition",
            Termination::MoveLimit => "move limit",
            Termination::Timeout => "timeout",
            Termination::IllegalMove => "illegal move",
            Termination::AgentFault => "agent fault",
        };
        f.write_str(s)
    }
}

// ============================================================================
// GAME RESULT
// ============================================================================

/// Record of one completed game
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub white_agent_name: String,
    pub black_agent_name: String,
    pub winner: Winner,
    /// Moves actually applied to the board (rejected or discarded moves excluded)
    pub move_count: u32,
    /// Accumulated decision time of white's accepted moves, in seconds
    pub time_white: f64,
    /// Accumulated decision time of black's accepted moves, in seconds
    pub time_black: f64,
    /// FEN of the position when the game ended
    pub final_position: String,
    pub termination: Termination,
}

impl GameResult {
    /// Column names of the row-oriented export, in [`GameResult::to_row`] order
    pub const COLUMNS: [&'static str; 7] = [
        "white_agent_name",
        "black_agent_name",
        "winner",
        "move_count",
        "time_white",
        "time_black",
        "final_position",
    ];

    pub fn to_row(&self) -> [String; 7] {
        [
            self.white_agent_name.clone(),
            self.black_agent_name.clone(),
            self.winner.to_string(),
            self.move_count.to_string(),
            format!("{:.6}", self.time_white),
            format!("{:.6}", self.time_black),
            self.final_position.clone(),
        ]
    }

    /// Name of the winning agent, if any
    pub fn winner_name(&self) -> Option<&str> {
        match self.winner {
            Winner::White => Some(&self.white_agent_name),
            Winner::Black => Some(&self.black_agent_name),
            Winner::Draw => None,
        }
    }

    /// Side to move in the final position, read from the FEN
    pub fn final_side_to_move(&self) -> Option<Side> {
        match self.final_position.split_whitespace().nth(1) {
            Some("w") => Some(Side::White),
            Some("b") => Some(Side::Black),
            _ => None,
        }
    }

    /// Accepted moves made by `side`
    ///
    /// The side not to move at the end made the last move, so it has the
    /// larger half of an odd move count.
    pub fn moves_by(&self, side: Side) -> Option<u32> {
        let last_mover = self.final_side_to_move()?.opponent();
        let n = self.move_count;
        Some(if side == last_mover { n - n / 2 } else { n / 2 })
    }
}

// ============================================================================
// RESULT LOG
// ============================================================================

/// Ordered, append-only log of game results
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultLog {
    games: Vec<GameResult>,
}

impl ResultLog {
    /// Column names of the row-oriented export
    pub const COLUMNS: [&'static str; 7] = GameResult::COLUMNS;

    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed game
    pub fn push(&mut self, result: GameResult) {
        self.games.push(result);
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&GameResult> {
        self.games.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GameResult> {
        self.games.iter()
    }

    pub fn as_slice(&self) -> &[GameResult] {
        &self.games
    }

    /// Row-oriented export, one row per game in log order
    pub fn rows(&self) -> Vec<[String; 7]> {
        self.games.iter().map(GameResult::to_row).collect()
    }

    /// Distinct agent names in order of first appearance (white before black)
    pub fn agent_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for game in &self.games {
            for name in [&game.white_agent_name, &game.black_agent_name] {
                if !names.iter().any(|n| n == name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }
}

impl<'a> IntoIterator for &'a ResultLog {
    type Item = &'a GameResult;
    type IntoIter = std::slice::Iter<'a, GameResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.games.iter()
    }
}

impl FromIterator<GameResult> for ResultLog {
    fn from_iter<I: IntoIterator<Item = GameResult>>(iter: I) -> Self {
        Self {
            games: iter.into_iter().collect(),
        }
    }
}
