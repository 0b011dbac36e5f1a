//! Rules-engine adapter over `cozy_chess`
//!
//! `cozy_chess` owns move generation and legality. This module adds what a
//! tournament needs on top of it: whose turn it is in our own terms, terminal
//! classification (including repetition, which needs game history), and FEN
//! serialization of the final position.

use std::fmt;

use cozy_chess::{BitBoard, Board, Color, Move, Piece};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Plies without a capture or pawn move that end the game (75-move rule)
const SEVENTY_FIVE_MOVE_PLIES: u32 = 150;

/// Occurrences of the same position that end the game automatically
const FIVEFOLD: usize = 5;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Side (colour) of a player
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => f.write_str("white"),
            Side::Black => f.write_str("black"),
        }
    }
}

/// Terminal classification of a position
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameStatus {
    Ongoing,
    /// Side to move is in check with no legal moves
    Checkmate,
    /// Side to move has no legal moves but is not in check
    Stalemate,
    InsufficientMaterial,
    /// 150 plies without a capture or pawn move
    SeventyFiveMoves,
    FivefoldRepetition,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        self != GameStatus::Ongoing
    }
}

/// A single game's legal state
///
/// Exclusively owned by whoever is running the game; agents only ever see
/// `&Board` through [`Position::board`].
#[derive(Clone, Debug)]
pub struct Position {
    board: Board,
    /// Hashes of positions since the last irreversible move, current included
    history: Vec<u64>,
    /// Plies since the last capture or pawn move. Tracked here because the
    /// board's own halfmove clock saturates at 100.
    reversible_plies: u32,
}

impl Position {
    /// Standard starting position
    pub fn new() -> Self {
        Self::from_board(Board::default())
    }

    /// Position from a FEN string
    pub fn from_fen(fen: &str) -> Result<Self, CoreError> {
        let board = Board::from_fen(fen.trim(), false).map_err(|e| CoreError::InvalidFen {
            fen: fen.to_string(),
            reason: format!("{:?}", e),
        })?;
        Ok(Self::from_board(board))
    }

    fn from_board(board: Board) -> Self {
        let history = vec![board.hash()];
        let reversible_plies = u32::from(board.halfmove_clock());
        Self {
            board,
            history,
            reversible_plies,
        }
    }

    /// Read-only view handed to agents
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> Side {
        self.board.side_to_move().into()
    }

    /// Classify the position
    pub fn status(&self) -> GameStatus {
        if !self.has_legal_move() {
            return if self.board.checkers().is_empty() {
                GameStatus::Stalemate
            } else {
                GameStatus::Checkmate
            };
        }
        if self.is_insufficient_material() {
            return GameStatus::InsufficientMaterial;
        }
        if self.reversible_plies >= SEVENTY_FIVE_MOVE_PLIES {
            return GameStatus::SeventyFiveMoves;
        }
        if self.repetitions() >= FIVEFOLD {
            return GameStatus::FivefoldRepetition;
        }
        GameStatus::Ongoing
    }

    /// Apply a move in place. Illegal moves leave the position untouched.
    pub fn apply(&mut self, mv: Move) -> Result<(), CoreError> {
        if self.board.try_play(mv).is_err() {
            return Err(CoreError::IllegalMove {
                mv: mv.to_string(),
                fen: self.fen(),
            });
        }

        // Positions before a capture or pawn move can never recur
        if self.board.halfmove_clock() == 0 {
            self.history.clear();
            self.reversible_plies = 0;
        } else {
            self.reversible_plies += 1;
        }
        self.history.push(self.board.hash());
        Ok(())
    }

    /// Canonical FEN serialization
    pub fn fen(&self) -> String {
        self.board.to_string()
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        self.board.generate_moves(|piece_moves| {
            moves.extend(piece_moves);
            false
        });
        moves
    }

    fn has_legal_move(&self) -> bool {
        // Returning true from the listener stops generation early
        self.board.generate_moves(|piece_moves| piece_moves.into_iter().next().is_some())
    }

    /// Neither side can ever deliver mate
    fn is_insufficient_material(&self) -> bool {
        self.side_cannot_mate(Color::White) && self.side_cannot_mate(Color::Black)
    }

    /// No pawns or major pieces, and either a bare king, a lone knight
    /// against king and queens, or bishops that all share one square colour
    /// with no knights or pawns on the board
    fn side_cannot_mate(&self, color: Color) -> bool {
        let board = &self.board;
        let ours = board.colors(color);
        let majors =
            board.pieces(Piece::Pawn) | board.pieces(Piece::Rook) | board.pieces(Piece::Queen);
        if !(ours & majors).is_empty() {
            return false;
        }

        let knights = board.pieces(Piece::Knight);
        if !(ours & knights).is_empty() {
            let theirs = board.colors(!color);
            let their_extras = theirs & !board.pieces(Piece::King) & !board.pieces(Piece::Queen);
            return ours.len() <= 2 && their_extras.is_empty();
        }

        let bishops = board.pieces(Piece::Bishop);
        if !(ours & bishops).is_empty() {
            let same_colour = (bishops & BitBoard::DARK_SQUARES).is_empty()
                || (bishops & BitBoard::LIGHT_SQUARES).is_empty();
            return same_colour && board.pieces(Piece::Pawn).is_empty() && knights.is_empty();
        }

        true
    }

    fn repetitions(&self) -> usize {
        let current = self.board.hash();
        self.history.iter().filter(|&&h| h == current).count()
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(uci: &str) -> Move {
        uci.parse().unwrap()
    }

    #[test]
    fn test_start_position() {
        let pos = Position::new();
        assert_eq!(pos.side_to_move(), Side::White);
        assert_eq!(pos.status(), GameStatus::Ongoing);
        assert_eq!(pos.legal_moves().len(), 20);
        assert_eq!(
            pos.fen(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
    }

    #[test]
    fn test_invalid_fen() {
        let err = Position::from_fen("not a fen").unwrap_err();
        assert!(matches!(err, CoreError::InvalidFen { .. }));
    }

    #[test]
    fn test_apply_and_turn() {
        let mut pos = Position::new();
        pos.apply(mv("e2e4")).unwrap();
        assert_eq!(pos.side_to_move(), Side::Black);
        pos.apply(mv("e7e5")).unwrap();
        assert_eq!(pos.side_to_move(), Side::White);
    }

    #[test]
    fn test_illegal_move_leaves_position() {
        let mut pos = Position::new();
        let before = pos.fen();
        let err = pos.apply(mv("e2e5")).unwrap_err();
        assert!(matches!(err, CoreError::IllegalMove { .. }));
        assert_eq!(pos.fen(), before);
    }

    #[test]
    fn test_fools_mate_is_checkmate() {
        let mut pos = Position::new();
        for uci in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            pos.apply(mv(uci)).unwrap();
        }
        assert_eq!(pos.status(), GameStatus::Checkmate);
        assert_eq!(pos.side_to_move(), Side::White);
    }

    #[test]
    fn test_stalemate() {
        let mut pos = Position::from_fen("7k/8/8/6Q1/8/8/8/K7 w - - 0 1").unwrap();
        assert_eq!(pos.status(), GameStatus::Ongoing);
        pos.apply(mv("g5g6")).unwrap();
        assert_eq!(pos.status(), GameStatus::Stalemate);
    }

    #[test]
    fn test_insufficient_material() {
        let bare = Position::from_fen("7k/8/8/8/8/8/8/K7 w - - 0 1").unwrap();
        assert_eq!(bare.status(), GameStatus::InsufficientMaterial);

        let knight = Position::from_fen("7k/8/8/8/8/8/8/KN6 w - - 0 1").unwrap();
        assert_eq!(knight.status(), GameStatus::InsufficientMaterial);

        let rook = Position::from_fen("7k/8/8/8/8/8/8/KR6 w - - 0 1").unwrap();
        assert_eq!(rook.status(), GameStatus::Ongoing);
    }

    #[test]
    fn test_insufficient_material_bishops() {
        // c1 and f8 are both dark squares
        let same = Position::from_fen("5b2/8/8/4k3/8/8/8/2B1K3 w - - 0 1").unwrap();
        assert_eq!(same.status(), GameStatus::InsufficientMaterial);

        let opposite = Position::from_fen("4b3/8/8/4k3/8/8/8/2B1K3 w - - 0 1").unwrap();
        assert_eq!(opposite.status(), GameStatus::Ongoing);

        let pair_same = Position::from_fen("4k3/8/8/8/8/8/8/B1B1K3 w - - 0 1").unwrap();
        assert_eq!(pair_same.status(), GameStatus::InsufficientMaterial);

        let pair_mixed = Position::from_fen("4k3/8/8/8/8/8/8/BB2K3 w - - 0 1").unwrap();
        assert_eq!(pair_mixed.status(), GameStatus::Ongoing);
    }

    #[test]
    fn test_knight_material() {
        let knight_vs_bishop = Position::from_fen("4k3/8/8/8/8/8/8/N2bK3 w - - 0 1").unwrap();
        assert_eq!(knight_vs_bishop.status(), GameStatus::Ongoing);

        let two_knights = Position::from_fen("4k3/8/8/8/8/8/8/NN2K3 w - - 0 1").unwrap();
        assert_eq!(two_knights.status(), GameStatus::Ongoing);

        let knight_vs_queen = Position::from_fen("3qk3/8/8/8/8/8/8/N3K3 w - - 0 1").unwrap();
        assert_eq!(knight_vs_queen.status(), GameStatus::Ongoing);
    }

    #[test]
    fn test_seventy_five_move_rule() {
        let mut pos = Position::from_fen("7k/8/8/8/8/8/8/KR6 w - - 99 120").unwrap();
        assert_eq!(pos.reversible_plies, 99);

        pos.reversible_plies = 149;
        assert_eq!(pos.status(), GameStatus::Ongoing);

        pos.apply(mv("b1b2")).unwrap();
        assert_eq!(pos.reversible_plies, 150);
        assert_eq!(pos.status(), GameStatus::SeventyFiveMoves);
    }

    #[test]
    fn test_pawn_move_resets_counters() {
        let mut pos = Position::new();
        pos.apply(mv("g1f3")).unwrap();
        assert_eq!(pos.reversible_plies, 1);
        pos.apply(mv("e7e5")).unwrap();
        assert_eq!(pos.reversible_plies, 0);
        assert_eq!(pos.history.len(), 1);
    }

    #[test]
    fn test_fivefold_repetition() {
        let mut pos = Position::new();
        let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];
        for _ in 0..3 {
            for uci in shuffle {
                pos.apply(mv(uci)).unwrap();
            }
        }
        // Start position seen four times
        assert_eq!(pos.status(), GameStatus::Ongoing);

        for uci in shuffle {
            pos.apply(mv(uci)).unwrap();
        }
        assert_eq!(pos.status(), GameStatus::FivefoldRepetition);
    }

    #[test]
    fn test_side_display_and_opponent() {
        assert_eq!(Side::White.to_string(), "white");
        assert_eq!(Side::Black.opponent(), Side::White);
    }
}
