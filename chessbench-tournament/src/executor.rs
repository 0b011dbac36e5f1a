//! Match executor - runs one time-boxed game between two agents
//!
//! Level 2 - Phase-level implementation
//!
//! Every way an agent can misbehave (too slow, error, panic, illegal move) is
//! absorbed here and shows up only as a forfeit in the returned record.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use chessbench_core::{
    AgentError, AgentHandle, Board, GameResult, GameStatus, Move, Position, Side, Termination,
    Winner,
};

use crate::config::{ConfigError, DeadlinePolicy, MatchConfig};

/// Answer to a single move request
enum Reply {
    Move(Move),
    Error(AgentError),
    Panicked,
    /// Deadline passed before the agent answered (enforced deadlines only)
    TimedOut,
}

/// Raw result of a `choose_move` call guarded by `catch_unwind`
type Guarded = thread::Result<Result<Move, AgentError>>;

/// Running decision-time totals per side
#[derive(Default)]
struct Clock {
    white: Duration,
    black: Duration,
}

impl Clock {
    fn add(&mut self, side: Side, elapsed: Duration) {
        match side {
            Side::White => self.white += elapsed,
            Side::Black => self.black += elapsed,
        }
    }
}

/// Plays single games under a fixed match configuration
#[derive(Clone, Debug)]
pub struct MatchExecutor {
    config: MatchConfig,
    /// Validated starting position, cloned for every game
    start: Position,
}

impl MatchExecutor {
    /// Create an executor, validating the time limit and start position
    pub fn new(config: MatchConfig) -> Result<Self, ConfigError> {
        let start = config.start_position()?;
        Ok(Self { config, start })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Play one game and return its record
    pub fn play(&self, white: &AgentHandle, black: &AgentHandle) -> GameResult {
        let mut position = self.start.clone();
        let mut clock = Clock::default();
        let mut move_count = 0u32;

        prepare_agent(white);
        prepare_agent(black);

        tracing::debug!("Starting game: {} (white) vs {} (black)", white.name(), black.name());

        let (winner, termination) = loop {
            if let Some(outcome) = terminal_outcome(position.status(), position.side_to_move()) {
                break outcome;
            }
            if self.config.max_moves.is_some_and(|cap| move_count >= cap) {
                break (Winner::Draw, Termination::MoveLimit);
            }

            let mover = position.side_to_move();
            let agent = match mover {
                Side::White => white,
                Side::Black => black,
            };

            let (reply, elapsed) = self.request_move(agent, position.board());
            let mv = match reply {
                Reply::Move(mv) if elapsed <= self.config.time_limit => mv,
                Reply::Move(_) | Reply::TimedOut => {
                    tracing::warn!(
                        "{} ({}) exceeded the time limit: {:.3}s > {:.3}s",
                        agent.name(),
                        mover,
                        elapsed.as_secs_f64(),
                        self.config.time_limit.as_secs_f64()
                    );
                    break forfeit(mover, Termination::Timeout);
                }
                Reply::Error(e) => {
                    tracing::warn!("{} ({}) failed to move: {}", agent.name(), mover, e);
                    break forfeit(mover, Termination::AgentFault);
                }
                Reply::Panicked => {
                    tracing::warn!("{} ({}) panicked while choosing a move", agent.name(), mover);
                    break forfeit(mover, Termination::AgentFault);
                }
            };

            if let Err(e) = position.apply(mv) {
                tracing::warn!("{} ({}) forfeits: {}", agent.name(), mover, e);
                break forfeit(mover, Termination::IllegalMove);
            }
            clock.add(mover, elapsed);
            move_count += 1;
        };

        tracing::debug!(
            "Game over: {} vs {} -> {} by {} after {} moves",
            white.name(),
            black.name(),
            winner,
            termination,
            move_count
        );

        GameResult {
            white_agent_name: white.name().to_string(),
            black_agent_name: black.name().to_string(),
            winner,
            move_count,
            time_white: clock.white.as_secs_f64(),
            time_black: clock.black.as_secs_f64(),
            final_position: position.fen(),
            termination,
        }
    }

    // ========================================================================
    // Level 3 - Steps
    // ========================================================================

    /// Ask an agent for a move, returning the reply and the decision time
    fn request_move(&self, agent: &AgentHandle, board: &Board) -> (Reply, Duration) {
        match self.config.deadline {
            DeadlinePolicy::Measured => request_measured(agent, board),
            DeadlinePolicy::Enforced => request_enforced(agent, board, self.config.time_limit),
        }
    }
}

/// Call the agent on this thread and time it after it returns
fn request_measured(agent: &AgentHandle, board: &Board) -> (Reply, Duration) {
    let mut guard = agent.lock();
    let started = Instant::now();
    let guarded = panic::catch_unwind(AssertUnwindSafe(|| guard.choose_move(board)));
    let elapsed = started.elapsed();
    (reply_from(guarded), elapsed)
}

/// Call the agent on a worker thread and stop waiting at the deadline
///
/// A call that misses the deadline keeps running detached and still holds
/// the agent's lock, so later requests to that agent time out as well.
fn request_enforced(agent: &AgentHandle, board: &Board, limit: Duration) -> (Reply, Duration) {
    let (tx, rx) = mpsc::channel::<(Guarded, Duration)>();
    let handle = agent.clone();
    let board = board.clone();
    let requested = Instant::now();

    let spawned = thread::Builder::new()
        // Thread names may not contain NUL
        .name(format!("agent-{}", agent.name().replace('\0', "")))
        .spawn(move || {
            let mut guard = handle.lock();
            let started = Instant::now();
            let guarded = panic::catch_unwind(AssertUnwindSafe(|| guard.choose_move(&board)));
            // Receiver is gone if the deadline already passed
            let _ = tx.send((guarded, started.elapsed()));
        });

    if let Err(e) = spawned {
        tracing::error!("Could not start move request for {}: {}", agent.name(), e);
        let reply = Reply::Error(AgentError::Failed(format!("move request not started: {}", e)));
        return (reply, requested.elapsed());
    }

    match rx.recv_timeout(limit) {
        Ok((guarded, elapsed)) => (reply_from(guarded), elapsed),
        Err(RecvTimeoutError::Timeout) => (Reply::TimedOut, requested.elapsed()),
        // Worker died without reporting
        Err(RecvTimeoutError::Disconnected) => (Reply::Panicked, requested.elapsed()),
    }
}

fn reply_from(guarded: Guarded) -> Reply {
    match guarded {
        Ok(Ok(mv)) => Reply::Move(mv),
        Ok(Err(e)) => Reply::Error(e),
        Err(_) => Reply::Panicked,
    }
}

/// Reset per-game agent state; skipped for an agent still stuck in an
/// abandoned move request
fn prepare_agent(agent: &AgentHandle) {
    match agent.try_lock() {
        Some(mut guard) => guard.new_game(),
        None => tracing::warn!("{} is still busy; starting game without reset", agent.name()),
    }
}

// ============================================================================
// Level 4 - Utilities
// ============================================================================

/// Outcome when `side` forfeits
fn forfeit(side: Side, termination: Termination) -> (Winner, Termination) {
    (Winner::side(side.opponent()), termination)
}

/// Winner and termination for a terminal position, None while play continues
///
/// Checkmate is declared on the side to move, so the other side wins. Every
/// other terminal classification is a draw.
fn terminal_outcome(status: GameStatus, side_to_move: Side) -> Option<(Winner, Termination)> {
    let outcome = match status {
        GameStatus::Ongoing => return None,
        GameStatus::Checkmate => (Winner::side(side_to_move.opponent()), Termination::Checkmate),
        GameStatus::Stalemate => (Winner::Draw, Termination::Stalemate),
        GameStatus::InsufficientMaterial => (Winner::Draw, Termination::InsufficientMaterial),
        GameStatus::SeventyFiveMoves => (Winner::Draw, Termination::SeventyFiveMoves),
        GameStatus::FivefoldRepetition => (Winner::Draw, Termination::FivefoldRepetition),
    };
    Some(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_agents::{FailingAgent, FirstMoveAgent, PanickingAgent};
    use chessbench_core::{RandomAgent, ReplayAgent};

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn replay(name: &str, line: &str) -> AgentHandle {
        AgentHandle::new(ReplayAgent::parse(name, line).unwrap())
    }

    fn executor(config: MatchConfig) -> MatchExecutor {
        MatchExecutor::new(config).unwrap()
    }

    fn both_policies() -> [DeadlinePolicy; 2] {
        [DeadlinePolicy::Measured, DeadlinePolicy::Enforced]
    }

    #[test]
    fn test_fools_mate_black_wins() {
        for policy in both_policies() {
            let exec = executor(MatchConfig::default().with_deadline(policy));
            let result = exec.play(&replay("w", "f2f3 g2g4"), &replay("b", "e7e5 d8h4"));

            assert_eq!(result.winner, Winner::Black);
            assert_eq!(result.termination, Termination::Checkmate);
            assert_eq!(result.move_count, 4);
            assert_eq!(result.white_agent_name, "w");
            assert_eq!(result.black_agent_name, "b");
            assert_eq!(result.final_side_to_move(), Some(Side::White));
        }
    }

    #[test]
    fn test_stalemate_is_draw() {
        let config = MatchConfig::default().with_start_fen("7k/8/8/6Q1/8/8/8/K7 w - - 0 1");
        let result = executor(config).play(&replay("w", "g5g6"), &replay("b", ""));

        assert_eq!(result.winner, Winner::Draw);
        assert_eq!(result.termination, Termination::Stalemate);
        assert_eq!(result.move_count, 1);
    }

    #[test]
    fn test_insufficient_material_is_draw() {
        let config = MatchConfig::default().with_start_fen("7k/8/8/8/8/8/8/Kr6 w - - 0 1");
        let result = executor(config).play(&replay("w", "a1b1"), &replay("b", ""));

        assert_eq!(result.winner, Winner::Draw);
        assert_eq!(result.termination, Termination::InsufficientMaterial);
        assert_eq!(result.move_count, 1);
    }

    #[test]
    fn test_fivefold_repetition_is_draw() {
        let white = replay("w", &["g1f3 f3g1"; 4].join(" "));
        let black = replay("b", &["g8f6 f6g8"; 4].join(" "));
        let result = executor(MatchConfig::default()).play(&white, &black);

        assert_eq!(result.winner, Winner::Draw);
        assert_eq!(result.termination, Termination::FivefoldRepetition);
        assert_eq!(result.move_count, 16);
        assert_eq!(result.final_position, START_FEN.replace(" 0 1", " 16 9"));
    }

    #[test]
    fn test_move_limit_is_draw() {
        let config = MatchConfig::default().with_max_moves(4);
        let white = replay("w", "g1f3 f3g1 g1f3");
        let black = replay("b", "g8f6 f6g8 g8f6");
        let result = executor(config).play(&white, &black);

        assert_eq!(result.winner, Winner::Draw);
        assert_eq!(result.termination, Termination::MoveLimit);
        assert_eq!(result.move_count, 4);
    }

    #[test]
    fn test_error_on_first_black_move() {
        for policy in both_policies() {
            let exec = executor(MatchConfig::default().with_deadline(policy));
            let black = AgentHandle::new(FailingAgent { name: "b".to_string() });
            let result = exec.play(&replay("w", "e2e4"), &black);

            assert_eq!(result.winner, Winner::White);
            assert_eq!(result.termination, Termination::AgentFault);
            assert_eq!(result.move_count, 1);
            assert_eq!(result.time_black, 0.0);
            // Position after white's only move, black still to move
            assert_eq!(result.final_side_to_move(), Some(Side::Black));
        }
    }

    #[test]
    fn test_error_on_first_white_move() {
        let white = AgentHandle::new(FailingAgent { name: "w".to_string() });
        let result = executor(MatchConfig::default()).play(&white, &replay("b", "e7e5"));

        assert_eq!(result.winner, Winner::Black);
        assert_eq!(result.move_count, 0);
        assert_eq!(result.final_position, START_FEN);
    }

    #[test]
    fn test_illegal_move_forfeits() {
        for policy in both_policies() {
            let exec = executor(MatchConfig::default().with_deadline(policy));
            let result = exec.play(&replay("w", "e2e4 e4e6"), &replay("b", "e7e5"));

            assert_eq!(result.winner, Winner::Black);
            assert_eq!(result.termination, Termination::IllegalMove);
            // The rejected move is not counted
            assert_eq!(result.move_count, 2);
        }
    }

    #[test]
    fn test_exhausted_script_forfeits() {
        let result = executor(MatchConfig::default()).play(&replay("w", "e2e4"), &replay("b", "e7e5"));
        assert_eq!(result.winner, Winner::Black);
        assert_eq!(result.termination, Termination::AgentFault);
        assert_eq!(result.move_count, 2);
    }

    #[test]
    fn test_panicking_agent_forfeits() {
        for policy in both_policies() {
            let exec = executor(MatchConfig::default().with_deadline(policy));
            let white = AgentHandle::new(PanickingAgent { name: "w".to_string() });
            let black = replay("b", "");
            let result = exec.play(&white, &black);

            assert_eq!(result.winner, Winner::Black);
            assert_eq!(result.termination, Termination::AgentFault);
            assert_eq!(result.move_count, 0);

            // The agent stays usable after the panic
            let again = exec.play(&white, &black);
            assert_eq!(again.termination, Termination::AgentFault);
        }
    }

    #[test]
    fn test_nul_in_agent_name_still_plays() {
        for policy in both_policies() {
            let exec = executor(MatchConfig::default().with_deadline(policy));
            let white = replay("bad\0name", "f2f3 g2g4");
            let black = replay("b", "e7e5 d8h4");
            let result = exec.play(&white, &black);

            assert_eq!(result.white_agent_name, "bad\0name");
            assert_eq!(result.winner, Winner::Black);
            assert_eq!(result.termination, Termination::Checkmate);
        }
    }

    #[test]
    fn test_timeout_measured() {
        let config = MatchConfig::new(Duration::from_millis(20))
            .with_deadline(DeadlinePolicy::Measured);
        let black = AgentHandle::new(FirstMoveAgent::slow("b", Duration::from_millis(80)));
        let result = executor(config).play(&replay("w", "e2e4"), &black);

        assert_eq!(result.winner, Winner::White);
        assert_eq!(result.termination, Termination::Timeout);
        assert_eq!(result.move_count, 1);
        assert_eq!(result.time_black, 0.0);
    }

    #[test]
    fn test_timeout_enforced_does_not_wait() {
        let config = MatchConfig::new(Duration::from_millis(50))
            .with_deadline(DeadlinePolicy::Enforced);
        let black = AgentHandle::new(FirstMoveAgent::slow("b", Duration::from_secs(5)));

        let started = Instant::now();
        let result = executor(config).play(&replay("w", "d2d4"), &black);

        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(result.winner, Winner::White);
        assert_eq!(result.termination, Termination::Timeout);
        assert_eq!(result.move_count, 1);
    }

    #[test]
    fn test_hung_agent_keeps_forfeiting() {
        let config = MatchConfig::new(Duration::from_millis(30))
            .with_deadline(DeadlinePolicy::Enforced);
        let exec = executor(config);
        let slow = AgentHandle::new(FirstMoveAgent::slow("slow", Duration::from_secs(5)));
        let quick = replay("quick", "e2e4");

        let started = Instant::now();
        let first = exec.play(&slow, &quick);
        let second = exec.play(&slow, &quick);

        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(first.termination, Termination::Timeout);
        assert_eq!(second.termination, Termination::Timeout);
        assert_eq!(second.winner, Winner::Black);
    }

    #[test]
    fn test_time_accumulates_for_accepted_moves() {
        let config = MatchConfig::new(Duration::from_secs(2)).with_max_moves(4);
        let white = AgentHandle::new(FirstMoveAgent::slow("w", Duration::from_millis(10)));
        let black = AgentHandle::new(FirstMoveAgent::new("b"));
        let result = executor(config).play(&white, &black);

        assert_eq!(result.move_count, 4);
        assert!(result.time_white >= 0.02);
        assert!(result.time_black >= 0.0);
        assert!(result.time_black < result.time_white);
    }

    #[test]
    fn test_random_self_play_completes() {
        let config = MatchConfig::new(Duration::from_secs(1)).with_max_moves(300);
        let white = AgentHandle::new(RandomAgent::new("r1", 1));
        let black = AgentHandle::new(RandomAgent::new("r2", 2));
        let result = executor(config).play(&white, &black);

        assert!(result.move_count <= 300);
        assert!(!result.termination.is_forfeit());
        assert!(!result.final_position.is_empty());
    }

    #[test]
    fn test_replay_agents_reset_between_games() {
        let exec = executor(MatchConfig::default());
        let white = replay("w", "f2f3 g2g4");
        let black = replay("b", "e7e5 d8h4");

        let first = exec.play(&white, &black);
        let second = exec.play(&white, &black);
        assert_eq!(second.winner, first.winner);
        assert_eq!(second.move_count, first.move_count);
        assert_eq!(second.final_position, first.final_position);
    }

    #[test]
    fn test_zero_time_limit_rejected() {
        let err = MatchExecutor::new(MatchConfig::new(Duration::ZERO)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeLimit(_)));
    }

    #[test]
    fn test_terminal_outcome_mapping() {
        assert_eq!(terminal_outcome(GameStatus::Ongoing, Side::White), None);
        assert_eq!(
            terminal_outcome(GameStatus::Checkmate, Side::White),
            Some((Winner::Black, Termination::Checkmate))
        );
        assert_eq!(
            terminal_outcome(GameStatus::Checkmate, Side::Black),
            Some((Winner::White, Termination::Checkmate))
        );
        assert_eq!(
            terminal_outcome(GameStatus::SeventyFiveMoves, Side::Black),
            Some((Winner::Draw, Termination::SeventyFiveMoves))
        );
    }
}
