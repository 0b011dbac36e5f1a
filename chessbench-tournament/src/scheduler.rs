//! Round-robin scheduling - every pair plays every colour assignment
//!
//! Level 1 - Orchestration

use chessbench_core::{AgentHandle, ResultLog};

use crate::config::{ConfigError, TournamentConfig};
use crate::executor::MatchExecutor;

/// Receives progress updates while a tournament runs
pub trait ProgressObserver {
    /// Called with the number of completed games and the total scheduled
    fn on_progress(&mut self, completed: usize, total: usize);
}

/// Observer that ignores all updates
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _completed: usize, _total: usize) {}
}

impl<F: FnMut(usize, usize)> ProgressObserver for F {
    fn on_progress(&mut self, completed: usize, total: usize) {
        self(completed, total)
    }
}

/// One scheduled game, as indices into the agent list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pairing {
    pub white: usize,
    pub black: usize,
}

/// A round-robin tournament over a fixed set of agents
#[derive(Debug)]
pub struct Tournament {
    agents: Vec<AgentHandle>,
    config: TournamentConfig,
    executor: MatchExecutor,
    log: ResultLog,
}

impl Tournament {
    /// Validate the roster and configuration; no game is played here
    pub fn new(agents: Vec<AgentHandle>, config: TournamentConfig) -> Result<Self, ConfigError> {
        config.validate_roster(agents.iter().map(AgentHandle::name))?;
        let executor = MatchExecutor::new(config.match_config()?)?;
        Ok(Self {
            agents,
            config,
            executor,
            log: ResultLog::new(),
        })
    }

    pub fn config(&self) -> &TournamentConfig {
        &self.config
    }

    pub fn agent_names(&self) -> Vec<&str> {
        self.agents.iter().map(AgentHandle::name).collect()
    }

    /// Games in play order: each repetition of a pair plays (i, j) then (j, i)
    pub fn schedule(&self) -> Vec<Pairing> {
        let k = self.config.games_per_pair as usize;
        generate_round_robin_pairings(self.agents.len())
            .into_iter()
            .flat_map(|(i, j)| {
                std::iter::repeat([
                    Pairing { white: i, black: j },
                    Pairing { white: j, black: i },
                ])
                .take(k)
                .flatten()
            })
            .collect()
    }

    /// N·(N−1)·k
    pub fn total_games(&self) -> usize {
        let n = self.agents.len();
        n * n.saturating_sub(1) * self.config.games_per_pair as usize
    }

    /// Play the full schedule, appending every game to the result log
    pub fn run(&mut self, observer: &mut dyn ProgressObserver) -> &ResultLog {
        let total = self.total_games();
        tracing::info!(
            "Round robin: {} agents, {} games per pair, {} games total",
            self.agents.len(),
            self.config.games_per_pair,
            total
        );

        let mut completed = 0;
        for pair in self.schedule().chunks(2) {
            for pairing in pair {
                let white = &self.agents[pairing.white];
                let black = &self.agents[pairing.black];
                let result = self.executor.play(white, black);
                self.log.push(result);
                completed += 1;
            }
            observer.on_progress(completed, total);
            tracing::info!("Progress: {}/{} games", completed, total);
        }

        &self.log
    }

    /// Games recorded so far
    pub fn results(&self) -> &ResultLog {
        &self.log
    }

    pub fn into_results(self) -> ResultLog {
        self.log
    }
}

/// Build and run a tournament without progress reporting
pub fn run_round_robin(
    agents: Vec<AgentHandle>,
    config: TournamentConfig,
) -> Result<ResultLog, ConfigError> {
    let mut tournament = Tournament::new(agents, config)?;
    tournament.run(&mut NoProgress);
    Ok(tournament.into_results())
}

// ============================================================================
// Level 4 - Utilities
// ============================================================================

/// Every unordered pair (i, j) with i < j
fn generate_round_robin_pairings(n: usize) -> Vec<(usize, usize)> {
    let mut pairings = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            pairings.push((i, j));
        }
    }
    pairings
}
