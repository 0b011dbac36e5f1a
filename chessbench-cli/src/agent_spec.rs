//! Agent specifications on the command line
//!
//! Format: `[name=]kind[:arg]`
//! - `random` or `random:SEED` - uniform random mover
//! - `replay:e2e4,e7e5,...` - fixed move list

use std::str::FromStr;

use anyhow::{bail, Context, Result};
use chessbench_core::{AgentHandle, RandomAgent, ReplayAgent};

/// Kind of agent and its argument
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgentKind {
    Random { seed: Option<u64> },
    Replay { moves: String },
}

/// Parsed `--agent` value
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentSpec {
    pub name: Option<String>,
    pub kind: AgentKind,
}

impl FromStr for AgentSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, rest) = match s.split_once('=') {
            Some((name, rest)) => {
                let name = name.trim();
                if name.is_empty() {
                    bail!("empty agent name in '{}'", s);
                }
                (Some(name.to_string()), rest)
            }
            None => (None, s),
        };

        let (kind, arg) = match rest.split_once(':') {
            Some((kind, arg)) => (kind.trim(), Some(arg.trim())),
            None => (rest.trim(), None),
        };

        let kind = match (kind, arg) {
            ("random", None) => AgentKind::Random { seed: None },
            ("random", Some(seed)) => AgentKind::Random {
                seed: Some(
                    seed.parse()
                        .with_context(|| format!("invalid seed '{}' in '{}'", seed, s))?,
                ),
            },
            ("replay", Some(moves)) if !moves.is_empty() => AgentKind::Replay {
                moves: moves.to_string(),
            },
            ("replay", _) => bail!("replay agent needs a move list: replay:e2e4,e7e5"),
            (other, _) => bail!("unknown agent kind '{}' (expected random or replay)", other),
        };

        Ok(Self { name, kind })
    }
}

impl AgentSpec {
    /// Name used when none was given: kind plus 1-based position
    pub fn resolved_name(&self, index: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => {
                let kind = match self.kind {
                    AgentKind::Random { .. } => "random",
                    AgentKind::Replay { .. } => "replay",
                };
                format!("{}-{}", kind, index + 1)
            }
        }
    }

    /// Build the agent; unseeded random agents use `base_seed + index`
    pub fn build(&self, index: usize, base_seed: u64) -> Result<AgentHandle> {
        let name = self.resolved_name(index);
        let handle = match &self.kind {
            AgentKind::Random { seed } => {
                let seed = seed.unwrap_or_else(|| base_seed.wrapping_add(index as u64));
                tracing::debug!("Agent {}: random (seed {})", name, seed);
                AgentHandle::new(RandomAgent::new(name, seed))
            }
            AgentKind::Replay { moves } => {
                let agent = ReplayAgent::parse(name.clone(), moves)
                    .with_context(|| format!("invalid move list for agent '{}'", name))?;
                tracing::debug!("Agent {}: replay ({} moves)", name, agent.remaining());
                AgentHandle::new(agent)
            }
        };
        Ok(handle)
    }
}

/// Build every agent in order
pub fn build_agents(specs: &[AgentSpec], base_seed: u64) -> Result<Vec<AgentHandle>> {
    specs
        .iter()
        .enumerate()
        .map(|(i, spec)| spec.build(i, base_seed))
        .collect()
}
