//! Application configuration
//!
//! Tunables for deliberation rounds, evidence enforcement, routing, and
//! chat. Defaults match unattended operation; the infrastructure config
//! loader overrides them from files and environment.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a deliberation round
#[derive(Debug, Clone)]
pub struct DeliberationConfig {
    /// Skip the strategy phase when false
    pub enable_strategy_phase: bool,
    /// Skip the challenge phase when false
    pub enable_challenge_phase: bool,
    /// Fraction of votes that must approve for consensus
    pub consensus_threshold: f64,
    /// Per-agent deadline for a single phase call
    pub agent_timeout: Duration,
    /// Where phase artifacts are written
    pub artifacts_dir: PathBuf,
    pub write_artifacts: bool,
}

impl Default for DeliberationConfig {
    fn default() -> Self {
        Self {
            enable_strategy_phase: true,
            enable_challenge_phase: true,
            consensus_threshold: 0.7,
            agent_timeout: Duration::from_secs(120),
            artifacts_dir: PathBuf::from(".roundtable/artifacts"),
            write_artifacts: true,
        }
    }
}

impl DeliberationConfig {
    pub fn without_strategy(mut self) -> Self {
        self.enable_strategy_phase = false;
        self
    }

    pub fn without_challenge(mut self) -> Self {
        self.enable_challenge_phase = false;
        self
    }

    pub fn with_consensus_threshold(mut self, threshold: f64) -> Self {
        self.consensus_threshold = threshold;
        self
    }
}

/// Configuration for the evidence enforcement pipeline
#[derive(Debug, Clone)]
pub struct EnforcementConfig {
    /// Rewrite attempts before a rejected response passes with warnings
    pub max_retries: u32,
    /// Critical violations at or above this count reject the response
    pub rejection_threshold: usize,
}

impl Default for EnforcementConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            rejection_threshold: 3,
        }
    }
}

/// Configuration for agent routing
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub max_agents: usize,
    pub min_agents: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_agents: 3,
            min_agents: 1,
        }
    }
}

/// Configuration for the chat orchestrator
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Specialists consulted per message
    pub max_agents: usize,
    pub enable_cross_check: bool,
    /// Agreement below this suggests escalating to a full round
    pub escalation_threshold: f64,
    /// Turns kept per session before the oldest are evicted
    pub max_history_turns: usize,
    /// Sessions kept before the oldest-created is evicted
    pub max_sessions: usize,
    pub max_message_length: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_agents: 3,
            enable_cross_check: true,
            escalation_threshold: 0.4,
            max_history_turns: 20,
            max_sessions: 64,
            max_message_length: 100_000,
        }
    }
}
