//! Agent port
//!
//! Defines the interface any specialist must implement to take a seat at
//! the table. Adapters (remote HTTP agents, backend-driven core agents)
//! live in the infrastructure layer.

use async_trait::async_trait;
use roundtable_domain::{Analysis, Challenge, Synthesis, Task, Vote};
use thiserror::Error;

/// Errors an agent can surface during a phase call
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Agent returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("Agent timed out")]
    Timeout,

    #[error("Agent is unhealthy: {0}")]
    Unhealthy(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// A specialist participating in deliberation rounds.
///
/// Each phase call is independent; implementations must not assume the
/// coordinator calls them in any particular order or at all.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Stable identifier, unique within a roster
    fn name(&self) -> &str;

    /// Human-readable description of the agent's expertise
    fn domain(&self) -> &str;

    /// Phase 1: analyze the task independently
    async fn analyze(&self, task: &Task) -> Result<Analysis, AgentError>;

    /// Phase 2: challenge the other analyses
    async fn challenge(
        &self,
        task: &Task,
        others: &[Analysis],
    ) -> Result<Challenge, AgentError>;

    /// Phase 3: vote on the synthesis
    async fn vote(&self, task: &Task, synthesis: &Synthesis) -> Result<Vote, AgentError>;
}
