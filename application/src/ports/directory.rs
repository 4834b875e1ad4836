//! Agent directory port
//!
//! Lookup interface over the registered roster. The registry adapter in
//! the infrastructure layer implements it; the router and chat
//! orchestrator consume it.

use super::agent::Agent;
use std::sync::Arc;

/// How an agent is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// In-process, backend-driven
    Local,
    /// Remote HTTP endpoint
    Remote,
}

/// A registered agent plus its routing metadata
#[derive(Clone)]
pub struct AgentProfile {
    pub agent: Arc<dyn Agent>,
    pub transport: Transport,
    /// Capability tags matched against queries during routing
    pub capabilities: Vec<String>,
    /// Result of the last health check; unhealthy agents are skipped
    pub healthy: bool,
}

impl AgentProfile {
    pub fn local(agent: Arc<dyn Agent>) -> Self {
        Self {
            agent,
            transport: Transport::Local,
            capabilities: Vec::new(),
            healthy: true,
        }
    }

    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.capabilities = capabilities;
        self
    }
}

/// Read access to the registered roster
pub trait AgentDirectory: Send + Sync {
    /// All registered agents with their metadata
    fn profiles(&self) -> Vec<AgentProfile>;

    /// Look up one agent by name
    fn get(&self, name: &str) -> Option<AgentProfile>;

    /// Number of registered agents
    fn count(&self) -> usize;
}
