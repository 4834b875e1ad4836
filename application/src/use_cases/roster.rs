//! Roster assembly
//!
//! Core safety agents (fact checking, citation review) always take a
//! seat; project specialists join them. Duplicate names keep the first
//! occurrence so a specialist cannot shadow a core agent.

use crate::ports::agent::Agent;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Combine core agents and specialists into a deduplicated roster
pub fn assemble_roster(
    core: Vec<Arc<dyn Agent>>,
    specialists: Vec<Arc<dyn Agent>>,
) -> Vec<Arc<dyn Agent>> {
    let mut seen = HashSet::new();
    let mut roster = Vec::with_capacity(core.len() + specialists.len());

    for agent in core.into_iter().chain(specialists) {
        if seen.insert(agent.name().to_string()) {
            roster.push(agent);
        } else {
            debug!(agent = agent.name(), "duplicate agent name, keeping first");
        }
    }
    roster
}
