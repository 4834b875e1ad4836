//! Core safety agents
//!
//! Agents that are seated at every table unless explicitly disabled.
//! Unlike the enforcement pipeline, which rejects and rewrites, these
//! agents explain during the challenge phase why ungrounded language is
//! a problem, and vote against syntheses that overclaim.

mod citation;
mod fact_checker;

pub use citation::CitationAgent;
pub use fact_checker::FactCheckerAgent;

use roundtable_application::ports::agent::Agent;
use roundtable_application::ports::text_gen::TextGenBackend;
use std::sync::Arc;

/// The standard core roster: fact checking plus citation review
pub fn core_agents(backend: Option<Arc<dyn TextGenBackend>>) -> Vec<Arc<dyn Agent>> {
    vec![
        Arc::new(FactCheckerAgent::new(backend.clone())),
        Arc::new(CitationAgent::new(backend)),
    ]
}
