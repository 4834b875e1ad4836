//! Application layer for roundtable
//!
//! This crate contains use cases, port definitions, and application
//! configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ChatConfig, DeliberationConfig, EnforcementConfig, RouterConfig};
pub use ports::{
    agent::{Agent, AgentError},
    artifact_store::{ArtifactStore, NoArtifacts},
    directory::{AgentDirectory, AgentProfile, Transport},
    progress::{DeliberationProgress, NoProgress},
    text_gen::{BackendError, Generation, TextGenBackend, TokenUsage},
};
pub use use_cases::enforce_evidence::EvidenceEnforcementPipeline;
pub use use_cases::roster::assemble_roster;
pub use use_cases::route_agents::{AgentRouter, RoutingDecision};
pub use use_cases::run_chat::{
    ChatOrchestrator, ChatResponse, ConsultationResult, CrossCheck,
};
pub use use_cases::run_deliberation::{RunDeliberationError, RunDeliberationUseCase};
