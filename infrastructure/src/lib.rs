//! Infrastructure layer for roundtable
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: the remote HTTP agent transport, the persistent
//! agent registry, the JSON artifact store, the OpenAI-compatible text
//! generation backend, the core safety agents, and configuration loading.

pub mod agents;
pub mod artifacts;
pub mod backend;
pub mod config;
pub mod registry;
pub mod remote;
pub mod sanitize;

// Re-export commonly used types
pub use agents::{CitationAgent, FactCheckerAgent, core_agents};
pub use artifacts::JsonArtifactStore;
pub use backend::OpenAiBackend;
pub use config::{ConfigLoader, FileBackendConfig, FileConfig};
pub use registry::{AgentInfo, AgentRegistry, RegistryError};
pub use remote::{RemoteAgent, RemoteAgentSpec};
pub use sanitize::{detect_injection, sanitize_text, wrap_user_content};
