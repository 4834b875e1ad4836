//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the config file and
//! convert into the application-layer configs.

use roundtable_application::{ChatConfig, DeliberationConfig, EnforcementConfig, RouterConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub deliberation: FileDeliberationConfig,
    pub enforcement: FileEnforcementConfig,
    pub router: FileRouterConfig,
    pub chat: FileChatConfig,
    pub registry: FileRegistryConfig,
    pub backend: FileBackendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDeliberationConfig {
    pub enable_strategy_phase: bool,
    pub enable_challenge_phase: bool,
    pub consensus_threshold: f64,
    /// Per-agent deadline for one phase call, in seconds
    pub agent_timeout_seconds: u64,
    pub artifacts_dir: PathBuf,
    pub write_artifacts: bool,
}

impl Default for FileDeliberationConfig {
    fn default() -> Self {
        let defaults = DeliberationConfig::default();
        Self {
            enable_strategy_phase: defaults.enable_strategy_phase,
            enable_challenge_phase: defaults.enable_challenge_phase,
            consensus_threshold: defaults.consensus_threshold,
            agent_timeout_seconds: defaults.agent_timeout.as_secs(),
            artifacts_dir: defaults.artifacts_dir,
            write_artifacts: defaults.write_artifacts,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEnforcementConfig {
    pub max_retries: u32,
    pub rejection_threshold: usize,
    /// Disable the whole pipeline (speculation passes through)
    pub enabled: bool,
}

impl Default for FileEnforcementConfig {
    fn default() -> Self {
        let defaults = EnforcementConfig::default();
        Self {
            max_retries: defaults.max_retries,
            rejection_threshold: defaults.rejection_threshold,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRouterConfig {
    pub max_agents: usize,
    pub min_agents: usize,
}

impl Default for FileRouterConfig {
    fn default() -> Self {
        let defaults = RouterConfig::default();
        Self {
            max_agents: defaults.max_agents,
            min_agents: defaults.min_agents,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileChatConfig {
    pub max_agents: usize,
    pub enable_cross_check: bool,
    pub escalation_threshold: f64,
    pub max_history_turns: usize,
    pub max_sessions: usize,
    pub max_message_length: usize,
}

impl Default for FileChatConfig {
    fn default() -> Self {
        let defaults = ChatConfig::default();
        Self {
            max_agents: defaults.max_agents,
            enable_cross_check: defaults.enable_cross_check,
            escalation_threshold: defaults.escalation_threshold,
            max_history_turns: defaults.max_history_turns,
            max_sessions: defaults.max_sessions,
            max_message_length: defaults.max_message_length,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRegistryConfig {
    /// Where remote agent registrations are persisted
    pub persist_path: PathBuf,
    /// Seat the core safety agents at every table
    pub include_core_agents: bool,
}

impl Default for FileRegistryConfig {
    fn default() -> Self {
        Self {
            persist_path: PathBuf::from(crate::registry::DEFAULT_PERSIST_PATH),
            include_core_agents: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    /// OpenAI-compatible chat completions endpoint
    pub base_url: String,
    /// Model identifier sent with each request
    pub model: String,
    /// Bearer token; the `ROUNDTABLE_API_KEY` env var takes priority
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            model: String::new(),
            api_key: None,
            max_tokens: 4096,
            timeout_seconds: 300,
        }
    }
}

impl FileBackendConfig {
    /// A backend is only usable once a model has been configured
    pub fn is_configured(&self) -> bool {
        !self.model.is_empty()
    }
}

impl FileConfig {
    pub fn to_deliberation_config(&self) -> DeliberationConfig {
        DeliberationConfig {
            enable_strategy_phase: self.deliberation.enable_strategy_phase,
            enable_challenge_phase: self.deliberation.enable_challenge_phase,
            consensus_threshold: self.deliberation.consensus_threshold,
            agent_timeout: Duration::from_secs(self.deliberation.agent_timeout_seconds),
            artifacts_dir: self.deliberation.artifacts_dir.clone(),
            write_artifacts: self.deliberation.write_artifacts,
        }
    }

    pub fn to_enforcement_config(&self) -> EnforcementConfig {
        EnforcementConfig {
            max_retries: self.enforcement.max_retries,
            rejection_threshold: self.enforcement.rejection_threshold,
        }
    }

    pub fn to_router_config(&self) -> RouterConfig {
        RouterConfig {
            max_agents: self.router.max_agents,
            min_agents: self.router.min_agents,
        }
    }

    pub fn to_chat_config(&self) -> ChatConfig {
        ChatConfig {
            max_agents: self.chat.max_agents,
            enable_cross_check: self.chat.enable_cross_check,
            escalation_threshold: self.chat.escalation_threshold,
            max_history_turns: self.chat.max_history_turns,
            max_sessions: self.chat.max_sessions,
            max_message_length: self.chat.max_message_length,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_application_layer() {
        let config = FileConfig::default();
        assert_eq!(config.deliberation.consensus_threshold, 0.7);
        assert_eq!(config.enforcement.rejection_threshold, 3);
        assert_eq!(config.chat.escalation_threshold, 0.4);
        assert!(config.registry.include_core_agents);
    }

    #[test]
    fn test_partial_toml_fills_in_defaults() {
        let config: FileConfig = toml::from_str(
            r#"
            [deliberation]
            consensus_threshold = 0.9

            [enforcement]
            max_retries = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.deliberation.consensus_threshold, 0.9);
        assert!(config.deliberation.enable_challenge_phase);
        assert_eq!(config.enforcement.max_retries, 1);
        assert_eq!(config.router.max_agents, 3);
    }

    #[test]
    fn test_timeout_converts_to_duration() {
        let mut config = FileConfig::default();
        config.deliberation.agent_timeout_seconds = 30;
        assert_eq!(
            config.to_deliberation_config().agent_timeout,
            Duration::from_secs(30)
        );
    }
}
