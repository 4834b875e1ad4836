//! Configuration
//!
//! Raw TOML structure plus the multi-source loader.

mod file_config;
mod loader;

pub use file_config::{
    FileBackendConfig, FileChatConfig, FileConfig, FileDeliberationConfig,
    FileEnforcementConfig, FileRegistryConfig, FileRouterConfig,
};
pub use loader::ConfigLoader;
