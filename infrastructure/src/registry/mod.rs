//! Agent registry
//!
//! Tracks local and remote agents, performs health checks, and feeds the
//! roster to the coordinator. Remote registrations persist to JSON so
//! they survive restarts; local agents are in-process objects and must
//! be re-registered on startup.

use crate::remote::{RemoteAgent, RemoteAgentSpec};
use roundtable_application::ports::agent::Agent;
use roundtable_application::ports::directory::{AgentDirectory, AgentProfile, Transport};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_PERSIST_PATH: &str = ".roundtable/agents.json";

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to persist registry: {0}")]
    Persist(#[from] std::io::Error),

    #[error("Failed to encode registry: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize, Default)]
struct PersistedRegistry {
    #[serde(default)]
    remote_agents: Vec<RemoteAgentSpec>,
}

struct Entry {
    agent: Arc<dyn Agent>,
    transport: Transport,
    capabilities: Vec<String>,
    healthy: bool,
    /// Concrete handle kept for health checks and persistence
    remote: Option<Arc<RemoteAgent>>,
}

/// Serializable agent description for status output
#[derive(Debug, Clone, Serialize)]
pub struct AgentInfo {
    pub name: String,
    pub domain: String,
    pub transport: String,
    pub capabilities: Vec<String>,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction_count: Option<u64>,
}

/// Local and remote agent registration with health checking
pub struct AgentRegistry {
    entries: Mutex<HashMap<String, Entry>>,
    persist_path: PathBuf,
}

impl AgentRegistry {
    /// Open a registry, loading any persisted remote registrations
    pub fn new(persist_path: impl Into<PathBuf>) -> Self {
        let registry = Self {
            entries: Mutex::new(HashMap::new()),
            persist_path: persist_path.into(),
        };
        registry.load_remote_agents();
        registry
    }

    fn load_remote_agents(&self) {
        if !self.persist_path.exists() {
            return;
        }
        let persisted: PersistedRegistry = match fs::read_to_string(&self.persist_path)
            .map_err(RegistryError::from)
            .and_then(|raw| serde_json::from_str(&raw).map_err(RegistryError::from))
        {
            Ok(p) => p,
            Err(e) => {
                warn!(path = %self.persist_path.display(), error = %e, "failed to load agents");
                return;
            }
        };

        let mut entries = self.entries.lock().expect("registry lock");
        let count = persisted.remote_agents.len();
        for spec in persisted.remote_agents {
            let capabilities = spec.capabilities.clone();
            let name = spec.name.clone();
            let agent = Arc::new(RemoteAgent::new(spec));
            entries.insert(
                name,
                Entry {
                    agent: agent.clone(),
                    transport: Transport::Remote,
                    capabilities,
                    healthy: true,
                    remote: Some(agent),
                },
            );
        }
        info!(
            count,
            path = %self.persist_path.display(),
            "loaded remote agents"
        );
    }

    fn save_remote_agents(&self, entries: &HashMap<String, Entry>) -> Result<(), RegistryError> {
        let remote_agents = entries
            .values()
            .filter_map(|entry| {
                entry.remote.as_ref().map(|remote| {
                    let mut spec = remote.spec().clone();
                    spec.capabilities = entry.capabilities.clone();
                    spec
                })
            })
            .collect::<Vec<_>>();

        if let Some(parent) = self.persist_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(&PersistedRegistry { remote_agents })?;
        // Staged write; the rename is atomic on the same filesystem, so
        // a reader never sees a partially written roster.
        let staging = self.persist_path.with_extension("json.tmp");
        fs::write(&staging, payload)?;
        fs::rename(&staging, &self.persist_path)?;
        debug!(path = %self.persist_path.display(), "saved remote agents");
        Ok(())
    }

    /// Register an in-process agent. Replaces any existing registration
    /// with the same name.
    pub fn register_local(&self, agent: Arc<dyn Agent>, capabilities: Vec<String>) {
        let name = agent.name().to_string();
        let mut entries = self.entries.lock().expect("registry lock");
        if entries.contains_key(&name) {
            warn!(agent = %name, "replacing existing agent");
        }
        entries.insert(
            name.clone(),
            Entry {
                agent,
                transport: Transport::Local,
                capabilities,
                healthy: true,
                remote: None,
            },
        );
        info!(agent = %name, "registered local agent");
    }

    /// Register a remote agent and persist the registration
    pub fn register_remote(&self, spec: RemoteAgentSpec) -> Result<Arc<RemoteAgent>, RegistryError> {
        let name = spec.name.clone();
        let capabilities = spec.capabilities.clone();
        let base_url = spec.base_url.clone();
        let agent = Arc::new(RemoteAgent::new(spec));

        let mut entries = self.entries.lock().expect("registry lock");
        entries.insert(
            name.clone(),
            Entry {
                agent: agent.clone(),
                transport: Transport::Remote,
                capabilities,
                healthy: true,
                remote: Some(agent.clone()),
            },
        );
        self.save_remote_agents(&entries)?;
        info!(agent = %name, %base_url, "registered remote agent");
        Ok(agent)
    }

    /// Remove an agent. Returns false when the name is unknown.
    pub fn unregister(&self, name: &str) -> Result<bool, RegistryError> {
        let mut entries = self.entries.lock().expect("registry lock");
        let Some(removed) = entries.remove(name) else {
            return Ok(false);
        };
        if removed.remote.is_some() {
            self.save_remote_agents(&entries)?;
        }
        info!(agent = %name, "unregistered agent");
        Ok(true)
    }

    /// All registered agents, for handing to the coordinator
    pub fn agents(&self) -> Vec<Arc<dyn Agent>> {
        let entries = self.entries.lock().expect("registry lock");
        entries.values().map(|e| Arc::clone(&e.agent)).collect()
    }

    /// Agents carrying a specific capability tag
    pub fn by_capability(&self, capability: &str) -> Vec<Arc<dyn Agent>> {
        let entries = self.entries.lock().expect("registry lock");
        entries
            .values()
            .filter(|e| e.capabilities.iter().any(|c| c == capability))
            .map(|e| Arc::clone(&e.agent))
            .collect()
    }

    /// Run health checks on all remote agents. Local agents are always
    /// considered healthy.
    pub async fn health_check_all(&self) -> HashMap<String, bool> {
        let remotes: Vec<(String, Arc<RemoteAgent>)> = {
            let entries = self.entries.lock().expect("registry lock");
            entries
                .iter()
                .filter_map(|(name, e)| e.remote.as_ref().map(|r| (name.clone(), r.clone())))
                .collect()
        };

        let mut results = HashMap::new();
        for (name, remote) in remotes {
            let healthy = remote.health_check().await;
            results.insert(name, healthy);
        }

        let mut entries = self.entries.lock().expect("registry lock");
        for (name, entry) in entries.iter_mut() {
            match results.get(name) {
                Some(healthy) => entry.healthy = *healthy,
                None => {
                    results.insert(name.clone(), true);
                }
            }
        }
        results
    }

    /// Serializable status for every registered agent
    pub fn list_info(&self) -> Vec<AgentInfo> {
        let entries = self.entries.lock().expect("registry lock");
        let mut info: Vec<AgentInfo> = entries
            .values()
            .map(|e| AgentInfo {
                name: e.agent.name().to_string(),
                domain: e.agent.domain().to_string(),
                transport: match e.transport {
                    Transport::Local => "local".to_string(),
                    Transport::Remote => "remote".to_string(),
                },
                capabilities: e.capabilities.clone(),
                healthy: e.healthy,
                base_url: e.remote.as_ref().map(|r| r.spec().base_url.clone()),
                interaction_count: e.remote.as_ref().map(|r| r.interaction_count()),
            })
            .collect();
        info.sort_by(|a, b| a.name.cmp(&b.name));
        info
    }

    pub fn remote_count(&self) -> usize {
        let entries = self.entries.lock().expect("registry lock");
        entries.values().filter(|e| e.remote.is_some()).count()
    }

    pub fn local_count(&self) -> usize {
        self.count() - self.remote_count()
    }

    pub fn count(&self) -> usize {
        self.entries.lock().expect("registry lock").len()
    }

    pub fn persist_path(&self) -> &Path {
        &self.persist_path
    }
}

impl AgentDirectory for AgentRegistry {
    fn profiles(&self) -> Vec<AgentProfile> {
        let entries = self.entries.lock().expect("registry lock");
        entries
            .values()
            .map(|e| AgentProfile {
                agent: Arc::clone(&e.agent),
                transport: e.transport,
                capabilities: e.capabilities.clone(),
                healthy: e.healthy,
            })
            .collect()
    }

    fn get(&self, name: &str) -> Option<AgentProfile> {
        let entries = self.entries.lock().expect("registry lock");
        entries.get(name).map(|e| AgentProfile {
            agent: Arc::clone(&e.agent),
            transport: e.transport,
            capabilities: e.capabilities.clone(),
            healthy: e.healthy,
        })
    }

    fn count(&self) -> usize {
        self.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use roundtable_application::ports::agent::AgentError;
    use roundtable_domain::{Analysis, Challenge, Synthesis, Task, Vote};
    use tempfile::TempDir;

    struct LocalStub(&'static str);

    #[async_trait]
    impl Agent for LocalStub {
        fn name(&self) -> &str {
            self.0
        }

        fn domain(&self) -> &str {
            "testing"
        }

        async fn analyze(&self, _task: &Task) -> Result<Analysis, AgentError> {
            Ok(Analysis::new(self.0, "testing"))
        }

        async fn challenge(
            &self,
            _task: &Task,
            _others: &[Analysis],
        ) -> Result<Challenge, AgentError> {
            Ok(Challenge::empty(self.0))
        }

        async fn vote(&self, _task: &Task, _synthesis: &Synthesis) -> Result<Vote, AgentError> {
            Ok(Vote::approve(self.0))
        }
    }

    fn temp_registry() -> (TempDir, AgentRegistry) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agents.json");
        (dir, AgentRegistry::new(path))
    }

    #[test]
    fn test_register_and_count() {
        let (_dir, registry) = temp_registry();
        registry.register_local(Arc::new(LocalStub("analyst")), vec!["stats".to_string()]);

        assert_eq!(registry.count(), 1);
        assert_eq!(registry.local_count(), 1);
        assert_eq!(registry.remote_count(), 0);
    }

    #[test]
    fn test_remote_registrations_survive_restart() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agents.json");

        {
            let registry = AgentRegistry::new(&path);
            let mut spec =
                RemoteAgentSpec::new("ts_analyzer", "code analysis", "http://localhost:3000");
            spec.capabilities = vec!["typescript".to_string()];
            registry.register_remote(spec).unwrap();
            registry.register_local(Arc::new(LocalStub("analyst")), vec![]);
        }

        let reopened = AgentRegistry::new(&path);
        assert_eq!(reopened.count(), 1);
        assert_eq!(reopened.remote_count(), 1);

        let profile = reopened.get("ts_analyzer").unwrap();
        assert_eq!(profile.capabilities, vec!["typescript"]);
        assert_eq!(profile.transport, Transport::Remote);
    }

    #[test]
    fn test_persist_replaces_file_without_leaving_staging() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agents.json");

        let registry = AgentRegistry::new(&path);
        registry
            .register_remote(RemoteAgentSpec::new("r1", "d", "http://localhost:3000"))
            .unwrap();
        registry
            .register_remote(RemoteAgentSpec::new("r2", "d", "http://localhost:3001"))
            .unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["remote_agents"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_unregister_removes_persisted_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agents.json");

        let registry = AgentRegistry::new(&path);
        registry
            .register_remote(RemoteAgentSpec::new("r1", "d", "http://localhost:3000"))
            .unwrap();
        assert!(registry.unregister("r1").unwrap());
        assert!(!registry.unregister("r1").unwrap());

        let reopened = AgentRegistry::new(&path);
        assert_eq!(reopened.count(), 0);
    }

    #[test]
    fn test_capability_lookup() {
        let (_dir, registry) = temp_registry();
        registry.register_local(Arc::new(LocalStub("a")), vec!["sql".to_string()]);
        registry.register_local(Arc::new(LocalStub("b")), vec!["css".to_string()]);

        let matched = registry.by_capability("sql");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].name(), "a");
    }

    #[tokio::test]
    async fn test_health_check_marks_unreachable_remotes() {
        let (_dir, registry) = temp_registry();
        registry.register_local(Arc::new(LocalStub("local")), vec![]);
        let mut spec = RemoteAgentSpec::new("ghost", "nothing", "http://127.0.0.1:1");
        spec.timeout = 1;
        registry.register_remote(spec).unwrap();

        let results = registry.health_check_all().await;
        assert_eq!(results["local"], true);
        assert_eq!(results["ghost"], false);
        assert!(!registry.get("ghost").unwrap().healthy);
        assert!(registry.get("local").unwrap().healthy);
    }
}
