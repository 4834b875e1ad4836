//! Filesystem artifact store
//!
//! Writes each phase output to `<root>/<task_id>/<phase>.json` so a
//! round can be audited after the fact. Failed writes are logged and
//! swallowed; auditability never takes a round down.

use roundtable_application::ports::artifact_store::ArtifactStore;
use roundtable_domain::Phase;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// One JSON file per (task, phase)
pub struct JsonArtifactStore {
    root: PathBuf,
}

impl JsonArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ArtifactStore for JsonArtifactStore {
    fn record(&self, task_id: &str, phase: Phase, payload: &serde_json::Value) {
        let dir = self.root.join(task_id);
        if let Err(e) = fs::create_dir_all(&dir) {
            warn!(path = %dir.display(), error = %e, "artifact dir creation failed");
            return;
        }

        let path = dir.join(format!("{}.json", phase.as_str()));
        let envelope = serde_json::json!({
            "task_id": task_id,
            "phase": phase.as_str(),
            "recorded_at": chrono::Utc::now().to_rfc3339(),
            "data": payload,
        });
        let pretty = match serde_json::to_string_pretty(&envelope) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "artifact serialization failed");
                return;
            }
        };
        match fs::write(&path, pretty) {
            Ok(()) => debug!(path = %path.display(), "artifact written"),
            Err(e) => warn!(path = %path.display(), error = %e, "artifact write failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writes_one_file_per_phase() {
        let dir = TempDir::new().unwrap();
        let store = JsonArtifactStore::new(dir.path());

        store.record("t1", Phase::Strategy, &serde_json::json!({"plan": "split"}));
        store.record("t1", Phase::Analysis, &serde_json::json!([{"agent": "a"}]));

        let strategy = dir.path().join("t1/phase0_strategy.json");
        let analyses = dir.path().join("t1/phase1_analyses.json");
        assert!(strategy.exists());
        assert!(analyses.exists());

        let raw = fs::read_to_string(strategy).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["phase"], "phase0_strategy");
        assert_eq!(value["data"]["plan"], "split");
        assert!(value["recorded_at"].is_string());
    }

    #[test]
    fn test_unwritable_root_does_not_panic() {
        let store = JsonArtifactStore::new("/proc/no_such_place");
        store.record("t1", Phase::Voting, &serde_json::json!({}));
    }
}
