//! Artifact store port
//!
//! Phase outputs are written to durable storage for audit. Writes are
//! advisory; a failed write never fails the round, so the port is
//! infallible from the caller's side.

use roundtable_domain::Phase;

/// Sink for per-phase deliberation artifacts
pub trait ArtifactStore: Send + Sync {
    /// Record a phase payload for a task. Implementations log failures
    /// instead of returning them.
    fn record(&self, task_id: &str, phase: Phase, payload: &serde_json::Value);
}

/// No-op store for when artifacts are disabled
pub struct NoArtifacts;

impl ArtifactStore for NoArtifacts {
    fn record(&self, _task_id: &str, _phase: Phase, _payload: &serde_json::Value) {}
}
