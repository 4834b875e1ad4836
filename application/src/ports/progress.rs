//! Progress notification port
//!
//! Callbacks for reporting deliberation progress. Implementations live
//! with the caller (console output, logs).

use roundtable_domain::Phase;

/// Callback for progress updates during a deliberation round
pub trait DeliberationProgress: Send + Sync {
    /// Called when a phase starts
    fn on_phase_start(&self, phase: Phase, total_agents: usize);

    /// Called when one agent finishes its part of a phase
    fn on_agent_complete(&self, phase: Phase, agent: &str, success: bool);

    /// Called when a phase completes
    fn on_phase_complete(&self, phase: Phase);
}

/// No-op progress notifier
pub struct NoProgress;

impl DeliberationProgress for NoProgress {
    fn on_phase_start(&self, _phase: Phase, _total_agents: usize) {}
    fn on_agent_complete(&self, _phase: Phase, _agent: &str, _success: bool) {}
    fn on_phase_complete(&self, _phase: Phase) {}
}
