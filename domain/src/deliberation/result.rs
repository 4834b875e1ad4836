//! DeliberationResult - the aggregate output of one round

use super::analysis::Analysis;
use super::challenge::Challenge;
use super::strategy::StrategyPlan;
use super::synthesis::Synthesis;
use super::vote::Vote;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The phases of the deliberation protocol, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Strategy,
    Analysis,
    Challenge,
    Synthesis,
    Voting,
}

impl Phase {
    /// Artifact file stem for this phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Strategy => "phase0_strategy",
            Phase::Analysis => "phase1_analyses",
            Phase::Challenge => "phase2_challenges",
            Phase::Synthesis => "phase3_synthesis",
            Phase::Voting => "phase3_votes",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete output of a deliberation round.
///
/// `approval_rate` and `consensus_reached` are always derived from the
/// vote list and the configured threshold; they are never set
/// independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliberationResult {
    pub task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyPlan>,
    #[serde(default)]
    pub analyses: Vec<Analysis>,
    #[serde(default)]
    pub challenges: Vec<Challenge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis: Option<Synthesis>,
    #[serde(default)]
    pub votes: Vec<Vote>,
    pub approval_rate: f64,
    pub consensus_reached: bool,
    /// Wall-clock duration of the round in seconds
    pub duration_seconds: f64,
}

impl DeliberationResult {
    /// An empty result shell for a task; populated phase by phase
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            strategy: None,
            analyses: Vec::new(),
            challenges: Vec::new(),
            synthesis: None,
            votes: Vec::new(),
            approval_rate: 0.0,
            consensus_reached: false,
            duration_seconds: 0.0,
        }
    }

    /// Fraction of votes that approved; 0.0 when no votes were cast
    pub fn compute_approval_rate(votes: &[Vote]) -> f64 {
        if votes.is_empty() {
            return 0.0;
        }
        votes.iter().filter(|v| v.approve).count() as f64 / votes.len() as f64
    }

    /// Derive `approval_rate` and `consensus_reached` from the vote list.
    ///
    /// This is the only place the consensus flag is set.
    pub fn finalize(&mut self, consensus_threshold: f64, duration: Duration) {
        self.approval_rate = Self::compute_approval_rate(&self.votes);
        self.consensus_reached = self.approval_rate >= consensus_threshold;
        self.duration_seconds = duration.as_secs_f64();
    }

    pub fn dissenting_votes(&self) -> impl Iterator<Item = &Vote> {
        self.votes.iter().filter(|v| !v.approve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approval_rate_empty_votes() {
        assert_eq!(DeliberationResult::compute_approval_rate(&[]), 0.0);
    }

    #[test]
    fn test_unanimous_approval_reaches_consensus() {
        let mut result = DeliberationResult::new("t1");
        result.votes = vec![
            Vote::approve("a"),
            Vote::approve("b"),
            Vote::approve("c"),
        ];
        result.finalize(0.7, Duration::from_secs(2));

        assert_eq!(result.approval_rate, 1.0);
        assert!(result.consensus_reached);
    }

    #[test]
    fn test_two_of_three_misses_default_threshold() {
        let mut result = DeliberationResult::new("t1");
        result.votes = vec![
            Vote::approve("a"),
            Vote::approve("b"),
            Vote::reject("c", "unverified claim"),
        ];
        result.finalize(0.7, Duration::from_secs(1));

        assert!((result.approval_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!(!result.consensus_reached);
    }

    #[test]
    fn test_consensus_always_derivable_from_votes() {
        let mut result = DeliberationResult::new("t1");
        result.votes = vec![Vote::approve("a"), Vote::reject("b", "no")];
        result.finalize(0.5, Duration::ZERO);
        assert_eq!(
            result.consensus_reached,
            result.approval_rate >= 0.5
        );
    }

    #[test]
    fn test_phase_artifact_names() {
        assert_eq!(Phase::Strategy.as_str(), "phase0_strategy");
        assert_eq!(Phase::Voting.as_str(), "phase3_votes");
    }
}
