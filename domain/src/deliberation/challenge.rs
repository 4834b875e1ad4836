//! Challenge - one agent's critique of the other analyses

use serde::{Deserialize, Serialize};

/// A single challenged finding with counter-evidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengePoint {
    pub target_agent: String,
    pub finding_challenged: String,
    #[serde(default)]
    pub counter_evidence: String,
}

/// A finding the challenging agent accepts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concession {
    pub target_agent: String,
    pub finding_accepted: String,
    #[serde(default)]
    pub reason: String,
}

/// Phase 2 output: an agent's challenges to the other analyses.
///
/// Produced after every analysis is visible. All challenge traffic flows
/// through the coordinator; agents never exchange critiques directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub agent_name: String,
    #[serde(default)]
    pub challenges: Vec<ChallengePoint>,
    #[serde(default)]
    pub concessions: Vec<Concession>,
}

impl Challenge {
    /// An empty challenge from an agent with nothing to dispute
    pub fn empty(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            challenges: Vec::new(),
            concessions: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty() && self.concessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_challenge() {
        let challenge = Challenge::empty("skeptic");
        assert!(challenge.is_empty());
        assert_eq!(challenge.agent_name, "skeptic");
    }
}
