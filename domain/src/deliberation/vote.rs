//! Vote - one agent's stance on the synthesis

use serde::{Deserialize, Serialize};

/// Phase 3 output: an agent's vote on the fused synthesis.
///
/// # Example
///
/// ```
/// use roundtable_domain::Vote;
///
/// let vote = Vote::approve("analyst").with_condition("re-run after the fix lands");
/// assert!(vote.approve);
///
/// let dissent = Vote::reject("skeptic", "key finding lacks a VERIFIED tag");
/// assert!(!dissent.approve);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vote {
    pub agent_name: String,
    pub approve: bool,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dissent_reason: Option<String>,
}

impl Vote {
    pub fn approve(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            approve: true,
            conditions: Vec::new(),
            dissent_reason: None,
        }
    }

    pub fn reject(agent_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            approve: false,
            conditions: Vec::new(),
            dissent_reason: Some(reason.into()),
        }
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_constructors() {
        let yes = Vote::approve("a");
        assert!(yes.approve);
        assert!(yes.dissent_reason.is_none());

        let no = Vote::reject("b", "evidence too weak");
        assert!(!no.approve);
        assert_eq!(no.dissent_reason.as_deref(), Some("evidence too weak"));
    }
}
