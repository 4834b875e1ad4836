//! StrategyPlan - the coordinator's optional pre-dispatch plan

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Phase 0 output: how the coordinator intends to run the round.
///
/// Produced once, before independent analysis, only when a planning step
/// is enabled and a text-generation backend is configured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyPlan {
    /// Sub-problems the task decomposes into
    #[serde(default)]
    pub task_decomposition: Vec<String>,
    /// Per-agent focus assignment: agent name to focus area
    #[serde(default)]
    pub agent_focus_areas: BTreeMap<String, String>,
    /// Disagreements the coordinator expects between agents
    #[serde(default)]
    pub anticipated_tensions: Vec<String>,
    #[serde(default)]
    pub success_criteria: Vec<String>,
    /// Raw planning output, kept for audit
    #[serde(default)]
    pub reasoning: String,
}

impl StrategyPlan {
    /// Deterministic fallback when planning fails or cannot parse.
    ///
    /// One unified decomposition, every agent assigned its own domain as
    /// focus. A round never aborts because the plan did not materialize.
    pub fn fallback(agents: &[(String, String)]) -> Self {
        Self {
            task_decomposition: vec!["Full analysis".to_string()],
            agent_focus_areas: agents
                .iter()
                .map(|(name, domain)| (name.clone(), domain.clone()))
                .collect(),
            anticipated_tensions: Vec::new(),
            success_criteria: vec!["Actionable recommendations with evidence".to_string()],
            reasoning: String::new(),
        }
    }

    pub fn focus_for(&self, agent_name: &str) -> Option<&str> {
        self.agent_focus_areas.get(agent_name).map(String::as_str)
    }
}
