//! Agent routing
//!
//! Picks which specialists to consult for a chat message. Scoring is
//! intentionally simple word matching; the chat orchestrator's lead
//! model makes the final call and can override via
//! [`AgentRouter::route_with_hint`].

use crate::config::RouterConfig;
use crate::ports::directory::{AgentDirectory, AgentProfile};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Result of agent routing: which agents to consult and why
#[derive(Clone, Default)]
pub struct RoutingDecision {
    pub selected: Vec<AgentProfile>,
    /// Per-agent explanation of why it was picked
    pub reasons: HashMap<String, String>,
    pub confidence: f64,
    pub should_escalate: bool,
    pub escalation_reason: String,
}

impl RoutingDecision {
    fn escalate(reason: impl Into<String>) -> Self {
        Self {
            should_escalate: true,
            escalation_reason: reason.into(),
            ..Self::default()
        }
    }

    pub fn agent_names(&self) -> Vec<&str> {
        self.selected.iter().map(|p| p.agent.name()).collect()
    }
}

/// Scores registered agents against a query and picks the top few
pub struct AgentRouter {
    directory: Arc<dyn AgentDirectory>,
    config: RouterConfig,
}

impl AgentRouter {
    pub fn new(directory: Arc<dyn AgentDirectory>, config: RouterConfig) -> Self {
        Self { directory, config }
    }

    /// Select agents for a query based on domain words, capability tags,
    /// and trust scores. Every healthy agent gets a baseline score so a
    /// roster is never empty-handed on an off-topic query.
    pub fn route(&self, query: &str, trust_scores: &HashMap<String, f64>) -> RoutingDecision {
        if self.directory.count() == 0 {
            return RoutingDecision::escalate("No agents registered");
        }

        let query_lower = query.to_lowercase();
        let mut scored: Vec<(f64, AgentProfile, String)> = Vec::new();

        for profile in self.directory.profiles() {
            if !profile.healthy {
                continue;
            }

            let mut score = 0.0;
            let mut reason_parts = Vec::new();

            let domain_matches = profile
                .agent
                .domain()
                .to_lowercase()
                .split_whitespace()
                .filter(|w| query_lower.contains(*w))
                .count();
            if domain_matches > 0 {
                score += domain_matches as f64 * 0.3;
                reason_parts.push(format!("domain match ({domain_matches} words)"));
            }

            for cap in &profile.capabilities {
                if query_lower.contains(&cap.to_lowercase()) {
                    score += 0.2;
                    reason_parts.push(format!("capability: {cap}"));
                }
            }

            if let Some(trust) = trust_scores.get(profile.agent.name()) {
                score += trust * 0.2;
                reason_parts.push(format!("trust: {trust:.2}"));
            }

            score += 0.1;

            let reason = if reason_parts.is_empty() {
                "baseline".to_string()
            } else {
                reason_parts.join(", ")
            };
            scored.push((score, profile, reason));
        }

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        let total_candidates = scored.len();
        scored.truncate(self.config.max_agents);

        if scored.len() < self.config.min_agents {
            let mut decision = RoutingDecision::escalate("Too few healthy agents available");
            decision.confidence = 0.2;
            decision.reasons = scored
                .iter()
                .map(|(_, p, r)| (p.agent.name().to_string(), r.clone()))
                .collect();
            decision.selected = scored.into_iter().map(|(_, p, _)| p).collect();
            return decision;
        }

        let avg_score = scored.iter().map(|(s, _, _)| s).sum::<f64>() / scored.len() as f64;
        let confidence = avg_score.min(1.0);

        let mut decision = RoutingDecision {
            reasons: scored
                .iter()
                .map(|(_, p, r)| (p.agent.name().to_string(), r.clone()))
                .collect(),
            selected: scored.into_iter().map(|(_, p, _)| p).collect(),
            confidence,
            should_escalate: false,
            escalation_reason: String::new(),
        };

        if confidence < 0.3 && total_candidates > self.config.max_agents {
            decision.should_escalate = true;
            decision.escalation_reason =
                "Low routing confidence, consider a full deliberation round".to_string();
        }

        debug!(
            selected = ?decision.agent_names(),
            confidence,
            "routing decision"
        );
        decision
    }

    /// Route using model-suggested agent names, validated against the
    /// directory. Unknown names are dropped; word matching fills any gap.
    pub fn route_with_hint(
        &self,
        query: &str,
        suggested: &[String],
        trust_scores: &HashMap<String, f64>,
    ) -> RoutingDecision {
        let mut selected = Vec::new();
        let mut reasons = HashMap::new();

        for name in suggested.iter().take(self.config.max_agents) {
            if let Some(profile) = self.directory.get(name) {
                reasons.insert(name.clone(), "model-selected".to_string());
                selected.push(profile);
            }
        }

        if selected.len() < self.config.min_agents {
            let fallback = self.route(query, trust_scores);
            for profile in fallback.selected {
                let name = profile.agent.name().to_string();
                if !reasons.contains_key(&name) {
                    let reason = fallback
                        .reasons
                        .get(&name)
                        .cloned()
                        .unwrap_or_else(|| "fallback".to_string());
                    reasons.insert(name, reason);
                    selected.push(profile);
                }
                if selected.len() >= self.config.max_agents {
                    break;
                }
            }
        }

        let confidence = if selected.len() >= self.config.min_agents {
            0.8
        } else {
            0.3
        };
        selected.truncate(self.config.max_agents);

        RoutingDecision {
            selected,
            reasons,
            confidence,
            should_escalate: false,
            escalation_reason: String::new(),
        }
    }
}
