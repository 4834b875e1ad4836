//! Citation agent
//!
//! Deliberation seat for evidence level grading. Asks of every finding:
//! is this really VERIFIED, or just INDICATED? Overclaiming is treated
//! as worse than underclaiming.

use crate::sanitize::wrap_user_content;
use async_trait::async_trait;
use roundtable_application::ports::agent::{Agent, AgentError};
use roundtable_application::ports::text_gen::TextGenBackend;
use roundtable_domain::{
    Analysis, Challenge, Observation, PromptParts, Severity, Synthesis, Task, Vote,
    extract_json_object,
};
use serde::Deserialize;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = r#"You are a Citation agent. Your job is to ensure every finding has a proper evidence level tag.

Evidence levels (strongest to weakest):
  [VERIFIED: source:reference] -- 'I found this exact data here'
  [CORROBORATED: source_1 + source_2] -- 'Multiple sources agree'
  [INDICATED: source_name] -- 'One source suggests this, gaps exist'
  [POSSIBLE] -- 'Cannot rule out, needs investigation'

Rules:
- Every finding MUST have an evidence level tag
- VERIFIED requires a specific source:reference (e.g. logs:row_42)
- CORROBORATED requires naming 2+ independent sources
- Findings without tags should be challenged
- Overclaiming (VERIFIED when only INDICATED) is worse than underclaiming

Always return valid JSON.
"#;

#[derive(Deserialize, Default)]
struct ChallengePayload {
    #[serde(default)]
    challenges: Vec<roundtable_domain::ChallengePoint>,
    #[serde(default)]
    concessions: Vec<roundtable_domain::Concession>,
}

#[derive(Deserialize, Default)]
struct VotePayload {
    #[serde(default)]
    approve: bool,
    #[serde(default)]
    conditions: Vec<String>,
    #[serde(default)]
    dissent_reason: Option<String>,
}

/// Enforces evidence level tagging on all agent findings
pub struct CitationAgent {
    backend: Option<Arc<dyn TextGenBackend>>,
}

impl CitationAgent {
    pub fn new(backend: Option<Arc<dyn TextGenBackend>>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Agent for CitationAgent {
    fn name(&self) -> &str {
        "citation"
    }

    fn domain(&self) -> &str {
        "evidence level tagging and citation enforcement"
    }

    async fn analyze(&self, _task: &Task) -> Result<Analysis, AgentError> {
        Ok(Analysis::new(self.name(), self.domain())
            .with_observation(
                Observation::new(
                    "Evidence level enforcement active, all findings require \
                     [VERIFIED/CORROBORATED/INDICATED/POSSIBLE] tags",
                    "Citation agent monitoring for untagged and overclaimed findings",
                )
                .with_severity(Severity::Info)
                .with_confidence(1.0),
            )
            .with_confidence(1.0))
    }

    async fn challenge(&self, _task: &Task, others: &[Analysis]) -> Result<Challenge, AgentError> {
        let Some(backend) = &self.backend else {
            return Ok(Challenge::empty(self.name()));
        };
        if others.is_empty() {
            return Ok(Challenge::empty(self.name()));
        }

        let digest = serde_json::to_string_pretty(
            &others
                .iter()
                .filter(|a| a.agent_name != self.name())
                .map(|a| {
                    serde_json::json!({
                        "agent": a.agent_name,
                        "findings": a.observations.iter().take(5).collect::<Vec<_>>(),
                    })
                })
                .collect::<Vec<_>>(),
        )
        .unwrap_or_else(|_| "[]".to_string());

        let prompt = PromptParts::new(
            SYSTEM_PROMPT,
            r#"For each agent's findings, check:
1. Does each finding have an evidence level tag?
2. Is the evidence level appropriate (not overclaimed)?
3. Do VERIFIED claims cite a specific source:reference?
4. Do CORROBORATED claims name 2+ sources?

Return JSON: {"challenges": [{"target_agent": ..., "finding_challenged": ..., "counter_evidence": ...}], "concessions": [...]}"#,
        )
        .with_context(wrap_user_content(&digest, "AGENT_ANALYSES"));

        let generation = backend
            .generate(&prompt, "citation_challenge", 0.2)
            .await
            .map_err(|e| AgentError::Other(e.to_string()))?;

        let payload = extract_json_object(&generation.content)
            .and_then(|json| serde_json::from_str::<ChallengePayload>(json).ok())
            .unwrap_or_default();

        let mut challenge = Challenge::empty(self.name());
        challenge.challenges = payload.challenges;
        challenge.concessions = payload.concessions;
        Ok(challenge)
    }

    async fn vote(&self, _task: &Task, synthesis: &Synthesis) -> Result<Vote, AgentError> {
        let Some(backend) = &self.backend else {
            return Ok(Vote::reject(
                self.name(),
                "Cannot verify citation quality without a backend",
            ));
        };

        let findings = serde_json::to_string(
            &synthesis.key_findings.iter().take(5).collect::<Vec<_>>(),
        )
        .unwrap_or_else(|_| "[]".to_string());

        let prompt = PromptParts::new(
            SYSTEM_PROMPT,
            format!(
                r#"Are findings in this synthesis properly tagged with evidence levels?

Key findings: {findings}

Return JSON: {{"approve": true/false, "conditions": [...], "dissent_reason": "..."}}"#,
            ),
        );

        let generation = backend
            .generate(&prompt, "citation_vote", 0.2)
            .await
            .map_err(|e| AgentError::Other(e.to_string()))?;

        let Some(payload) = extract_json_object(&generation.content)
            .and_then(|json| serde_json::from_str::<VotePayload>(json).ok())
        else {
            return Ok(Vote::reject(
                self.name(),
                "Could not evaluate citation quality",
            ));
        };

        let mut vote = if payload.approve {
            Vote::approve(self.name())
        } else {
            Vote::reject(self.name(), payload.dissent_reason.unwrap_or_default())
        };
        for condition in payload.conditions {
            vote = vote.with_condition(condition);
        }
        Ok(vote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundtable_application::ports::text_gen::{BackendError, Generation};

    struct FixedBackend(&'static str);

    #[async_trait]
    impl TextGenBackend for FixedBackend {
        async fn generate(
            &self,
            _prompt: &PromptParts,
            _role: &str,
            _temperature: f64,
        ) -> Result<Generation, BackendError> {
            Ok(Generation::new(self.0))
        }
    }

    #[tokio::test]
    async fn test_vote_approves_when_backend_approves() {
        let agent = CitationAgent::new(Some(Arc::new(FixedBackend(
            r#"{"approve": true, "conditions": ["keep the row reference"]}"#,
        ))));
        let vote = agent
            .vote(&Task::new("t", "x"), &Synthesis::from_raw("grounded"))
            .await
            .unwrap();
        assert!(vote.approve);
        assert_eq!(vote.conditions, vec!["keep the row reference"]);
    }

    #[tokio::test]
    async fn test_challenge_skips_own_analysis() {
        let agent = CitationAgent::new(Some(Arc::new(FixedBackend(
            r#"{"challenges": [], "concessions": []}"#,
        ))));
        let others = vec![Analysis::new("citation", "self")];
        let challenge = agent
            .challenge(&Task::new("t", "x"), &others)
            .await
            .unwrap();
        assert!(challenge.is_empty());
    }

    #[tokio::test]
    async fn test_degrades_gracefully_without_backend() {
        let agent = CitationAgent::new(None);
        let vote = agent
            .vote(&Task::new("t", "x"), &Synthesis::from_raw("anything"))
            .await
            .unwrap();
        assert!(!vote.approve);
        assert!(vote.dissent_reason.is_some());
    }
}
