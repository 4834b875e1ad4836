//! Run Deliberation use case
//!
//! Drives the full 4-phase round: strategy, independent analysis,
//! challenge, synthesis plus voting. Agents report to the coordinator
//! and never to each other; every phase output is written to the
//! artifact store for audit.

use crate::config::DeliberationConfig;
use crate::ports::agent::{Agent, AgentError};
use crate::ports::artifact_store::{ArtifactStore, NoArtifacts};
use crate::ports::progress::{DeliberationProgress, NoProgress};
use crate::ports::text_gen::TextGenBackend;
use crate::use_cases::enforce_evidence::EvidenceEnforcementPipeline;
use roundtable_domain::{
    Analysis, Challenge, DeliberationPrompts, DeliberationResult, Phase, StrategyPlan, Synthesis,
    Task, ValidationOutcome, Vote, parse_observations, parse_strategy, parse_synthesis,
};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Errors that can occur when starting a deliberation round
#[derive(Error, Debug)]
pub enum RunDeliberationError {
    #[error("No agents configured")]
    NoAgents,
}

/// Use case for running a deliberation round
pub struct RunDeliberationUseCase {
    agents: Vec<Arc<dyn Agent>>,
    backend: Option<Arc<dyn TextGenBackend>>,
    enforcement: Option<Arc<EvidenceEnforcementPipeline>>,
    artifacts: Arc<dyn ArtifactStore>,
    config: DeliberationConfig,
}

impl RunDeliberationUseCase {
    pub fn new(agents: Vec<Arc<dyn Agent>>, config: DeliberationConfig) -> Self {
        Self {
            agents,
            backend: None,
            enforcement: None,
            artifacts: Arc::new(NoArtifacts),
            config,
        }
    }

    /// Backend used for strategy and synthesis. Without one, those
    /// phases degrade to their defined fallbacks.
    pub fn with_backend(mut self, backend: Arc<dyn TextGenBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_enforcement(mut self, pipeline: Arc<EvidenceEnforcementPipeline>) -> Self {
        self.enforcement = Some(pipeline);
        self
    }

    pub fn with_artifacts(mut self, artifacts: Arc<dyn ArtifactStore>) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// Execute the round with default (no-op) progress
    pub async fn execute(&self, task: Task) -> Result<DeliberationResult, RunDeliberationError> {
        self.execute_with_progress(task, &NoProgress).await
    }

    /// Execute the full 4-phase protocol
    pub async fn execute_with_progress(
        &self,
        task: Task,
        progress: &dyn DeliberationProgress,
    ) -> Result<DeliberationResult, RunDeliberationError> {
        if self.agents.is_empty() {
            return Err(RunDeliberationError::NoAgents);
        }

        let start = Instant::now();
        info!(
            task_id = %task.id,
            agents = self.agents.len(),
            "starting deliberation round"
        );
        let mut result = DeliberationResult::new(&task.id);

        if self.config.enable_strategy_phase && self.backend.is_some() {
            info!("phase 0: strategy planning");
            let strategy = self.phase_strategy(&task).await;
            self.record(&task.id, Phase::Strategy, &strategy);
            result.strategy = Some(strategy);
        }

        info!(agents = self.agents.len(), "phase 1: independent analysis");
        result.analyses = self
            .phase_analysis(&task, result.strategy.as_ref(), progress)
            .await;
        self.record(&task.id, Phase::Analysis, &result.analyses);

        if self.config.enable_challenge_phase {
            info!("phase 2: cross-agent challenge");
            result.challenges = self
                .phase_challenge(&task, &result.analyses, progress)
                .await;
            self.record(&task.id, Phase::Challenge, &result.challenges);
        }

        info!("phase 3: synthesis and voting");
        let synthesis = self.phase_synthesis(&result.analyses).await;
        self.record(&task.id, Phase::Synthesis, &synthesis);

        result.votes = self.phase_voting(&task, &synthesis, progress).await;
        result.synthesis = Some(synthesis);

        result.finalize(self.config.consensus_threshold, start.elapsed());

        self.record(
            &task.id,
            Phase::Voting,
            &serde_json::json!({
                "votes": result.votes,
                "consensus": result.consensus_reached,
                "approval_rate": result.approval_rate,
                "duration": result.duration_seconds,
            }),
        );

        info!(
            consensus = result.consensus_reached,
            approval_rate = result.approval_rate,
            duration_seconds = result.duration_seconds,
            "deliberation complete"
        );
        Ok(result)
    }

    fn roster_info(&self) -> Vec<(String, String)> {
        self.agents
            .iter()
            .map(|a| (a.name().to_string(), a.domain().to_string()))
            .collect()
    }

    fn record<T: serde::Serialize>(&self, task_id: &str, phase: Phase, payload: &T) {
        if !self.config.write_artifacts {
            return;
        }
        match serde_json::to_value(payload) {
            Ok(value) => self.artifacts.record(task_id, phase, &value),
            Err(e) => warn!(phase = %phase, error = %e, "artifact serialization failed"),
        }
    }

    /// Phase 0: plan before dispatching
    async fn phase_strategy(&self, task: &Task) -> StrategyPlan {
        let roster = self.roster_info();
        let backend = self.backend.as_ref().expect("checked by caller");
        let prompt = DeliberationPrompts::strategy(&task.content, &roster);

        match backend.generate(&prompt, "strategy", 0.3).await {
            Ok(generation) => parse_strategy(&generation.content).unwrap_or_else(|| {
                warn!("strategy response was not parseable, using fallback plan");
                StrategyPlan::fallback(&roster)
            }),
            Err(e) => {
                warn!(error = %e, "strategy phase failed, using fallback plan");
                StrategyPlan::fallback(&roster)
            }
        }
    }

    /// Phase 1: all agents analyze independently and in parallel.
    ///
    /// A failed or timed-out agent is logged and excluded; the rest of
    /// the round proceeds with the analyses that succeeded.
    async fn phase_analysis(
        &self,
        task: &Task,
        strategy: Option<&StrategyPlan>,
        progress: &dyn DeliberationProgress,
    ) -> Vec<Analysis> {
        progress.on_phase_start(Phase::Analysis, self.agents.len());
        let mut join_set = JoinSet::new();

        for agent in &self.agents {
            let agent = Arc::clone(agent);
            let mut task = task.clone();
            if let Some(focus) = strategy.and_then(|s| s.focus_for(agent.name())) {
                task = task.with_context("focus", serde_json::Value::String(focus.to_string()));
            }
            let deadline = self.config.agent_timeout;

            join_set.spawn(async move {
                let name = agent.name().to_string();
                let result = match timeout(deadline, agent.analyze(&task)).await {
                    Ok(r) => r,
                    Err(_) => Err(AgentError::Timeout),
                };
                (name, result)
            });
        }

        let mut analyses = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((name, Ok(analysis))) => {
                    debug!(agent = %name, "analysis complete");
                    progress.on_agent_complete(Phase::Analysis, &name, true);
                    analyses.push(self.enforce(analysis).await);
                }
                Ok((name, Err(e))) => {
                    warn!(agent = %name, error = %e, "analysis failed");
                    progress.on_agent_complete(Phase::Analysis, &name, false);
                }
                Err(e) => warn!(error = %e, "task join error"),
            }
        }

        progress.on_phase_complete(Phase::Analysis);
        analyses
    }

    /// Run the enforcement pipeline over one analysis.
    ///
    /// A corrected response only replaces the original when it parses
    /// back into the same observation structure; otherwise the original
    /// stands and the failure is flagged.
    async fn enforce(&self, mut analysis: Analysis) -> Analysis {
        let Some(pipeline) = &self.enforcement else {
            return analysis;
        };

        let text = analysis.observations_json();
        let report = pipeline.validate(&analysis.agent_name, &text).await;

        if report.is_accepted() && report.corrected_content.is_none() {
            return analysis;
        }

        if let Some(corrected) = &report.corrected_content {
            match parse_observations(corrected) {
                Some(observations) => {
                    info!(agent = %analysis.agent_name, "enforcement rewrite applied");
                    analysis.observations = observations;
                    analysis.flags.push("enforcement_rewritten".to_string());
                }
                None => {
                    warn!(
                        agent = %analysis.agent_name,
                        "corrected response did not parse, keeping original"
                    );
                    analysis
                        .flags
                        .push("enforcement_correction_unparsed".to_string());
                }
            }
        } else if report.outcome == ValidationOutcome::Rejected {
            warn!(
                agent = %analysis.agent_name,
                criticals = report.critical_count(),
                "analysis rejected by enforcement, no backend for rewrite"
            );
            analysis.flags.push("enforcement_rejected".to_string());
        }

        let mut rules: Vec<&str> = report.violations.iter().map(|v| v.rule.as_str()).collect();
        rules.sort_unstable();
        rules.dedup();
        for rule in rules {
            analysis.flags.push(format!("enforcement:{rule}"));
        }
        analysis
    }

    /// Phase 2: agents challenge each other, mediated by the coordinator
    async fn phase_challenge(
        &self,
        task: &Task,
        analyses: &[Analysis],
        progress: &dyn DeliberationProgress,
    ) -> Vec<Challenge> {
        progress.on_phase_start(Phase::Challenge, self.agents.len());
        let analyses: Arc<[Analysis]> = analyses.to_vec().into();
        let mut join_set = JoinSet::new();

        for agent in &self.agents {
            let agent = Arc::clone(agent);
            let task = task.clone();
            let analyses = Arc::clone(&analyses);
            let deadline = self.config.agent_timeout;

            join_set.spawn(async move {
                let name = agent.name().to_string();
                let result = match timeout(deadline, agent.challenge(&task, &analyses)).await {
                    Ok(r) => r,
                    Err(_) => Err(AgentError::Timeout),
                };
                (name, result)
            });
        }

        let mut challenges = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((name, Ok(challenge))) => {
                    progress.on_agent_complete(Phase::Challenge, &name, true);
                    challenges.push(challenge);
                }
                Ok((name, Err(e))) => {
                    warn!(agent = %name, error = %e, "challenge failed");
                    progress.on_agent_complete(Phase::Challenge, &name, false);
                }
                Err(e) => warn!(error = %e, "task join error"),
            }
        }

        progress.on_phase_complete(Phase::Challenge);
        challenges
    }

    /// Phase 3a: fuse analyses. Evidence fields must survive verbatim.
    async fn phase_synthesis(&self, analyses: &[Analysis]) -> Synthesis {
        let Some(backend) = &self.backend else {
            return Synthesis::from_raw("No backend available for synthesis");
        };

        let analyses_json = serde_json::to_string_pretty(
            &analyses
                .iter()
                .map(|a| {
                    serde_json::json!({
                        "agent": a.agent_name,
                        "domain": a.domain,
                        "observations": a.observations,
                        "recommendations": a.recommendations,
                        "confidence": a.confidence,
                    })
                })
                .collect::<Vec<_>>(),
        )
        .unwrap_or_else(|_| "[]".to_string());

        let prompt = DeliberationPrompts::synthesis(&analyses_json);
        match backend.generate(&prompt, "synthesis", 0.2).await {
            Ok(generation) => parse_synthesis(&generation.content)
                .unwrap_or_else(|| Synthesis::from_raw(generation.content)),
            Err(e) => {
                warn!(error = %e, "synthesis failed");
                Synthesis::from_raw("Synthesis failed, review individual analyses")
            }
        }
    }

    /// Phase 3b: the roster votes on the synthesis. Failed voters are
    /// excluded; the approval rate is computed over cast votes only.
    async fn phase_voting(
        &self,
        task: &Task,
        synthesis: &Synthesis,
        progress: &dyn DeliberationProgress,
    ) -> Vec<Vote> {
        progress.on_phase_start(Phase::Voting, self.agents.len());
        let synthesis = Arc::new(synthesis.clone());
        let mut join_set = JoinSet::new();

        for agent in &self.agents {
            let agent = Arc::clone(agent);
            let task = task.clone();
            let synthesis = Arc::clone(&synthesis);
            let deadline = self.config.agent_timeout;

            join_set.spawn(async move {
                let name = agent.name().to_string();
                let result = match timeout(deadline, agent.vote(&task, &synthesis)).await {
                    Ok(r) => r,
                    Err(_) => Err(AgentError::Timeout),
                };
                (name, result)
            });
        }

        let mut votes = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((name, Ok(vote))) => {
                    progress.on_agent_complete(Phase::Voting, &name, true);
                    votes.push(vote);
                }
                Ok((name, Err(e))) => {
                    warn!(agent = %name, error = %e, "vote failed");
                    progress.on_agent_complete(Phase::Voting, &name, false);
                }
                Err(e) => warn!(error = %e, "task join error"),
            }
        }

        progress.on_phase_complete(Phase::Voting);
        votes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnforcementConfig;
    use crate::ports::text_gen::{BackendError, Generation};
    use async_trait::async_trait;
    use roundtable_domain::{Observation, PromptParts, Severity};

    struct StubAgent {
        name: &'static str,
        evidence: &'static str,
        approve: bool,
        fail: bool,
    }

    impl StubAgent {
        fn approving(name: &'static str, evidence: &'static str) -> Arc<dyn Agent> {
            Arc::new(Self {
                name,
                evidence,
                approve: true,
                fail: false,
            })
        }

        fn rejecting(name: &'static str) -> Arc<dyn Agent> {
            Arc::new(Self {
                name,
                evidence: "[POSSIBLE]",
                approve: false,
                fail: false,
            })
        }

        fn failing(name: &'static str) -> Arc<dyn Agent> {
            Arc::new(Self {
                name,
                evidence: "",
                approve: false,
                fail: true,
            })
        }
    }

    #[async_trait]
    impl Agent for StubAgent {
        fn name(&self) -> &str {
            self.name
        }

        fn domain(&self) -> &str {
            "testing"
        }

        async fn analyze(&self, _task: &Task) -> Result<Analysis, AgentError> {
            if self.fail {
                return Err(AgentError::Connection("refused".into()));
            }
            Ok(Analysis::new(self.name, "testing")
                .with_observation(
                    Observation::new("anomalous login", self.evidence)
                        .with_severity(Severity::Warning)
                        .with_confidence(0.8),
                )
                .with_confidence(0.8))
        }

        async fn challenge(
            &self,
            _task: &Task,
            _others: &[Analysis],
        ) -> Result<Challenge, AgentError> {
            if self.fail {
                return Err(AgentError::Connection("refused".into()));
            }
            Ok(Challenge::empty(self.name))
        }

        async fn vote(&self, _task: &Task, _synthesis: &Synthesis) -> Result<Vote, AgentError> {
            if self.fail {
                return Err(AgentError::Connection("refused".into()));
            }
            if self.approve {
                Ok(Vote::approve(self.name))
            } else {
                Ok(Vote::reject(self.name, "needs stronger evidence"))
            }
        }
    }

    struct EchoBackend;

    #[async_trait]
    impl TextGenBackend for EchoBackend {
        async fn generate(
            &self,
            _prompt: &PromptParts,
            role: &str,
            _temperature: f64,
        ) -> Result<Generation, BackendError> {
            match role {
                "synthesis" => Ok(Generation::new(
                    r#"{"recommended_direction": "rotate the key",
                        "key_findings": [{"agent_name": "a", "finding": "anomalous login",
                                          "evidence": "[VERIFIED: logs:row_7]", "confidence": 0.8}],
                        "trade_offs": [], "minority_views": []}"#,
                )),
                _ => Ok(Generation::new("{}")),
            }
        }
    }

    fn task() -> Task {
        Task::new("t1", "investigate the anomalous login")
    }

    #[tokio::test]
    async fn test_no_agents_is_an_error() {
        let use_case = RunDeliberationUseCase::new(vec![], DeliberationConfig::default());
        assert!(matches!(
            use_case.execute(task()).await,
            Err(RunDeliberationError::NoAgents)
        ));
    }

    #[tokio::test]
    async fn test_unanimous_round_reaches_consensus() {
        let agents = vec![
            StubAgent::approving("a", "[VERIFIED: logs:row_7]"),
            StubAgent::approving("b", "[VERIFIED: logs:row_8]"),
            StubAgent::approving("c", "[VERIFIED: logs:row_9]"),
        ];
        let use_case = RunDeliberationUseCase::new(agents, DeliberationConfig::default())
            .with_backend(Arc::new(EchoBackend));

        let result = use_case.execute(task()).await.unwrap();
        assert_eq!(result.analyses.len(), 3);
        assert_eq!(result.approval_rate, 1.0);
        assert!(result.consensus_reached);
        assert!(result.synthesis.is_some());
    }

    #[tokio::test]
    async fn test_failed_agent_is_excluded_not_fatal() {
        let agents = vec![
            StubAgent::approving("a", "[VERIFIED: logs:row_7]"),
            StubAgent::approving("b", "[VERIFIED: logs:row_8]"),
            StubAgent::failing("c"),
        ];
        let use_case = RunDeliberationUseCase::new(agents, DeliberationConfig::default());

        let result = use_case.execute(task()).await.unwrap();
        assert_eq!(result.analyses.len(), 2);
        assert_eq!(result.votes.len(), 2);
        assert_eq!(result.approval_rate, 1.0);
    }

    #[tokio::test]
    async fn test_dissent_below_threshold_blocks_consensus() {
        let agents = vec![
            StubAgent::approving("a", "[VERIFIED: logs:row_7]"),
            StubAgent::approving("b", "[VERIFIED: logs:row_8]"),
            StubAgent::rejecting("c"),
        ];
        let use_case = RunDeliberationUseCase::new(agents, DeliberationConfig::default());

        let result = use_case.execute(task()).await.unwrap();
        assert!((result.approval_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!(!result.consensus_reached);
        assert_eq!(result.dissenting_votes().count(), 1);
    }

    #[tokio::test]
    async fn test_all_agents_failing_yields_empty_round() {
        let agents = vec![StubAgent::failing("a"), StubAgent::failing("b")];
        let use_case = RunDeliberationUseCase::new(agents, DeliberationConfig::default());

        let result = use_case.execute(task()).await.unwrap();
        assert!(result.analyses.is_empty());
        assert!(result.votes.is_empty());
        assert_eq!(result.approval_rate, 0.0);
        assert!(!result.consensus_reached);
    }

    #[tokio::test]
    async fn test_clean_analyses_pass_enforcement_untouched() {
        let agents = vec![StubAgent::approving("a", "[VERIFIED: logs:row_7]")];
        let pipeline = Arc::new(EvidenceEnforcementPipeline::new(
            EnforcementConfig::default(),
        ));
        let use_case = RunDeliberationUseCase::new(agents, DeliberationConfig::default())
            .with_enforcement(pipeline);

        let result = use_case.execute(task()).await.unwrap();
        assert_eq!(result.analyses.len(), 1);
        assert!(result.analyses[0].flags.is_empty());
        assert_eq!(
            result.analyses[0].observations[0].evidence,
            "[VERIFIED: logs:row_7]"
        );
    }
}
