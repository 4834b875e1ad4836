//! Chat orchestrator
//!
//! Lightweight multi-agent chat: route the message to a few relevant
//! specialists, cross-check their answers, and synthesize a single
//! reply. When specialists disagree past the escalation threshold the
//! user is pointed at a full deliberation round instead of being handed
//! a falsely confident answer.

use crate::config::ChatConfig;
use crate::ports::agent::Agent;
use crate::ports::directory::AgentDirectory;
use crate::ports::text_gen::TextGenBackend;
use crate::use_cases::route_agents::{AgentRouter, RoutingDecision};
use roundtable_domain::{DeliberationPrompts, Task, extract_json_object};
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// A single specialist's response to a consultation
#[derive(Debug, Clone)]
pub struct ConsultationResult {
    pub agent_name: String,
    pub domain: String,
    /// Flattened observations, truncated for prompt budgets
    pub response: String,
    pub evidence: Vec<String>,
    pub confidence: f64,
}

/// Result of cross-checking specialist responses
#[derive(Debug, Clone)]
pub struct CrossCheck {
    /// 0.0 is total conflict, 1.0 is full agreement
    pub agreement_level: f64,
    pub conflicts: Vec<serde_json::Value>,
    pub consensus_points: Vec<String>,
    pub should_escalate: bool,
    pub escalation_reason: String,
}

/// Complete response from the chat orchestrator
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub consultations: Vec<ConsultationResult>,
    pub cross_check: Option<CrossCheck>,
    pub escalation_suggested: bool,
    pub escalation_reason: String,
    pub agents_consulted: Vec<String>,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone)]
struct Turn {
    role: &'static str,
    content: String,
}

/// Per-session conversation history with oldest-first eviction.
///
/// Bounded on both axes: turns within a session, and the number of
/// sessions held at once. When the session cap is exceeded the
/// oldest-created session is dropped whole.
#[derive(Default)]
struct BoundedHistory {
    sessions: HashMap<String, VecDeque<Turn>>,
    /// Session ids in creation order, oldest first
    creation_order: VecDeque<String>,
    max_turns: usize,
    max_sessions: usize,
}

impl BoundedHistory {
    fn new(max_turns: usize, max_sessions: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            creation_order: VecDeque::new(),
            max_turns,
            max_sessions,
        }
    }

    fn push(&mut self, session: &str, role: &'static str, content: String) {
        if !self.sessions.contains_key(session) {
            self.creation_order.push_back(session.to_string());
        }
        let turns = self.sessions.entry(session.to_string()).or_default();
        turns.push_back(Turn { role, content });
        while turns.len() > self.max_turns {
            turns.pop_front();
        }
        while self.sessions.len() > self.max_sessions {
            // Ids already cleared by hand are skipped
            let Some(oldest) = self.creation_order.pop_front() else {
                break;
            };
            self.sessions.remove(&oldest);
        }
    }

    fn recent(&self, session: &str, count: usize) -> Vec<Turn> {
        self.sessions
            .get(session)
            .map(|turns| turns.iter().rev().take(count).rev().cloned().collect())
            .unwrap_or_default()
    }

    fn clear(&mut self, session: &str) {
        self.sessions.remove(session);
        self.creation_order.retain(|s| s != session);
    }

    fn len(&self, session: &str) -> usize {
        self.sessions.get(session).map_or(0, VecDeque::len)
    }
}

#[derive(Deserialize)]
struct CrossCheckPayload {
    #[serde(default = "default_agreement")]
    agreement_level: f64,
    #[serde(default)]
    conflicts: Vec<serde_json::Value>,
    #[serde(default)]
    consensus_points: Vec<String>,
}

fn default_agreement() -> f64 {
    1.0
}

/// Lightweight multi-agent chat orchestrator
pub struct ChatOrchestrator {
    backend: Arc<dyn TextGenBackend>,
    directory: Arc<dyn AgentDirectory>,
    router: AgentRouter,
    config: ChatConfig,
    history: Mutex<BoundedHistory>,
}

impl ChatOrchestrator {
    pub fn new(
        backend: Arc<dyn TextGenBackend>,
        directory: Arc<dyn AgentDirectory>,
        router: AgentRouter,
        config: ChatConfig,
    ) -> Self {
        let history = Mutex::new(BoundedHistory::new(
            config.max_history_turns,
            config.max_sessions,
        ));
        Self {
            backend,
            directory,
            router,
            config,
            history,
        }
    }

    /// Process one chat message with selective specialist consultation
    pub async fn chat(
        &self,
        session: &str,
        message: &str,
        trust_scores: &HashMap<String, f64>,
    ) -> ChatResponse {
        let start = Instant::now();
        let message = truncate(message, self.config.max_message_length);

        let routing = self.router.route(message, trust_scores);

        if routing.should_escalate && routing.selected.is_empty() {
            return ChatResponse {
                content: format!(
                    "This question would benefit from a full team analysis. Reason: {}",
                    routing.escalation_reason
                ),
                consultations: Vec::new(),
                cross_check: None,
                escalation_suggested: true,
                escalation_reason: routing.escalation_reason.clone(),
                agents_consulted: Vec::new(),
                duration_seconds: start.elapsed().as_secs_f64(),
            };
        }

        let consultations = self.consult(message, &routing).await;

        let cross_check = if self.config.enable_cross_check && consultations.len() > 1 {
            Some(self.cross_check(&consultations).await)
        } else {
            None
        };

        let content = self
            .synthesize(session, message, &consultations, cross_check.as_ref())
            .await;

        let mut escalation_suggested = false;
        let mut escalation_reason = String::new();
        if let Some(check) = &cross_check
            && check.should_escalate
        {
            escalation_suggested = true;
            escalation_reason = check.escalation_reason.clone();
        }
        if routing.should_escalate {
            escalation_suggested = true;
            if escalation_reason.is_empty() {
                escalation_reason = routing.escalation_reason.clone();
            }
        }

        {
            let mut history = self.history.lock().expect("history lock");
            history.push(session, "user", message.to_string());
            history.push(session, "assistant", content.clone());
        }

        ChatResponse {
            agents_consulted: consultations.iter().map(|c| c.agent_name.clone()).collect(),
            content,
            consultations,
            cross_check,
            escalation_suggested,
            escalation_reason,
            duration_seconds: start.elapsed().as_secs_f64(),
        }
    }

    /// Drop a session's conversation history
    pub fn clear_history(&self, session: &str) {
        self.history.lock().expect("history lock").clear(session);
    }

    pub fn history_len(&self, session: &str) -> usize {
        self.history.lock().expect("history lock").len(session)
    }

    /// Consult the routed specialists in parallel
    async fn consult(&self, message: &str, routing: &RoutingDecision) -> Vec<ConsultationResult> {
        let task = Task::new(
            format!("chat_{}", chrono::Utc::now().format("%H%M%S%3f")),
            message,
        );

        let mut join_set = JoinSet::new();
        for profile in &routing.selected {
            let agent: Arc<dyn Agent> = Arc::clone(&profile.agent);
            let task = task.clone();
            join_set.spawn(async move {
                let name = agent.name().to_string();
                (name, agent.analyze(&task).await)
            });
        }

        let mut consultations = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((name, Ok(analysis))) => {
                    debug!(agent = %name, "consultation complete");
                    let evidence = analysis
                        .evidence()
                        .map(|e| truncate(e, 2000).to_string())
                        .collect();
                    consultations.push(ConsultationResult {
                        response: truncate(&analysis.observations_json(), 10_000).to_string(),
                        agent_name: analysis.agent_name,
                        domain: analysis.domain,
                        evidence,
                        confidence: analysis.confidence,
                    });
                }
                Ok((name, Err(e))) => {
                    warn!(agent = %name, error = %e, "consultation failed");
                }
                Err(e) => warn!(error = %e, "task join error"),
            }
        }
        consultations
    }

    /// Compare specialist responses for agreement and conflicts
    async fn cross_check(&self, consultations: &[ConsultationResult]) -> CrossCheck {
        let summary = serde_json::to_string_pretty(
            &consultations
                .iter()
                .map(|c| {
                    serde_json::json!({
                        "agent": c.agent_name,
                        "domain": c.domain,
                        "response": truncate(&c.response, 2000),
                        "confidence": c.confidence,
                    })
                })
                .collect::<Vec<_>>(),
        )
        .unwrap_or_else(|_| "[]".to_string());

        let prompt = DeliberationPrompts::cross_check(&summary);
        let fallback = CrossCheck {
            agreement_level: 0.5,
            conflicts: Vec::new(),
            consensus_points: Vec::new(),
            should_escalate: false,
            escalation_reason: String::new(),
        };

        let content = match self.backend.generate(&prompt, "cross_check", 0.1).await {
            Ok(generation) => generation.content,
            Err(e) => {
                warn!(error = %e, "cross-check call failed");
                return fallback;
            }
        };

        let Some(payload) = extract_json_object(&content)
            .and_then(|json| serde_json::from_str::<CrossCheckPayload>(json).ok())
        else {
            return fallback;
        };

        let should_escalate = payload.agreement_level < self.config.escalation_threshold;
        CrossCheck {
            agreement_level: payload.agreement_level,
            conflicts: payload.conflicts,
            consensus_points: payload.consensus_points,
            should_escalate,
            escalation_reason: if should_escalate {
                format!(
                    "Significant specialist disagreement (agreement: {:.0}%)",
                    payload.agreement_level * 100.0
                )
            } else {
                String::new()
            },
        }
    }

    /// Fuse consultations and history into a user-facing reply
    async fn synthesize(
        &self,
        session: &str,
        message: &str,
        consultations: &[ConsultationResult],
        cross_check: Option<&CrossCheck>,
    ) -> String {
        let specialists: Vec<(String, String)> = self
            .directory
            .profiles()
            .iter()
            .filter(|p| p.healthy)
            .map(|p| (p.agent.name().to_string(), p.agent.domain().to_string()))
            .collect();

        let mut context = String::new();

        let recent = {
            let history = self.history.lock().expect("history lock");
            history.recent(session, 6)
        };
        if !recent.is_empty() {
            context.push_str("Conversation history:\n");
            for turn in &recent {
                context.push_str(&format!("{}: {}\n", turn.role, truncate(&turn.content, 500)));
            }
            context.push('\n');
        }

        if !consultations.is_empty() {
            context.push_str("Specialist consultations:\n");
            for c in consultations {
                context.push_str(&format!(
                    "[{} ({}, confidence: {:.0}%)]:\n{}\n\n",
                    c.agent_name,
                    c.domain,
                    c.confidence * 100.0,
                    truncate(&c.response, 3000),
                ));
            }
        }

        if cross_check.is_some_and(|c| !c.conflicts.is_empty()) {
            context.push_str(
                "IMPORTANT: Specialists disagree on some points. Present BOTH views \
                 with supporting evidence. Do NOT pick a side without evidence.\n",
            );
        }

        let prompt = roundtable_domain::PromptParts::new(
            DeliberationPrompts::chat_system(&specialists),
            message,
        )
        .with_context(context);

        match self.backend.generate(&prompt, "chat_synthesis", 0.4).await {
            Ok(generation) => generation.content,
            Err(e) => {
                warn!(error = %e, "chat synthesis failed");
                "I could not produce an answer right now. Please try again.".to_string()
            }
        }
    }
}

/// Truncate on a char boundary at or below `max_bytes`
fn truncate(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
