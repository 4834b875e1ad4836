//! Remote agent adapter
//!
//! Wraps an HTTP endpoint as an [`Agent`] implementation. The
//! coordinator sees no difference between an in-process agent and a
//! remote one. External agents in any language implement three
//! endpoints:
//!
//!   POST {base_url}/analyze   -> analysis JSON
//!   POST {base_url}/challenge -> challenge JSON
//!   POST {base_url}/vote      -> vote JSON
//!
//! All response strings are sanitized, response bodies are size-capped
//! before deserialization, and injection patterns in agent output are
//! detected and logged.

use crate::sanitize::{detect_injection, sanitize_text};
use async_trait::async_trait;
use reqwest::StatusCode;
use roundtable_application::ports::agent::{Agent, AgentError};
use roundtable_domain::{
    Analysis, Challenge, ChallengePoint, Concession, Observation, Recommendation, Synthesis, Task,
    Vote,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 120;
const MAX_RETRIES: u32 = 2;
const MAX_RESPONSE_BYTES: usize = 5_000_000;
const MAX_FIELD_LENGTH: usize = 50_000;
const RETRY_BASE_DELAY_MS: u64 = 250;
const RETRY_MAX_DELAY_MS: u64 = 2_000;

/// Persisted description of a remote agent registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteAgentSpec {
    pub name: String,
    pub domain: String,
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn default_mode() -> String {
    "sync".to_string()
}

impl RemoteAgentSpec {
    pub fn new(
        name: impl Into<String>,
        domain: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
            base_url: base_url.into(),
            api_key: String::new(),
            timeout: DEFAULT_TIMEOUT_SECONDS,
            mode: default_mode(),
            capabilities: Vec::new(),
        }
    }
}

#[derive(Serialize)]
struct AnalyzePayload<'a> {
    task_id: &'a str,
    content: &'a str,
    context: &'a std::collections::BTreeMap<String, serde_json::Value>,
    constraints: &'a [String],
}

#[derive(Serialize)]
struct ChallengePayload<'a> {
    task_id: &'a str,
    content: &'a str,
    other_analyses: &'a [Analysis],
}

#[derive(Serialize)]
struct VotePayload<'a> {
    task_id: &'a str,
    content: &'a str,
    synthesis: &'a Synthesis,
}

#[derive(Deserialize, Default)]
struct AnalyzeResponse {
    #[serde(default)]
    observations: Vec<Observation>,
    #[serde(default)]
    recommendations: Vec<Recommendation>,
    #[serde(default)]
    confidence: f64,
}

#[derive(Deserialize, Default)]
struct ChallengeResponse {
    #[serde(default)]
    challenges: Vec<ChallengePoint>,
    #[serde(default)]
    concessions: Vec<Concession>,
}

#[derive(Deserialize, Default)]
struct VoteResponse {
    #[serde(default)]
    approve: bool,
    #[serde(default)]
    conditions: Vec<String>,
    #[serde(default)]
    dissent_reason: Option<String>,
}

/// Adapter: an HTTP endpoint participating as a roster agent
pub struct RemoteAgent {
    spec: RemoteAgentSpec,
    client: reqwest::Client,
    interaction_count: AtomicU64,
}

impl RemoteAgent {
    pub fn new(mut spec: RemoteAgentSpec) -> Self {
        while spec.base_url.ends_with('/') {
            spec.base_url.pop();
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(spec.timeout))
            .build()
            .unwrap_or_default();
        Self {
            spec,
            client,
            interaction_count: AtomicU64::new(0),
        }
    }

    pub fn spec(&self) -> &RemoteAgentSpec {
        &self.spec
    }

    pub fn interaction_count(&self) -> u64 {
        self.interaction_count.load(Ordering::Relaxed)
    }

    fn sanitize_field(&self, value: &str, field: &str) -> String {
        let sanitized = sanitize_text(value, MAX_FIELD_LENGTH);
        let findings = detect_injection(&sanitized);
        if !findings.is_empty() {
            warn!(
                agent = %self.spec.name,
                field,
                patterns = findings.len(),
                "injection patterns in remote agent response"
            );
        }
        sanitized
    }

    fn is_transient(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    /// POST a payload with bounded retries on transient failures.
    ///
    /// Timeouts, 429, and 5xx retry with capped backoff. Connection
    /// refusal and client errors (4xx other than 429) are terminal.
    /// Returns the decoded value together with the raw body, which the
    /// caller keeps for audit.
    async fn post<P: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        payload: &P,
    ) -> Result<(R, String), AgentError> {
        let url = format!("{}/{}", self.spec.base_url, endpoint);
        let mut last_error = String::new();

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay = (RETRY_BASE_DELAY_MS << (attempt - 1)).min(RETRY_MAX_DELAY_MS);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            let mut request = self.client.post(&url).json(payload);
            if !self.spec.api_key.is_empty() {
                request = request.bearer_auth(&self.spec.api_key);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) if e.is_timeout() => {
                    warn!(
                        agent = %self.spec.name,
                        endpoint,
                        attempt = attempt + 1,
                        "request timed out"
                    );
                    last_error = "timeout".to_string();
                    continue;
                }
                Err(e) if e.is_connect() => {
                    warn!(agent = %self.spec.name, %url, error = %e, "connection refused");
                    return Err(AgentError::Connection(e.to_string()));
                }
                Err(e) => {
                    warn!(agent = %self.spec.name, %url, error = %e, "transport error");
                    last_error = e.to_string();
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let body: String = response.text().await.unwrap_or_default();
                last_error = format!("HTTP {status}: {}", sanitize_text(&body, 200));
                if Self::is_transient(status) {
                    warn!(agent = %self.spec.name, %status, endpoint, "transient HTTP error");
                    continue;
                }
                return Err(AgentError::InvalidResponse(last_error));
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| AgentError::Connection(e.to_string()))?;
            if body.len() > MAX_RESPONSE_BYTES {
                return Err(AgentError::InvalidResponse(format!(
                    "response exceeds {MAX_RESPONSE_BYTES} byte limit"
                )));
            }

            self.interaction_count.fetch_add(1, Ordering::Relaxed);
            let raw = String::from_utf8_lossy(&body).into_owned();
            return serde_json::from_slice(&body)
                .map(|data| (data, raw))
                .map_err(|e| AgentError::InvalidResponse(e.to_string()));
        }

        Err(AgentError::Connection(format!(
            "failed on {endpoint} after {} attempts: {last_error}",
            MAX_RETRIES + 1
        )))
    }

    /// Check whether the remote endpoint is reachable
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.spec.base_url);
        let mut request = self.client.get(&url).timeout(Duration::from_secs(10));
        if !self.spec.api_key.is_empty() {
            request = request.bearer_auth(&self.spec.api_key);
        }
        match request.send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                debug!(agent = %self.spec.name, error = %e, "health check failed");
                false
            }
        }
    }
}

#[async_trait]
impl Agent for RemoteAgent {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn domain(&self) -> &str {
        &self.spec.domain
    }

    async fn analyze(&self, task: &Task) -> Result<Analysis, AgentError> {
        let payload = AnalyzePayload {
            task_id: &task.id,
            content: &task.content,
            context: &task.context,
            constraints: &task.constraints,
        };
        let (data, raw): (AnalyzeResponse, String) = self.post("analyze", &payload).await?;

        let mut analysis = Analysis::new(&self.spec.name, &self.spec.domain)
            .with_confidence(data.confidence.clamp(0.0, 1.0))
            .with_raw_response(sanitize_text(&raw, MAX_FIELD_LENGTH));
        for mut obs in data.observations.into_iter().take(100) {
            obs.finding = self.sanitize_field(&obs.finding, "analyze.finding");
            obs.evidence = self.sanitize_field(&obs.evidence, "analyze.evidence");
            analysis = analysis.with_observation(obs);
        }
        analysis.recommendations = data
            .recommendations
            .into_iter()
            .take(100)
            .map(|mut rec| {
                rec.action = self.sanitize_field(&rec.action, "analyze.action");
                rec.rationale = self.sanitize_field(&rec.rationale, "analyze.rationale");
                rec
            })
            .collect();
        Ok(analysis)
    }

    async fn challenge(&self, task: &Task, others: &[Analysis]) -> Result<Challenge, AgentError> {
        let payload = ChallengePayload {
            task_id: &task.id,
            content: &task.content,
            other_analyses: others,
        };
        let (data, _): (ChallengeResponse, String) = self.post("challenge", &payload).await?;

        let mut challenge = Challenge::empty(&self.spec.name);
        challenge.challenges = data
            .challenges
            .into_iter()
            .take(100)
            .map(|mut point| {
                point.finding_challenged =
                    self.sanitize_field(&point.finding_challenged, "challenge.finding");
                point.counter_evidence =
                    self.sanitize_field(&point.counter_evidence, "challenge.evidence");
                point
            })
            .collect();
        challenge.concessions = data
            .concessions
            .into_iter()
            .take(100)
            .map(|mut concession| {
                concession.reason = self.sanitize_field(&concession.reason, "challenge.reason");
                concession
            })
            .collect();
        Ok(challenge)
    }

    async fn vote(&self, task: &Task, synthesis: &Synthesis) -> Result<Vote, AgentError> {
        let payload = VotePayload {
            task_id: &task.id,
            content: &task.content,
            synthesis,
        };
        let (data, _): (VoteResponse, String) = self.post("vote", &payload).await?;

        let mut vote = if data.approve {
            Vote::approve(&self.spec.name)
        } else {
            Vote::reject(
                &self.spec.name,
                data.dissent_reason
                    .as_deref()
                    .map(|r| self.sanitize_field(r, "vote.dissent_reason"))
                    .unwrap_or_default(),
            )
        };
        for condition in data.conditions.iter().take(20) {
            vote = vote.with_condition(self.sanitize_field(condition, "vote.condition"));
        }
        Ok(vote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_defaults() {
        let spec = RemoteAgentSpec::new("analyzer", "code analysis", "http://localhost:3000");
        assert_eq!(spec.timeout, DEFAULT_TIMEOUT_SECONDS);
        assert_eq!(spec.mode, "sync");
        assert!(spec.api_key.is_empty());
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let agent = RemoteAgent::new(RemoteAgentSpec::new(
            "a",
            "d",
            "http://localhost:3000///",
        ));
        assert_eq!(agent.spec().base_url, "http://localhost:3000");
    }

    #[test]
    fn test_spec_round_trips_through_json() {
        let mut spec = RemoteAgentSpec::new("analyzer", "code analysis", "http://localhost:3000");
        spec.capabilities = vec!["typescript".to_string()];
        let json = serde_json::to_string(&spec).unwrap();
        let back: RemoteAgentSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, "analyzer");
        assert_eq!(back.capabilities, vec!["typescript"]);
    }

    #[test]
    fn test_transient_status_classification() {
        assert!(RemoteAgent::is_transient(StatusCode::TOO_MANY_REQUESTS));
        assert!(RemoteAgent::is_transient(StatusCode::BAD_GATEWAY));
        assert!(!RemoteAgent::is_transient(StatusCode::UNAUTHORIZED));
        assert!(!RemoteAgent::is_transient(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_analyze_response_tolerates_missing_fields() {
        let data: AnalyzeResponse = serde_json::from_str("{}").unwrap();
        assert!(data.observations.is_empty());
        assert_eq!(data.confidence, 0.0);
    }

    /// Serve one canned HTTP response on an ephemeral port
    async fn serve_once(body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 16_384];
            let mut read = 0;
            // Request bodies in these tests fit one segment; read until
            // the header terminator has arrived.
            loop {
                let n = stream.read(&mut buf[read..]).await.unwrap_or(0);
                read += n;
                if n == 0 || buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len(),
            );
            let _ = stream.write_all(response.as_bytes()).await;
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_unreachable_agent_reports_connection_error() {
        let mut spec = RemoteAgentSpec::new("ghost", "nothing", "http://127.0.0.1:1");
        spec.timeout = 1;
        let agent = RemoteAgent::new(spec);

        let err = agent
            .analyze(&Task::new("t1", "anything"))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Connection(_)));
        assert_eq!(agent.interaction_count(), 0);
    }

    #[tokio::test]
    async fn test_connection_refused_fails_without_retry() {
        let mut spec = RemoteAgentSpec::new("ghost", "nothing", "http://127.0.0.1:1");
        spec.timeout = 5;
        let agent = RemoteAgent::new(spec);

        let start = std::time::Instant::now();
        let err = agent
            .analyze(&Task::new("t1", "anything"))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Connection(_)));
        // One backoff retry alone would sleep 250ms
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_analyze_keeps_raw_body_for_audit() {
        let body = r#"{"observations": [{"finding": "login spike",
                        "evidence": "[VERIFIED: auth_logs:row_42]"}],
                       "confidence": 0.8}"#;
        let base_url = serve_once(body).await;
        let agent = RemoteAgent::new(RemoteAgentSpec::new("analyst", "logs", base_url));

        let analysis = agent.analyze(&Task::new("t1", "check logins")).await.unwrap();
        assert_eq!(analysis.observations.len(), 1);
        assert!(analysis.raw_response.contains("[VERIFIED: auth_logs:row_42]"));
        assert_eq!(agent.interaction_count(), 1);
    }

    #[tokio::test]
    async fn test_health_check_false_when_unreachable() {
        let agent = RemoteAgent::new(RemoteAgentSpec::new("ghost", "nothing", "http://127.0.0.1:1"));
        assert!(!agent.health_check().await);
    }
}
