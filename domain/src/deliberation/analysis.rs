//! Analysis - one agent's independent output for a task

use serde::{Deserialize, Serialize};

/// Severity of an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Info
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A single finding with its supporting evidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// What the agent observed
    pub finding: String,
    /// The quote, data, or citation backing the finding
    #[serde(default)]
    pub evidence: String,
    #[serde(default)]
    pub severity: Severity,
    /// Agent-reported confidence in [0, 1]
    #[serde(default)]
    pub confidence: f64,
}

impl Observation {
    pub fn new(finding: impl Into<String>, evidence: impl Into<String>) -> Self {
        Self {
            finding: finding.into(),
            evidence: evidence.into(),
            severity: Severity::Info,
            confidence: 0.0,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }
}

/// A recommended action with its rationale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub priority: String,
}

/// Phase 1 output: an agent's independent analysis with evidence.
///
/// Produced once per agent per task and never mutated afterwards; the
/// enforcement pipeline may supersede it with a corrected copy, in which
/// case the replacement is flagged. The raw backend output is always kept
/// for audit, even when structured parsing failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub agent_name: String,
    pub domain: String,
    #[serde(default)]
    pub observations: Vec<Observation>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    /// Overall confidence in [0, 1]
    #[serde(default)]
    pub confidence: f64,
    /// Full unparsed response, preserved for audit
    #[serde(default)]
    pub raw_response: String,
    /// Enforcement flags attached by the coordinator (e.g. "enforcement_rewritten")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
}

impl Analysis {
    pub fn new(agent_name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            domain: domain.into(),
            observations: Vec::new(),
            recommendations: Vec::new(),
            confidence: 0.0,
            raw_response: String::new(),
            flags: Vec::new(),
        }
    }

    pub fn with_observation(mut self, observation: Observation) -> Self {
        self.observations.push(observation);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_raw_response(mut self, raw: impl Into<String>) -> Self {
        self.raw_response = raw.into();
        self
    }

    /// Serialize the observation list for enforcement and synthesis.
    ///
    /// The enforcement validators scan this text; corrected rewrites are
    /// expected back in the same JSON shape so they can be parsed into a
    /// replacement observation list.
    pub fn observations_json(&self) -> String {
        serde_json::to_string_pretty(&self.observations).unwrap_or_default()
    }

    /// Evidence strings from all observations, in order
    pub fn evidence(&self) -> impl Iterator<Item = &str> {
        self.observations
            .iter()
            .map(|o| o.evidence.as_str())
            .filter(|e| !e.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observation_confidence_clamped() {
        let obs = Observation::new("finding", "evidence").with_confidence(1.7);
        assert_eq!(obs.confidence, 1.0);
    }

    #[test]
    fn test_severity_roundtrip() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
        let back: Severity = serde_json::from_str("\"warning\"").unwrap();
        assert_eq!(back, Severity::Warning);
    }

    #[test]
    fn test_observations_json_parses_back() {
        let analysis = Analysis::new("analyst", "log analysis")
            .with_observation(Observation::new("login spike", "[VERIFIED: logs:row_42]"));
        let text = analysis.observations_json();
        let parsed: Vec<Observation> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].evidence, "[VERIFIED: logs:row_42]");
    }
}
