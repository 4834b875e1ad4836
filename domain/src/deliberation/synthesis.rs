//! Synthesis - the coordinator's fused view of all analyses

use serde::{Deserialize, Serialize};

/// A key finding that survived synthesis.
///
/// The originating agent and the evidence text are carried verbatim; the
/// synthesis contract forbids summarizing evidence away.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyFinding {
    pub agent_name: String,
    pub finding: String,
    #[serde(default)]
    pub evidence: String,
    #[serde(default)]
    pub confidence: f64,
}

/// A dissenting view preserved alongside the recommendation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinorityView {
    pub agent_name: String,
    pub view: String,
    #[serde(default)]
    pub evidence: String,
}

/// Phase 3 output: the fused recommendation.
///
/// On parse failure the raw backend text is preserved as
/// `recommended_direction` rather than producing an empty result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Synthesis {
    pub recommended_direction: String,
    #[serde(default)]
    pub key_findings: Vec<KeyFinding>,
    #[serde(default)]
    pub trade_offs: Vec<String>,
    #[serde(default)]
    pub minority_views: Vec<MinorityView>,
}

impl Synthesis {
    /// A degraded synthesis carrying only free text
    pub fn from_raw(direction: impl Into<String>) -> Self {
        Self {
            recommended_direction: direction.into(),
            ..Self::default()
        }
    }

    /// Evidence strings attached to key findings
    pub fn evidence(&self) -> impl Iterator<Item = &str> {
        self.key_findings
            .iter()
            .map(|f| f.evidence.as_str())
            .filter(|e| !e.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_preserves_text() {
        let synthesis = Synthesis::from_raw("free-form backend output");
        assert_eq!(synthesis.recommended_direction, "free-form backend output");
        assert!(synthesis.key_findings.is_empty());
    }
}
