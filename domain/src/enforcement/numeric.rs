//! NumericClaimChecker - validates numeric claims against computed ground truth.
//!
//! Ground truth is pluggable via [`GroundTruthProvider`]; deployments wire
//! in their computed metrics. [`NoGroundTruth`] skips every check and is
//! the default for unconfigured installs.

use super::EvidenceValidator;
use super::violation::Violation;
use regex::Regex;
use std::sync::LazyLock;

// Matches "error rate was 12.3%" or "failed logins: 47 events"
static NUMERIC_CLAIM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)([a-z][a-z_ ]{2,40}?)\s*(?:was|is|=|:)\s*(\d+(?:\.\d+)?)\s*(%|instances?|occurrences?|events?|records?|times)?",
    )
    .expect("static pattern")
});

/// Lookup interface for computed metric values
pub trait GroundTruthProvider: Send + Sync {
    /// Computed value for a metric name, or `None` if unknown
    fn get_value(&self, metric: &str) -> Option<f64>;
}

/// Provider that knows nothing; every claim is skipped
#[derive(Debug, Default)]
pub struct NoGroundTruth;

impl GroundTruthProvider for NoGroundTruth {
    fn get_value(&self, _metric: &str) -> Option<f64> {
        None
    }
}

/// Compares numeric claims in text against a ground truth provider.
///
/// Claims about metrics the provider does not know are skipped; a wrong
/// number about a known metric is a critical violation.
pub struct NumericClaimChecker {
    provider: Box<dyn GroundTruthProvider>,
    /// Relative tolerance; claims within it are accepted
    tolerance: f64,
}

impl NumericClaimChecker {
    pub fn new(provider: Box<dyn GroundTruthProvider>) -> Self {
        Self {
            provider,
            tolerance: 0.01,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    fn matches_truth(&self, claimed: f64, truth: f64) -> bool {
        let scale = truth.abs().max(1.0);
        (claimed - truth).abs() <= self.tolerance * scale
    }
}

impl Default for NumericClaimChecker {
    fn default() -> Self {
        Self::new(Box::new(NoGroundTruth))
    }
}

/// Lowercase, drop leading articles, join words with underscores so
/// "The error rate" resolves the `error_rate` metric
fn normalize_metric(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split_whitespace()
        .skip_while(|w| matches!(*w, "the" | "a" | "an"))
        .collect::<Vec<_>>()
        .join("_")
}

impl EvidenceValidator for NumericClaimChecker {
    fn name(&self) -> &'static str {
        "math_verifier"
    }

    fn check(&self, text: &str) -> Vec<Violation> {
        let mut violations = Vec::new();

        for caps in NUMERIC_CLAIM.captures_iter(text) {
            let metric = normalize_metric(&caps[1]);
            let Ok(claimed) = caps[2].parse::<f64>() else {
                continue;
            };
            let Some(truth) = self.provider.get_value(&metric) else {
                continue;
            };
            if !self.matches_truth(claimed, truth) {
                violations.push(
                    Violation::critical(
                        "numeric:mismatch",
                        format!(
                            "Claimed {claimed} for '{metric}' but computed value is {truth}"
                        ),
                    )
                    .at(&caps[0])
                    .with_suggestion(format!("Use the computed value {truth} for '{metric}'")),
                );
            }
        }

        violations
    }
}
