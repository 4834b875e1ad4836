//! Violation and validation outcome types

use serde::{Deserialize, Serialize};

/// Severity of an enforcement violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationSeverity {
    /// Counts toward the rejection threshold
    Critical,
    /// Attached as a flag, never rejects on its own
    Warning,
}

/// A single enforcement finding. Never mutated once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Rule identifier, e.g. `banned_pattern:speculation`
    pub rule: String,
    pub severity: ViolationSeverity,
    /// Human-readable explanation of what is wrong
    pub message: String,
    /// The offending text span
    #[serde(default)]
    pub location: String,
    /// How to fix it
    #[serde(default)]
    pub suggestion: String,
}

impl Violation {
    pub fn critical(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            severity: ViolationSeverity::Critical,
            message: message.into(),
            location: String::new(),
            suggestion: String::new(),
        }
    }

    pub fn warning(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            severity: ViolationSeverity::Warning,
            message: message.into(),
            location: String::new(),
            suggestion: String::new(),
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = suggestion.into();
        self
    }

    pub fn is_critical(&self) -> bool {
        self.severity == ViolationSeverity::Critical
    }
}

/// Outcome of running the enforcement chain over a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationOutcome {
    /// No issues found
    Accepted,
    /// Violations exist but stay below the rejection threshold
    Challenged,
    /// Critical violations reached the threshold; terminal only when
    /// repair is disabled or exhausted
    Rejected,
}

/// Pooled result of the enforcement chain plus any repaired text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub outcome: ValidationOutcome,
    #[serde(default)]
    pub violations: Vec<Violation>,
    /// Rewritten text when the repair loop produced one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_content: Option<String>,
}

impl ValidationReport {
    /// Derive the outcome from pooled violations and the rejection threshold
    pub fn from_violations(violations: Vec<Violation>, rejection_threshold: usize) -> Self {
        let critical = violations.iter().filter(|v| v.is_critical()).count();
        let outcome = if critical >= rejection_threshold {
            ValidationOutcome::Rejected
        } else if !violations.is_empty() {
            ValidationOutcome::Challenged
        } else {
            ValidationOutcome::Accepted
        };
        Self {
            outcome,
            violations,
            corrected_content: None,
        }
    }

    pub fn with_corrected_content(mut self, content: impl Into<String>) -> Self {
        self.corrected_content = Some(content.into());
        self
    }

    pub fn critical_count(&self) -> usize {
        self.violations.iter().filter(|v| v.is_critical()).count()
    }

    pub fn is_accepted(&self) -> bool {
        self.outcome == ValidationOutcome::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_violation_counts() {
        let clean = ValidationReport::from_violations(vec![], 3);
        assert_eq!(clean.outcome, ValidationOutcome::Accepted);

        let warned = ValidationReport::from_violations(
            vec![Violation::warning("r", "m")],
            3,
        );
        assert_eq!(warned.outcome, ValidationOutcome::Challenged);

        let rejected = ValidationReport::from_violations(
            vec![
                Violation::critical("r", "m"),
                Violation::critical("r", "m"),
                Violation::critical("r", "m"),
            ],
            3,
        );
        assert_eq!(rejected.outcome, ValidationOutcome::Rejected);
        assert_eq!(rejected.critical_count(), 3);
    }

    #[test]
    fn test_two_criticals_stay_challenged_at_default_threshold() {
        let report = ValidationReport::from_violations(
            vec![Violation::critical("r", "m"), Violation::critical("r", "m")],
            3,
        );
        assert_eq!(report.outcome, ValidationOutcome::Challenged);
    }
}
