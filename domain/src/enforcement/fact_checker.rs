//! FactChecker - scans responses for banned speculation and opinion language.
//!
//! Banned categories:
//!   - `numeric_confidence`: "90% confident", "confidence: 0.85", "HIGH confidence"
//!   - `speculation`: "likely indicates", "probably", "this suggests", "it appears that"
//!   - `opinion`: "I think", "I believe", "in my opinion"
//!   - `hedging`: "this could mean", "seems to", "may indicate", "might be"
//!
//! The standard is testimony-grade: "VERIFIED in source row 456" holds up,
//! "85% confident" does not.

use super::EvidenceValidator;
use super::violation::{Violation, ViolationSeverity};
use regex::Regex;
use std::sync::LazyLock;

struct BannedPattern {
    category: &'static str,
    pattern: Regex,
    message: &'static str,
    severity: ViolationSeverity,
}

fn banned(
    category: &'static str,
    pattern: &str,
    message: &'static str,
    severity: ViolationSeverity,
) -> BannedPattern {
    BannedPattern {
        category,
        pattern: Regex::new(&format!("(?i){pattern}")).expect("static pattern"),
        message,
        severity,
    }
}

static BANNED_PATTERNS: LazyLock<Vec<BannedPattern>> = LazyLock::new(|| {
    use ViolationSeverity::{Critical, Warning};
    vec![
        banned(
            "numeric_confidence",
            r"\d+%\s*confident",
            "No percentage confidence scores",
            Critical,
        ),
        banned(
            "numeric_confidence",
            r"confidence[:\s]+0?\.\d+",
            "No decimal confidence values",
            Critical,
        ),
        banned(
            "numeric_confidence",
            r"\b(HIGH|MEDIUM|LOW)\s+confidence\b",
            "No categorical confidence labels",
            Critical,
        ),
        banned(
            "speculation",
            r"\blikely\s+indicates?\b",
            "No speculation -- cite evidence instead",
            Critical,
        ),
        banned(
            "speculation",
            r"\bprobably\b",
            "No speculation -- state what the evidence shows",
            Critical,
        ),
        banned(
            "speculation",
            r"\bthis\s+suggests\b",
            "No speculation -- use evidence levels (VERIFIED/INDICATED)",
            Critical,
        ),
        banned(
            "speculation",
            r"\bit\s+appears\s+that\b",
            "No speculation -- state facts with evidence",
            Critical,
        ),
        banned(
            "speculation",
            r"\bstrongly\s+suggests?\b",
            "No speculation -- use CORROBORATED if multiple sources agree",
            Warning,
        ),
        banned(
            "opinion",
            r"\bI\s+think\b",
            "No opinions -- only evidence-based findings",
            Critical,
        ),
        banned(
            "opinion",
            r"\bI\s+believe\b",
            "No opinions -- cite what the data shows",
            Critical,
        ),
        banned(
            "opinion",
            r"\bin\s+my\s+opinion\b",
            "No opinions -- use evidence levels",
            Critical,
        ),
        banned(
            "hedging",
            r"\bthis\s+could\s+mean\b",
            "No hedging -- use [POSSIBLE] if uncertain",
            Warning,
        ),
        banned(
            "hedging",
            r"\bseems?\s+to\b",
            "No hedging -- state what the evidence shows",
            Warning,
        ),
        banned(
            "hedging",
            r"\bmay\s+indicate\b",
            "No hedging -- use [INDICATED] with source name",
            Warning,
        ),
        banned(
            "hedging",
            r"\bmight\s+be\b",
            "No hedging -- use [POSSIBLE] if unconfirmed",
            Warning,
        ),
        banned(
            "hedging",
            r"\bcould\s+be\b",
            "No hedging -- use [POSSIBLE] if unconfirmed",
            Warning,
        ),
    ]
});

fn suggest_fix(category: &str, matched: &str) -> String {
    match category {
        "numeric_confidence" => format!(
            "Remove '{matched}'. Use evidence levels instead: [VERIFIED: source:ref], \
             [CORROBORATED: src1 + src2], [INDICATED: source], or [POSSIBLE]"
        ),
        "speculation" => format!(
            "Replace '{matched}' with a factual statement. If uncertain, use \
             [INDICATED: source] or [POSSIBLE]"
        ),
        "opinion" => format!(
            "Replace '{matched}' with what the evidence shows. Cite the specific \
             source and reference."
        ),
        "hedging" => format!(
            "Replace '{matched}' with an evidence level tag: [INDICATED: source] \
             if data exists, [POSSIBLE] if not"
        ),
        _ => format!("Remove '{matched}' and cite evidence"),
    }
}

/// Scans response text for banned speculation and opinion patterns.
///
/// # Example
///
/// ```
/// use roundtable_domain::enforcement::EvidenceValidator;
/// use roundtable_domain::FactChecker;
///
/// let violations = FactChecker.check("The data probably indicates a breach");
/// assert!(!violations.is_empty()); // "probably" is banned
/// ```
#[derive(Debug, Default)]
pub struct FactChecker;

impl EvidenceValidator for FactChecker {
    fn name(&self) -> &'static str {
        "fact_checker"
    }

    fn check(&self, text: &str) -> Vec<Violation> {
        let mut violations = Vec::new();
        for entry in BANNED_PATTERNS.iter() {
            for m in entry.pattern.find_iter(text) {
                let violation = Violation {
                    rule: format!("banned_pattern:{}", entry.category),
                    severity: entry.severity,
                    message: entry.message.to_string(),
                    location: m.as_str().to_string(),
                    suggestion: suggest_fix(entry.category, m.as_str()),
                };
                violations.push(violation);
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_confidence_is_critical() {
        let violations = FactChecker.check("I am 95% confident this is a vulnerability");
        let numeric: Vec<_> = violations
            .iter()
            .filter(|v| v.rule == "banned_pattern:numeric_confidence")
            .collect();
        assert_eq!(numeric.len(), 1);
        assert_eq!(numeric[0].severity, ViolationSeverity::Critical);
        assert_eq!(numeric[0].location, "95% confident");
    }

    #[test]
    fn test_speculation_flagged() {
        let violations = FactChecker.check("This suggests the attacker pivoted");
        assert!(
            violations
                .iter()
                .any(|v| v.rule == "banned_pattern:speculation" && v.is_critical())
        );
    }

    #[test]
    fn test_opinion_flagged() {
        let violations = FactChecker.check("I think the cause is DNS");
        assert!(
            violations
                .iter()
                .any(|v| v.rule == "banned_pattern:opinion")
        );
    }

    #[test]
    fn test_hedging_is_warning() {
        let violations = FactChecker.check("this could mean a misconfiguration");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, ViolationSeverity::Warning);
    }

    #[test]
    fn test_clean_text_has_no_violations() {
        let violations =
            FactChecker.check("[VERIFIED: auth_logs:row_42] Login from revoked key at 03:14");
        assert!(violations.is_empty());
    }

    #[test]
    fn test_case_insensitive_matching() {
        let violations = FactChecker.check("PROBABLY a false positive");
        assert!(!violations.is_empty());
    }

    #[test]
    fn test_suggestions_reference_evidence_tags() {
        let violations = FactChecker.check("might be the firewall");
        assert!(violations[0].suggestion.contains("[POSSIBLE]"));
    }
}
