//! EvidenceTagChecker - validates the structure of evidence level tags.
//!
//! Four evidence levels, strongest to weakest:
//!   - `[VERIFIED: source:reference]` direct proof at a specific location
//!   - `[CORROBORATED: source_1 + source_2]` two or more independent sources agree
//!   - `[INDICATED: source_name]` single source suggests a pattern, gaps exist
//!   - `[POSSIBLE]` followed by what would confirm or deny

use super::EvidenceValidator;
use super::violation::Violation;
use regex::Regex;
use std::sync::LazyLock;

static VERIFIED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[VERIFIED:\s*([^\]]+)\]").expect("static pattern"));
static CORROBORATED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[CORROBORATED:\s*([^\]]+)\]").expect("static pattern"));
static INDICATED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[INDICATED:\s*([^\]]*)\]").expect("static pattern"));

/// Checks that every evidence tag in a response is well formed.
///
/// A `[VERIFIED]` tag without a `source:reference` pair is a critical
/// violation; the tag claims the strongest evidence level and must point
/// at an exact location.
#[derive(Debug, Default)]
pub struct EvidenceTagChecker;

impl EvidenceValidator for EvidenceTagChecker {
    fn name(&self) -> &'static str {
        "evidence_levels"
    }

    fn check(&self, text: &str) -> Vec<Violation> {
        let mut violations = Vec::new();

        for caps in VERIFIED.captures_iter(text) {
            let content = caps[1].trim();
            if !content.contains(':') {
                violations.push(
                    Violation::critical(
                        "evidence_level:verified_missing_reference",
                        "VERIFIED claims must cite source:reference (e.g. [VERIFIED: logs:row_42])",
                    )
                    .at(&caps[0])
                    .with_suggestion(format!(
                        "Add a specific reference: [VERIFIED: {content}:reference]"
                    )),
                );
            }
        }

        for caps in CORROBORATED.captures_iter(text) {
            let content = caps[1].trim();
            let sources = content
                .split('+')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .count();
            if sources < 2 {
                violations.push(
                    Violation::critical(
                        "evidence_level:corroborated_insufficient_sources",
                        "CORROBORATED claims must name 2+ sources separated by + \
                         (e.g. [CORROBORATED: logs + alerts])",
                    )
                    .at(&caps[0])
                    .with_suggestion(format!(
                        "Add a second source: [CORROBORATED: {content} + another_source]"
                    )),
                );
            }
        }

        for caps in INDICATED.captures_iter(text) {
            if caps[1].trim().is_empty() {
                violations.push(
                    Violation::warning(
                        "evidence_level:indicated_missing_source",
                        "INDICATED claims should name the source (e.g. [INDICATED: access_logs])",
                    )
                    .at(&caps[0])
                    .with_suggestion("Name the data source: [INDICATED: source_name]"),
                );
            }
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enforcement::violation::ViolationSeverity;

    #[test]
    fn test_well_formed_verified_tag_passes() {
        let violations = EvidenceTagChecker.check("[VERIFIED: logs:row_42] key revoked");
        assert!(violations.is_empty());
    }

    #[test]
    fn test_verified_without_reference_is_one_critical() {
        let violations = EvidenceTagChecker.check("[VERIFIED: justsource] something happened");
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].rule,
            "evidence_level:verified_missing_reference"
        );
        assert_eq!(violations[0].severity, ViolationSeverity::Critical);
        assert_eq!(violations[0].location, "[VERIFIED: justsource]");
    }

    #[test]
    fn test_corroborated_needs_two_sources() {
        let violations = EvidenceTagChecker.check("[CORROBORATED: access_logs] seen twice");
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].rule,
            "evidence_level:corroborated_insufficient_sources"
        );

        let ok = EvidenceTagChecker.check("[CORROBORATED: access_logs + vpn_logs] seen twice");
        assert!(ok.is_empty());
    }

    #[test]
    fn test_indicated_empty_source_is_warning() {
        let violations = EvidenceTagChecker.check("[INDICATED: ] traffic spike");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, ViolationSeverity::Warning);
    }

    #[test]
    fn test_possible_tag_is_always_valid() {
        let violations = EvidenceTagChecker.check("[POSSIBLE] lateral movement, need DNS logs");
        assert!(violations.is_empty());
    }

    #[test]
    fn test_tags_matched_case_insensitively() {
        let violations = EvidenceTagChecker.check("[verified: nocolon]");
        assert_eq!(violations.len(), 1);
    }
}
