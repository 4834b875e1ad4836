//! CitationChecker - verifies that cited sources actually exist.
//!
//! The registry of known sources is pluggable via [`SourceRegistry`];
//! deployments wire in their own data catalog. [`PermissiveSources`]
//! accepts everything and is the default for unconfigured installs.

use super::EvidenceValidator;
use super::violation::Violation;
use regex::Regex;
use std::sync::LazyLock;

static SOURCE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[(VERIFIED|CORROBORATED|INDICATED):\s*([^\]]+)\]").expect("static pattern")
});

/// Lookup interface for the deployment's data catalog
pub trait SourceRegistry: Send + Sync {
    /// Whether a named source is known to the system
    fn source_exists(&self, source: &str) -> bool;

    /// Whether a specific reference within a source exists
    fn reference_exists(&self, source: &str, reference: &str) -> bool;
}

/// Registry that accepts every source and reference.
///
/// Stands in until a deployment connects its real catalog.
#[derive(Debug, Default)]
pub struct PermissiveSources;

impl SourceRegistry for PermissiveSources {
    fn source_exists(&self, _source: &str) -> bool {
        true
    }

    fn reference_exists(&self, _source: &str, _reference: &str) -> bool {
        true
    }
}

/// Validates `[VERIFIED: source:reference]` citations against a registry.
///
/// An unknown source is critical; an unknown reference inside a known
/// source is only a warning since references may lag the catalog.
pub struct CitationChecker {
    registry: Box<dyn SourceRegistry>,
}

impl CitationChecker {
    pub fn new(registry: Box<dyn SourceRegistry>) -> Self {
        Self { registry }
    }
}

impl Default for CitationChecker {
    fn default() -> Self {
        Self::new(Box::new(PermissiveSources))
    }
}

impl EvidenceValidator for CitationChecker {
    fn name(&self) -> &'static str {
        "citation_validator"
    }

    fn check(&self, text: &str) -> Vec<Violation> {
        let mut violations = Vec::new();

        for caps in SOURCE_REF.captures_iter(text) {
            let level = caps[1].to_uppercase();
            let content = caps[2].trim();

            if level != "VERIFIED" {
                continue;
            }
            let Some((source, reference)) = content.split_once(':') else {
                continue;
            };
            let source = source.trim();
            let reference = reference.trim();

            if !self.registry.source_exists(source) {
                violations.push(
                    Violation::critical(
                        "citation:unknown_source",
                        format!("Source '{source}' is not a known data source"),
                    )
                    .at(&caps[0])
                    .with_suggestion(format!("Verify that '{source}' is a valid source name")),
                );
            } else if !self.registry.reference_exists(source, reference) {
                violations.push(
                    Violation::warning(
                        "citation:unknown_reference",
                        format!("Reference '{reference}' in source '{source}' could not be verified"),
                    )
                    .at(&caps[0])
                    .with_suggestion(format!("Check that '{reference}' exists in '{source}'")),
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

    struct FixedRegistry;

    impl SourceRegistry for FixedRegistry {
        fn source_exists(&self, source: &str) -> bool {
            source == "auth_logs"
        }

        fn reference_exists(&self, _source: &str, reference: &str) -> bool {
            reference == "row_42"
        }
    }

    #[test]
    fn test_permissive_registry_accepts_everything() {
        let checker = CitationChecker::default();
        let violations = checker.check("[VERIFIED: made_up_source:ref_1] claim");
        assert!(violations.is_empty());
    }

    #[test]
    fn test_unknown_source_is_critical() {
        let checker = CitationChecker::new(Box::new(FixedRegistry));
        let violations = checker.check("[VERIFIED: dns_logs:row_42] claim");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, "citation:unknown_source");
        assert_eq!(violations[0].severity, ViolationSeverity::Critical);
    }

    #[test]
    fn test_unknown_reference_is_warning() {
        let checker = CitationChecker::new(Box::new(FixedRegistry));
        let violations = checker.check("[VERIFIED: auth_logs:row_999] claim");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, "citation:unknown_reference");
        assert_eq!(violations[0].severity, ViolationSeverity::Warning);
    }

    #[test]
    fn test_known_source_and_reference_pass() {
        let checker = CitationChecker::new(Box::new(FixedRegistry));
        assert!(checker.check("[VERIFIED: auth_logs:row_42] claim").is_empty());
    }

    #[test]
    fn test_non_verified_tags_are_not_catalog_checked() {
        let checker = CitationChecker::new(Box::new(FixedRegistry));
        assert!(checker.check("[INDICATED: dns_logs] spike").is_empty());
    }
}
