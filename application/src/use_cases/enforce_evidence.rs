//! Evidence enforcement pipeline
//!
//! Runs the validator chain over agent output and drives the
//! reject-and-rewrite loop. Rejected responses get a correction prompt
//! and are retried up to `max_retries` times; if still failing they pass
//! through as challenged with the violations attached, so agent work is
//! never silently dropped.

use crate::config::EnforcementConfig;
use crate::ports::text_gen::TextGenBackend;
use roundtable_domain::enforcement::EvidenceValidator;
use roundtable_domain::{
    CitationChecker, DeliberationPrompts, EvidenceTagChecker, FactChecker, NumericClaimChecker,
    ValidationOutcome, ValidationReport, Violation,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Orchestrates the validator chain with reject-and-rewrite
pub struct EvidenceEnforcementPipeline {
    validators: Vec<Box<dyn EvidenceValidator>>,
    backend: Option<Arc<dyn TextGenBackend>>,
    config: EnforcementConfig,
}

impl EvidenceEnforcementPipeline {
    /// Pipeline with the standard chain: fact checking, evidence tag
    /// structure, citation lookup, numeric claims.
    pub fn new(config: EnforcementConfig) -> Self {
        Self {
            validators: vec![
                Box::new(FactChecker),
                Box::new(EvidenceTagChecker),
                Box::new(CitationChecker::default()),
                Box::new(NumericClaimChecker::default()),
            ],
            backend: None,
            config,
        }
    }

    /// Replace the validator chain (custom source registry, ground truth)
    pub fn with_validators(mut self, validators: Vec<Box<dyn EvidenceValidator>>) -> Self {
        self.validators = validators;
        self
    }

    /// Enable the rewrite loop. Without a backend, rejection is terminal.
    pub fn with_backend(mut self, backend: Arc<dyn TextGenBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    fn run_chain(&self, text: &str) -> Vec<Violation> {
        self.validators
            .iter()
            .flat_map(|v| v.check(text))
            .collect()
    }

    /// Validate response text, rewriting when the backend is available.
    ///
    /// Idempotent on accepted text: a response with no violations comes
    /// back accepted and untouched, every time.
    pub async fn validate(&self, agent_name: &str, text: &str) -> ValidationReport {
        let mut violations = self.run_chain(text);
        let mut critical = violations.iter().filter(|v| v.is_critical()).count();

        if critical < self.config.rejection_threshold {
            return ValidationReport::from_violations(violations, self.config.rejection_threshold);
        }

        let Some(backend) = &self.backend else {
            return ValidationReport::from_violations(violations, self.config.rejection_threshold);
        };

        let mut current = text.to_string();
        for attempt in 1..=self.config.max_retries {
            info!(
                agent = agent_name,
                critical, attempt, "critical violations, attempting rewrite"
            );
            let prompt = DeliberationPrompts::correction(&current, &violations);
            let corrected = match backend.generate(&prompt, "enforcement_rewrite", 0.1).await {
                Ok(generation) if !generation.content.is_empty() => generation.content,
                Ok(_) => continue,
                Err(e) => {
                    warn!(agent = agent_name, error = %e, "rewrite call failed");
                    continue;
                }
            };

            let recheck = self.run_chain(&corrected);
            let recheck_critical = recheck.iter().filter(|v| v.is_critical()).count();
            if recheck_critical < self.config.rejection_threshold {
                info!(
                    agent = agent_name,
                    remaining = recheck_critical,
                    "rewrite accepted"
                );
                return ValidationReport::from_violations(
                    recheck,
                    self.config.rejection_threshold,
                )
                .with_corrected_content(corrected);
            }
            violations = recheck;
            critical = recheck_critical;
            current = corrected;
        }

        warn!(
            agent = agent_name,
            attempts = self.config.max_retries,
            "rewrite exhausted, passing with warnings"
        );
        ValidationReport {
            outcome: ValidationOutcome::Challenged,
            violations,
            corrected_content: Some(current),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::text_gen::{BackendError, Generation};
    use async_trait::async_trait;
    use roundtable_domain::PromptParts;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedBackend {
        reply: String,
        calls: AtomicUsize,
    }

    impl FixedBackend {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TextGenBackend for FixedBackend {
        async fn generate(
            &self,
            _prompt: &PromptParts,
            _role: &str,
            _temperature: f64,
        ) -> Result<Generation, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Generation::new(self.reply.clone()))
        }
    }

    const BAD_TEXT: &str =
        "I think this is probably an intrusion. I am 95% confident it might be real.";
    const CLEAN_TEXT: &str = "[VERIFIED: auth_logs:row_42] Login from revoked key at 03:14.";

    #[tokio::test]
    async fn test_clean_text_accepted_without_backend_calls() {
        let backend = Arc::new(FixedBackend::new("unused"));
        let pipeline = EvidenceEnforcementPipeline::new(EnforcementConfig::default())
            .with_backend(backend.clone());

        let report = pipeline.validate("analyst", CLEAN_TEXT).await;
        assert!(report.is_accepted());
        assert!(report.corrected_content.is_none());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_accepted_text_is_idempotent() {
        let pipeline = EvidenceEnforcementPipeline::new(EnforcementConfig::default());
        let first = pipeline.validate("analyst", CLEAN_TEXT).await;
        let second = pipeline.validate("analyst", CLEAN_TEXT).await;
        assert!(first.is_accepted());
        assert!(second.is_accepted());
        assert!(second.violations.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_without_backend_is_terminal() {
        let pipeline = EvidenceEnforcementPipeline::new(EnforcementConfig::default());
        let report = pipeline.validate("analyst", BAD_TEXT).await;
        assert_eq!(report.outcome, ValidationOutcome::Rejected);
        assert!(report.critical_count() >= 3);
        assert!(report.corrected_content.is_none());
    }

    #[tokio::test]
    async fn test_successful_rewrite_returns_corrected_content() {
        let backend = Arc::new(FixedBackend::new(CLEAN_TEXT));
        let pipeline = EvidenceEnforcementPipeline::new(EnforcementConfig::default())
            .with_backend(backend.clone());

        let report = pipeline.validate("analyst", BAD_TEXT).await;
        assert!(report.is_accepted());
        assert_eq!(report.corrected_content.as_deref(), Some(CLEAN_TEXT));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_rewrite_degrades_to_challenged() {
        // Backend keeps returning the same bad text
        let backend = Arc::new(FixedBackend::new(BAD_TEXT));
        let pipeline = EvidenceEnforcementPipeline::new(EnforcementConfig::default())
            .with_backend(backend.clone());

        let report = pipeline.validate("analyst", BAD_TEXT).await;
        assert_eq!(report.outcome, ValidationOutcome::Challenged);
        assert!(!report.violations.is_empty());
        assert_eq!(
            backend.calls.load(Ordering::SeqCst),
            EnforcementConfig::default().max_retries as usize
        );
    }

    #[tokio::test]
    async fn test_two_criticals_stay_below_threshold() {
        let pipeline = EvidenceEnforcementPipeline::new(EnforcementConfig::default());
        let report = pipeline
            .validate("analyst", "I think this is real. It is probably fine.")
            .await;
        assert_eq!(report.outcome, ValidationOutcome::Challenged);
    }
}
