//! Domain layer for roundtable
//!
//! This crate contains the deliberation data model and the pure business
//! rules that operate on it. It has no dependencies on infrastructure or
//! transport concerns.
//!
//! # Core Concepts
//!
//! ## Deliberation
//!
//! A deliberation (or "round") drives a set of independent agents through
//! four phases over a single [`Task`]:
//!
//! - **Strategy**: the coordinator plans before dispatching
//! - **Independent Analysis**: agents analyze in parallel, in isolation
//! - **Challenge**: agents critique each other through the coordinator
//! - **Synthesis + Voting**: findings are fused and the roster votes
//!
//! ## Evidence Enforcement
//!
//! Agent output is held to an evidence standard: no speculation, no
//! opinions, no invented confidence scores. Findings carry evidence tags
//! (`[VERIFIED: source:ref]`, `[CORROBORATED: a + b]`, `[INDICATED: src]`,
//! `[POSSIBLE]`) that the enforcement validators check structurally.

pub mod core;
pub mod deliberation;
pub mod enforcement;
pub mod prompt;

// Re-export commonly used types
pub use core::error::DomainError;
pub use deliberation::{
    analysis::{Analysis, Observation, Recommendation, Severity},
    challenge::{Challenge, ChallengePoint, Concession},
    parsing::{extract_json_object, parse_observations, parse_strategy, parse_synthesis},
    result::{DeliberationResult, Phase},
    strategy::StrategyPlan,
    synthesis::{KeyFinding, MinorityView, Synthesis},
    task::Task,
    vote::Vote,
};
pub use enforcement::{
    citation::{CitationChecker, PermissiveSources, SourceRegistry},
    evidence_tags::EvidenceTagChecker,
    fact_checker::FactChecker,
    numeric::{GroundTruthProvider, NoGroundTruth, NumericClaimChecker},
    violation::{ValidationOutcome, ValidationReport, Violation, ViolationSeverity},
};
pub use prompt::{parts::PromptParts, template::DeliberationPrompts};
