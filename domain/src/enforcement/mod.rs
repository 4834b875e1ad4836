//! Evidence enforcement rules
//!
//! A fixed, ordered chain of stateless validators that scan the flattened
//! text of an agent's observations for ungrounded language and malformed
//! citations. The chain itself is pure; the reject-and-rewrite loop that
//! consumes it lives in the application layer.

pub mod citation;
pub mod evidence_tags;
pub mod fact_checker;
pub mod numeric;
pub mod violation;

use violation::Violation;

/// A single stateless validator in the enforcement chain
pub trait EvidenceValidator: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Scan text and return every violation found
    fn check(&self, text: &str) -> Vec<Violation>;
}
