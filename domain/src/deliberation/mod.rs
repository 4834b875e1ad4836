//! Deliberation data model
//!
//! Immutable value objects produced by each phase of a round, plus the
//! parsing helpers that recover structure from free-form backend output.

pub mod analysis;
pub mod challenge;
pub mod parsing;
pub mod result;
pub mod strategy;
pub mod synthesis;
pub mod task;
pub mod vote;
