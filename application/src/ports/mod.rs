//! Port definitions
//!
//! Interfaces the application layer depends on. Adapters live in the
//! infrastructure layer.

pub mod agent;
pub mod artifact_store;
pub mod directory;
pub mod progress;
pub mod text_gen;
