//! Three-part prompt structure.
//!
//! Prompts are split into a stable system section, a per-round context
//! section, and the user message. Backends that support prompt caching
//! can reuse the system section across calls; backends that do not can
//! flatten the parts into a single string.

use serde::{Deserialize, Serialize};

/// A prompt split into cache-friendly sections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptParts {
    /// Stable instructions, identical across calls with the same role
    pub system: String,
    /// Per-round context (analyses, history, focus areas)
    #[serde(default)]
    pub context: String,
    /// The actual request
    pub user_message: String,
}

impl PromptParts {
    pub fn new(system: impl Into<String>, user_message: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            context: String::new(),
            user_message: user_message.into(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Flatten into a single string for backends without structured input
    pub fn to_flat(&self) -> String {
        let mut flat = String::with_capacity(self.total_len() + 4);
        flat.push_str(&self.system);
        if !self.context.is_empty() {
            flat.push_str("\n\n");
            flat.push_str(&self.context);
        }
        flat.push_str("\n\n");
        flat.push_str(&self.user_message);
        flat
    }

    pub fn total_len(&self) -> usize {
        self.system.len() + self.context.len() + self.user_message.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_skips_empty_context() {
        let parts = PromptParts::new("system", "question");
        assert_eq!(parts.to_flat(), "system\n\nquestion");
    }

    #[test]
    fn test_flatten_includes_context() {
        let parts = PromptParts::new("system", "question").with_context("history");
        assert_eq!(parts.to_flat(), "system\n\nhistory\n\nquestion");
    }
}
