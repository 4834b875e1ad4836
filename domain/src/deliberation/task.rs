//! Task - the immutable input unit of a deliberation

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Input to a deliberation round.
///
/// Created once per request and read-only thereafter, except that the
/// coordinator may append derived context (e.g. per-agent focus hints)
/// before dispatching to agents.
///
/// # Example
///
/// ```
/// use roundtable_domain::Task;
///
/// let task = Task::new("task-42", "Review the auth flow for replay attacks")
///     .with_constraint("No changes to the wire format")
///     .with_context("service", serde_json::json!("gateway"));
/// assert_eq!(task.constraints.len(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier (also keys the artifact store)
    pub id: String,
    /// Free-text task content
    pub content: String,
    /// Structured context map
    #[serde(default)]
    pub context: BTreeMap<String, serde_json::Value>,
    /// Constraint strings the round must respect
    #[serde(default)]
    pub constraints: Vec<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            context: BTreeMap::new(),
            constraints: Vec::new(),
        }
    }

    /// Add a context entry
    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    /// Add a constraint string
    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraints.push(constraint.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_builder() {
        let task = Task::new("t1", "analyze logs")
            .with_context("env", serde_json::json!("prod"))
            .with_constraint("read-only access");

        assert_eq!(task.id, "t1");
        assert_eq!(task.context["env"], "prod");
        assert_eq!(task.constraints, vec!["read-only access".to_string()]);
    }

    #[test]
    fn test_task_serializes_with_wire_field_names() {
        let task = Task::new("t1", "check");
        let value = serde_json::to_value(&task).unwrap();
        assert!(value.get("id").is_some());
        assert!(value.get("content").is_some());
        assert!(value.get("context").is_some());
        assert!(value.get("constraints").is_some());
    }
}
