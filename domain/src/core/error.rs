//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("No agents configured for deliberation")]
    NoAgents,

    #[error("Invalid task: {0}")]
    InvalidTask(String),

    #[error("Structured response did not parse: {0}")]
    ParseFailure(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            DomainError::NoAgents.to_string(),
            "No agents configured for deliberation"
        );
        assert_eq!(
            DomainError::InvalidTask("empty content".to_string()).to_string(),
            "Invalid task: empty content"
        );
    }
}
