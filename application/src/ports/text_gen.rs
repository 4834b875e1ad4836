//! Text generation port
//!
//! Defines how the application layer talks to an LLM backend. The
//! coordinator uses it for strategy, synthesis, enforcement rewrites,
//! and chat; agents may use it for their own reasoning.

use async_trait::async_trait;
use roundtable_domain::PromptParts;
use thiserror::Error;

/// Errors that can occur during backend calls
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// Token accounting for a single generation
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// A completed generation
#[derive(Debug, Clone)]
pub struct Generation {
    pub content: String,
    pub usage: TokenUsage,
}

impl Generation {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: TokenUsage::default(),
        }
    }
}

/// Backend for text generation
///
/// `role` tags the call for logging and backend-side routing
/// ("synthesis", "cross_check", "enforcement_rewrite", "chat_synthesis").
#[async_trait]
pub trait TextGenBackend: Send + Sync {
    async fn generate(
        &self,
        prompt: &PromptParts,
        role: &str,
        temperature: f64,
    ) -> Result<Generation, BackendError>;
}
