//! OpenAI-compatible text generation backend
//!
//! Works against any chat completions endpoint (OpenAI, Ollama, Azure,
//! Together, vLLM). The engine never generates text itself; this adapter
//! is the one place an LLM API is spoken.

use crate::config::FileBackendConfig;
use async_trait::async_trait;
use roundtable_application::ports::text_gen::{
    BackendError, Generation, TextGenBackend, TokenUsage,
};
use roundtable_domain::PromptParts;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Deserialize, Default)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize, Default)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

/// Chat completions client implementing the text generation port
pub struct OpenAiBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    max_tokens: u32,
}

impl OpenAiBackend {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        let base_url = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            max_tokens: 4096,
        })
    }

    pub fn from_config(config: &FileBackendConfig) -> Result<Self, BackendError> {
        let api_key = std::env::var("ROUNDTABLE_API_KEY")
            .ok()
            .or_else(|| config.api_key.clone());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl TextGenBackend for OpenAiBackend {
    async fn generate(
        &self,
        prompt: &PromptParts,
        role: &str,
        temperature: f64,
    ) -> Result<Generation, BackendError> {
        let mut messages = Vec::with_capacity(3);
        if !prompt.system.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: &prompt.system,
            });
        }
        let context_message;
        if !prompt.context.is_empty() {
            context_message = format!("Context:\n{}", prompt.context);
            messages.push(ChatMessage {
                role: "user",
                content: &context_message,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &prompt.user_message,
        });

        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature,
            max_tokens: self.max_tokens,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout
            } else {
                BackendError::Connection(e.to_string())
            }
        })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(BackendError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::RequestFailed(format!(
                "{status}: {}",
                body.chars().take(500).collect::<String>()
            )));
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Other(format!("malformed response: {e}")))?;

        let content = payload
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        let usage = payload.usage.unwrap_or_default();

        debug!(
            role,
            model = %self.model,
            output_tokens = usage.completion_tokens,
            "generation complete"
        );

        Ok(Generation {
            content,
            usage: TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_stripped() {
        let backend = OpenAiBackend::new("http://localhost:11434/v1/", "llama3", None).unwrap();
        assert_eq!(backend.base_url, "http://localhost:11434/v1");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_connection_error() {
        let backend = OpenAiBackend::new("http://127.0.0.1:1/v1", "llama3", None).unwrap();
        let result = backend
            .generate(&PromptParts::new("s", "hello"), "test", 0.2)
            .await;
        assert!(matches!(result, Err(BackendError::Connection(_))));
    }

    #[test]
    fn test_response_parsing_tolerates_missing_usage() {
        let payload: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "hi"}}]}"#,
        )
        .unwrap();
        assert_eq!(payload.choices[0].message.content, "hi");
        assert!(payload.usage.is_none());
    }
}
