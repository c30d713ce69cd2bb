//! External generative model integration
//!
//! Features:
//! - Chat message and prompt building types
//! - Tool (function-calling) declarations and parsed invocations
//! - OpenAI-compatible HTTP backend with timeout and retry

pub mod backend;
pub mod prompt;

pub use backend::{
    ChatBackend, ChatResponse, FinishReason, LlmConfig, OpenAiBackend, ToolCall, ToolDefinition,
};
pub use prompt::{Message, PromptBuilder, Role};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Generation error: {0}")]
    Generation(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Quota or rate limit exceeded: {0}")]
    Quota(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl LlmError {
    /// Transient errors worth retrying; everything else fails fast.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Network(_) | LlmError::Timeout)
    }
}
