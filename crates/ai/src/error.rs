//! Language-model error types.

use thiserror::Error;

/// Errors raised while talking to the language model or preparing its input.
#[derive(Debug, Error)]
pub enum AiError {
    /// The caller sent a conversation the model cannot continue.
    #[error("{0}")]
    InvalidInput(String),

    /// No model backend is configured (e.g. missing AWS region).
    #[error("Model backend not ready: {0}")]
    NotConfigured(String),

    /// The provider throttled the request.
    #[error("Rate limit: {0}")]
    RateLimited(String),

    /// The request timed out before the provider answered.
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Provider-side failure.
    #[error("{0}")]
    Provider(String),

    /// The provider answered without a text block.
    #[error("No text in response")]
    EmptyResponse,

    /// The system prompt leaves no room for conversation history.
    #[error("{0}")]
    ContextOverflow(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AiError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            AiError::InvalidInput(_) => "INVALID_INPUT",
            AiError::NotConfigured(_) => "NOT_CONFIGURED",
            AiError::RateLimited(_) => "RATE_LIMITED",
            AiError::Timeout(_) => "TIMEOUT",
            AiError::Provider(_) => "PROVIDER_ERROR",
            AiError::EmptyResponse => "EMPTY_RESPONSE",
            AiError::ContextOverflow(_) => "CONTEXT_OVERFLOW",
            AiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
