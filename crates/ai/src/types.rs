//! Shared DTOs exchanged between the orchestrator, the model backends and the
//! HTTP layer.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_TEMPERATURE, DEFAULT_TOP_P};

/// Speaker of a conversation turn. The trainee therapist is the `user`, the
/// simulated patient is the `assistant`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A single completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub messages: Vec<ChatTurn>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, messages: Vec<ChatTurn>, max_tokens: u32) -> Self {
        Self {
            system: system.into(),
            messages,
            max_tokens,
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
        }
    }

    /// A one-shot request with a single user message.
    pub fn single(system: impl Into<String>, prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self::new(system, vec![ChatTurn::user(prompt)], max_tokens)
    }
}

/// Everything the frontend needs to begin a practice session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSetup {
    pub system_prompt: String,
    pub video_filename: String,
    pub backstory: String,
}

/// Supervisor feedback on one therapist turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurnFeedback {
    pub therapist_message: String,
    pub patient_response: String,
    /// Raw supervisor reply, or a fallback notice when analysis failed.
    pub improvement: String,
    pub needs_improvement: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Result of the scoring pipeline for a completed session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceReport {
    pub report: String,
    pub improvements: Vec<TurnFeedback>,
}
