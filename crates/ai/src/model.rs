//! Language-model seam.
//!
//! The orchestrator only ever sees `LanguageModelTrait`. Production wires in
//! `BedrockModel`; a server without AWS credentials gets `UnconfiguredModel`;
//! tests use `ScriptedModel`.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AiError;
use crate::types::CompletionRequest;

/// A text-completion backend.
#[async_trait]
pub trait LanguageModelTrait: Send + Sync {
    /// Run one completion and return the first text block of the reply.
    async fn complete(&self, request: CompletionRequest) -> Result<String, AiError>;

    /// Whether calls can succeed at all. Used by health reporting.
    fn is_ready(&self) -> bool {
        true
    }
}

/// Backend used when no provider could be configured at startup.
pub struct UnconfiguredModel {
    reason: String,
}

impl UnconfiguredModel {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl LanguageModelTrait for UnconfiguredModel {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, AiError> {
        Err(AiError::NotConfigured(self.reason.clone()))
    }

    fn is_ready(&self) -> bool {
        false
    }
}

// ============================================================================
// Scripted Model for Testing
// ============================================================================

type Responder = dyn Fn(&CompletionRequest) -> Result<String, AiError> + Send + Sync;

/// A deterministic backend that records every request it receives.
///
/// Replies come from a queue of scripted results first, then from the
/// responder closure.
pub struct ScriptedModel {
    queued: Mutex<VecDeque<Result<String, AiError>>>,
    responder: Box<Responder>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    /// Answer every request through `responder`.
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<String, AiError> + Send + Sync + 'static,
    {
        Self {
            queued: Mutex::new(VecDeque::new()),
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with the same text.
    pub fn with_reply(reply: &str) -> Self {
        let reply = reply.to_string();
        Self::new(move |_| Ok(reply.clone()))
    }

    /// Queue one result ahead of the responder.
    pub fn push_result(&self, result: Result<String, AiError>) {
        if let Ok(mut queued) = self.queued.lock() {
            queued.push_back(result);
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LanguageModelTrait for ScriptedModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String, AiError> {
        let queued = self
            .queued
            .lock()
            .map_err(|_| AiError::Internal("Scripted model lock poisoned".into()))?
            .pop_front();
        let result = match queued {
            Some(result) => result,
            None => (self.responder)(&request),
        };
        self.requests
            .lock()
            .map_err(|_| AiError::Internal("Scripted model lock poisoned".into()))?
            .push(request);
        result
    }
}
