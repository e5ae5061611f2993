//! AWS Bedrock backend speaking the Anthropic Messages format.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion};
use aws_sdk_bedrockruntime::{
    config::Region,
    error::{ProvideErrorMetadata, SdkError},
    operation::invoke_model::InvokeModelError,
    primitives::Blob,
    Client,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::constants::{ANTHROPIC_BEDROCK_VERSION, DEFAULT_MODEL_ID};
use crate::error::AiError;
use crate::model::LanguageModelTrait;
use crate::types::{ChatTurn, CompletionRequest};

/// Connection settings for the Bedrock runtime client.
#[derive(Debug, Clone)]
pub struct BedrockConfig {
    pub region: Option<String>,
    pub model_id: String,
    pub max_attempts: u32,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for BedrockConfig {
    fn default() -> Self {
        Self {
            region: None,
            model_id: DEFAULT_MODEL_ID.to_string(),
            max_attempts: 5,
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(90),
        }
    }
}

pub struct BedrockModel {
    client: Client,
    model_id: String,
}

impl BedrockModel {
    /// Build a client from the ambient AWS credential chain.
    pub async fn connect(config: &BedrockConfig) -> Result<Self, AiError> {
        let region = config
            .region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| AiError::NotConfigured("AWS_REGION not set".into()))?
            .to_string();

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .retry_config(RetryConfig::standard().with_max_attempts(config.max_attempts))
            .timeout_config(
                TimeoutConfig::builder()
                    .connect_timeout(config.connect_timeout)
                    .read_timeout(config.read_timeout)
                    .build(),
            )
            .load()
            .await;

        info!("Bedrock ready: {} | Model: {}", region, config.model_id);
        Ok(Self {
            client: Client::new(&sdk_config),
            model_id: config.model_id.clone(),
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[async_trait]
impl LanguageModelTrait for BedrockModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String, AiError> {
        let body = encode_request(&request)?;
        debug!(
            "Invoking {} with {} messages, max_tokens={}",
            self.model_id,
            request.messages.len(),
            request.max_tokens
        );

        let output = self
            .client
            .invoke_model()
            .model_id(&self.model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(body))
            .send()
            .await
            .map_err(map_sdk_error)?;

        decode_response(output.body().as_ref())
    }
}

fn map_sdk_error<R>(err: SdkError<InvokeModelError, R>) -> AiError
where
    R: std::fmt::Debug + Send + Sync + 'static,
{
    if let SdkError::TimeoutError(_) = err {
        return AiError::Timeout("Bedrock request timed out".into());
    }
    let service_err = err.into_service_error();
    if service_err.is_throttling_exception() {
        warn!("Bedrock throttled the request");
        return AiError::RateLimited("Bedrock throttling".into());
    }
    let code = service_err.code().unwrap_or("Unknown").to_string();
    warn!("Bedrock call failed: {} ({:?})", code, service_err.message());
    AiError::provider(format!("Bedrock error: {code}"))
}

#[derive(Serialize)]
struct MessagesBody<'a> {
    anthropic_version: &'static str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [ChatTurn],
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

fn encode_request(request: &CompletionRequest) -> Result<Vec<u8>, AiError> {
    let body = MessagesBody {
        anthropic_version: ANTHROPIC_BEDROCK_VERSION,
        max_tokens: request.max_tokens,
        system: &request.system,
        messages: &request.messages,
        temperature: request.temperature,
        top_p: request.top_p,
    };
    serde_json::to_vec(&body).map_err(|e| AiError::Internal(format!("Failed to encode request: {e}")))
}

fn decode_response(raw: &[u8]) -> Result<String, AiError> {
    let parsed: MessagesResponse = serde_json::from_slice(raw)
        .map_err(|e| AiError::provider(format!("Malformed Bedrock response: {e}")))?;
    match parsed.content.into_iter().next() {
        Some(ContentBlock {
            kind,
            text: Some(text),
        }) if kind == "text" => Ok(text),
        _ => Err(AiError::EmptyResponse),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_uses_messages_format() {
        let request = CompletionRequest::new(
            "You are Sai",
            vec![ChatTurn::user("Hi"), ChatTurn::assistant("Hello...")],
            500,
        );
        let body: serde_json::Value =
            serde_json::from_slice(&encode_request(&request).unwrap()).unwrap();

        assert_eq!(body["anthropic_version"], "bedrock-2023-05-31");
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["system"], "You are Sai");
        assert_eq!(body["messages"][1]["role"], "assistant");
        assert_eq!(body["messages"][1]["content"], "Hello...");
        assert!((body["temperature"].as_f64().unwrap() - 0.8).abs() < 1e-6);
        assert!((body["top_p"].as_f64().unwrap() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn first_text_block_is_returned() {
        let raw = br#"{"id":"msg","content":[{"type":"text","text":"I don't know."}],"stop_reason":"end_turn"}"#;
        assert_eq!(decode_response(raw).unwrap(), "I don't know.");
    }

    #[test]
    fn missing_text_is_empty_response() {
        assert!(matches!(
            decode_response(br#"{"content":[]}"#),
            Err(AiError::EmptyResponse)
        ));
        assert!(matches!(
            decode_response(br#"{"content":[{"type":"tool_use","id":"x"}]}"#),
            Err(AiError::EmptyResponse)
        ));
        assert!(matches!(
            decode_response(b"not json"),
            Err(AiError::Provider(_))
        ));
    }

    #[tokio::test]
    async fn connect_requires_region() {
        let err = BedrockModel::connect(&BedrockConfig::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AiError::NotConfigured(_)));
    }
}
