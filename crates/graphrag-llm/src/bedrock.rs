//! Bedrock runtime client and Anthropic chat completion.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_bedrockruntime::primitives::Blob;
use aws_sdk_bedrockruntime::Client;
use serde::{Deserialize, Serialize};

use crate::error::{LlmError, Result};
use crate::provider::{ChatModel, ChatRequest, ChatResponse};

const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";
const DEFAULT_CHAT_MODEL: &str = "apac.anthropic.claude-sonnet-4-20250514-v1:0";
const DEFAULT_REGION: &str = "ap-northeast-2";

/// Build a Bedrock runtime client for the given region.
///
/// Credentials come from the default provider chain: environment, shared
/// config, or the EC2 instance profile.
pub async fn bedrock_client(region: &str) -> Client {
    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await;
    Client::new(&sdk_config)
}

/// Configuration for Bedrock model access, loaded from the `[llm]` config
/// section. Region and chat model honor the conventional environment
/// variables as fallbacks.
#[derive(Debug, Clone, Deserialize)]
pub struct BedrockChatConfig {
    #[serde(default = "default_region")]
    pub region: String,

    /// Bedrock model or inference profile id for chat.
    #[serde(default = "default_model_id")]
    pub model_id: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Retries on top of the first attempt, with exponential backoff.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_region() -> String {
    std::env::var("AWS_DEFAULT_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string())
}

fn default_model_id() -> String {
    std::env::var("BEDROCK_MODEL_ID").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string())
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> usize {
    4096
}

fn default_max_retries() -> u32 {
    3
}

impl Default for BedrockChatConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            model_id: default_model_id(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_retries: default_max_retries(),
        }
    }
}

/// Anthropic chat completion over the Bedrock runtime.
#[derive(Clone)]
pub struct BedrockChat {
    client: Client,
    config: BedrockChatConfig,
}

impl BedrockChat {
    pub fn new(client: Client, config: BedrockChatConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &BedrockChatConfig {
        &self.config
    }
}

#[async_trait]
impl ChatModel for BedrockChat {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse> {
        let body = AnthropicRequest {
            anthropic_version: ANTHROPIC_VERSION,
            max_tokens: request.max_tokens,
            temperature: Some(request.temperature),
            system: request.system.as_deref(),
            messages: vec![AnthropicMessage {
                role: "user",
                content: &request.prompt,
            }],
        };
        let payload = serde_json::to_vec(&body)?;

        let raw = invoke_with_retry(
            &self.client,
            &self.config.model_id,
            &payload,
            self.config.max_retries,
        )
        .await?;

        let parsed: AnthropicResponse = serde_json::from_slice(&raw)
            .map_err(|e| LlmError::InvalidResponse(format!("malformed chat response: {e}")))?;

        let text = parsed
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(LlmError::InvalidResponse(
                "chat response contained no text blocks".to_string(),
            ));
        }

        Ok(ChatResponse {
            text,
            input_tokens: parsed.usage.as_ref().map(|u| u.input_tokens),
            output_tokens: parsed.usage.as_ref().map(|u| u.output_tokens),
            stop_reason: parsed.stop_reason,
        })
    }

    fn model_id(&self) -> &str {
        &self.config.model_id
    }
}

/// Invoke a Bedrock model with exponential backoff: 1s, 2s, 4s between
/// attempts. Shared by chat and embedding.
pub(crate) async fn invoke_with_retry(
    client: &Client,
    model_id: &str,
    payload: &[u8],
    max_retries: u32,
) -> Result<Vec<u8>> {
    let mut last_error: Option<LlmError> = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(2u64.pow(attempt - 1));
            tokio::time::sleep(delay).await;
            tracing::warn!(attempt, model_id, "Retrying Bedrock invocation");
        }

        match invoke_once(client, model_id, payload).await {
            Ok(bytes) => return Ok(bytes),
            Err(e) => last_error = Some(e),
        }
    }

    Err(LlmError::RetriesExhausted {
        attempts: max_retries + 1,
        last: last_error.map(|e| e.to_string()).unwrap_or_default(),
    })
}

async fn invoke_once(client: &Client, model_id: &str, payload: &[u8]) -> Result<Vec<u8>> {
    let output = client
        .invoke_model()
        .model_id(model_id)
        .content_type("application/json")
        .accept("application/json")
        .body(Blob::new(payload.to_vec()))
        .send()
        .await
        .map_err(|e| LlmError::Bedrock(e.to_string()))?;

    Ok(output.body().as_ref().to_vec())
}

// Anthropic request/response body shapes for the Bedrock runtime.

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    anthropic_version: &'static str,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let body = AnthropicRequest {
            anthropic_version: ANTHROPIC_VERSION,
            max_tokens: 1024,
            temperature: Some(0.3),
            system: Some("be terse"),
            messages: vec![AnthropicMessage {
                role: "user",
                content: "hello",
            }],
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["anthropic_version"], "bedrock-2023-05-31");
        assert_eq!(value["max_tokens"], 1024);
        assert_eq!(value["system"], "be terse");
        assert_eq!(value["messages"][0]["role"], "user");
    }

    #[test]
    fn request_body_omits_empty_system() {
        let body = AnthropicRequest {
            anthropic_version: ANTHROPIC_VERSION,
            max_tokens: 16,
            temperature: None,
            system: None,
            messages: vec![],
        };

        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("system").is_none());
        assert!(value.get("temperature").is_none());
    }

    #[test]
    fn response_parsing_joins_text_blocks() {
        let raw = r#"{
            "content": [
                {"type": "text", "text": "Hello "},
                {"type": "tool_use"},
                {"type": "text", "text": "world"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 4}
        }"#;

        let parsed: AnthropicResponse = serde_json::from_str(raw).unwrap();
        let text: String = parsed
            .content
            .iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text.as_deref())
            .collect();
        assert_eq!(text, "Hello world");
        assert_eq!(parsed.usage.unwrap().output_tokens, 4);
    }

    #[test]
    fn default_config_is_populated() {
        let config = BedrockChatConfig::default();
        assert!(!config.region.is_empty());
        assert!(!config.model_id.is_empty());
        assert_eq!(config.max_retries, 3);
    }
}
