//! Chat and embedding provider traits.
//!
//! The pipeline stages depend on these traits rather than on Bedrock directly,
//! leaving the seam open for other backends.

use async_trait::async_trait;

use crate::error::Result;

/// A single-turn chat request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Optional system prompt.
    pub system: Option<String>,
    /// The user message.
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub max_tokens: usize,
}

impl ChatRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            temperature: 0.3,
            max_tokens: 4096,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Response from a chat model.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Generated text, all text blocks joined.
    pub text: String,
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
    pub stop_reason: Option<String>,
}

/// A chat completion backend.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// The model identifier requests are sent to.
    fn model_id(&self) -> &str;
}

/// A text embedding backend.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Output vector dimensionality.
    fn dimensions(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_defaults() {
        let req = ChatRequest::new("hello");
        assert!(req.system.is_none());
        assert!((req.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(req.max_tokens, 4096);
    }

    #[test]
    fn chat_request_builder() {
        let req = ChatRequest::new("q").with_system("sys").with_temperature(0.0);
        assert_eq!(req.system.as_deref(), Some("sys"));
        assert_eq!(req.temperature, 0.0);
    }
}
