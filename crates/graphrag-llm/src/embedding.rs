//! Titan text embeddings over the Bedrock runtime, plus cosine similarity.

use async_trait::async_trait;
use aws_sdk_bedrockruntime::Client;
use serde::{Deserialize, Serialize};

use crate::bedrock::invoke_with_retry;
use crate::error::{LlmError, Result};
use crate::provider::EmbeddingModel;

const DEFAULT_EMBED_MODEL: &str = "amazon.titan-embed-text-v2:0";

/// Configuration for Titan embeddings, loaded from the `[llm.embedding]`
/// config section.
#[derive(Debug, Clone, Deserialize)]
pub struct TitanEmbeddingConfig {
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// Output dimensions: 256, 512, or 1024.
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    #[serde(default = "default_normalize")]
    pub normalize: bool,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_model_id() -> String {
    DEFAULT_EMBED_MODEL.to_string()
}

fn default_dimensions() -> usize {
    1024
}

fn default_normalize() -> bool {
    true
}

fn default_max_retries() -> u32 {
    3
}

impl Default for TitanEmbeddingConfig {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            dimensions: default_dimensions(),
            normalize: default_normalize(),
            max_retries: default_max_retries(),
        }
    }
}

/// Titan text embedding client.
#[derive(Clone)]
pub struct TitanEmbedding {
    client: Client,
    config: TitanEmbeddingConfig,
}

impl TitanEmbedding {
    pub fn new(client: Client, config: TitanEmbeddingConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &TitanEmbeddingConfig {
        &self.config
    }
}

#[async_trait]
impl EmbeddingModel for TitanEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = TitanRequest {
            input_text: text,
            dimensions: self.config.dimensions,
            normalize: self.config.normalize,
        };
        let payload = serde_json::to_vec(&body)?;

        let raw = invoke_with_retry(
            &self.client,
            &self.config.model_id,
            &payload,
            self.config.max_retries,
        )
        .await?;

        let parsed: TitanResponse = serde_json::from_slice(&raw)
            .map_err(|e| LlmError::InvalidResponse(format!("malformed embedding response: {e}")))?;

        if parsed.embedding.is_empty() {
            return Err(LlmError::InvalidResponse(
                "embedding response contained no vector".to_string(),
            ));
        }

        Ok(parsed.embedding)
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }
}

/// Cosine similarity between two vectors. Returns 0.0 for mismatched
/// lengths or zero vectors rather than NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TitanRequest<'a> {
    input_text: &'a str,
    dimensions: usize,
    normalize: bool,
}

#[derive(Debug, Deserialize)]
struct TitanResponse {
    embedding: Vec<f32>,
    #[serde(rename = "inputTextTokenCount", default)]
    #[allow(dead_code)]
    input_text_token_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titan_request_uses_camel_case() {
        let body = TitanRequest {
            input_text: "probe",
            dimensions: 512,
            normalize: true,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["inputText"], "probe");
        assert_eq!(value["dimensions"], 512);
        assert_eq!(value["normalize"], true);
    }

    #[test]
    fn titan_response_parses() {
        let raw = r#"{"embedding": [0.1, -0.2, 0.3], "inputTextTokenCount": 2}"#;
        let parsed: TitanResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.embedding.len(), 3);
    }

    #[test]
    fn cosine_identical_vectors() {
        let v = vec![0.5, 0.5, 0.1];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_vectors() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn cosine_opposite_vectors() {
        let a = vec![1.0, 2.0];
        let b = vec![-1.0, -2.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_zero_vector_is_zero_not_nan() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 2.0];
        let sim = cosine_similarity(&a, &b);
        assert_eq!(sim, 0.0);
        assert!(!sim.is_nan());
    }

    #[test]
    fn cosine_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }
}
