//! Error types for the graphrag-llm crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Bedrock request failed: {0}")]
    Bedrock(String),

    #[error("Model returned an unusable response: {0}")]
    InvalidResponse(String),

    #[error("All {attempts} attempts failed, last error: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LlmError>;
