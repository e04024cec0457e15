//! Error types for the graphrag-community crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommunityError {
    #[error("Graph error: {0}")]
    Graph(#[from] graphrag_graph::GraphError),

    #[error("Model error: {0}")]
    Llm(#[from] graphrag_llm::LlmError),

    #[error("No entities found in the graph; run ingest first")]
    EmptyGraph,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CommunityError>;
