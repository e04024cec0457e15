//! Error types for the graphrag-search crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Graph error: {0}")]
    Graph(#[from] graphrag_graph::GraphError),

    #[error("Model error: {0}")]
    Llm(#[from] graphrag_llm::LlmError),

    #[error("No entity embeddings in the graph; run `graphrag-index summarize` first")]
    NoEmbeddings,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SearchError>;
