//! Error types for the graphrag-index crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Graph error: {0}")]
    Graph(#[from] graphrag_graph::GraphError),

    #[error("Model error: {0}")]
    Llm(#[from] graphrag_llm::LlmError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IndexError>;
