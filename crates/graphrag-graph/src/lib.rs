//! graphrag-graph: Neo4j client for the graphrag knowledge graph.
//!
//! This crate is the single mutation point for the knowledge graph. All
//! reads and writes flow through it so the schema (`Book`, `__Chunk__`,
//! `__Entity__`, `__Community__`) stays consistent across the pipeline
//! stages.

pub mod admin;
pub mod client;
pub mod mutations;
pub mod queries;

pub use client::{GraphClient, GraphConfig, GraphError};
