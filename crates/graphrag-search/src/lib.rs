//! graphrag-search: query-time retrieval over the graphrag knowledge graph.
//!
//! Two modes:
//! - **Local search** answers entity-centric questions from the neighborhood
//!   of the most similar entities (summaries, relationships, source chunks,
//!   community reports).
//! - **Global search** answers corpus-wide questions by map-reducing over
//!   community reports.

pub mod context;
pub mod error;
pub mod global;
pub mod local;
pub mod prompts;

pub use error::SearchError;
pub use global::{global_search, GlobalAnswer, GlobalSearchOptions};
pub use local::{local_search, LocalAnswer, LocalSearchOptions};
