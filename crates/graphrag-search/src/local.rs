//! Local search: answer entity-centric questions from the neighborhood of
//! the entities most similar to the query.

use std::collections::BTreeSet;
use std::sync::Arc;

use graphrag_graph::GraphClient;
use graphrag_llm::{ChatModel, ChatRequest, EmbeddingModel};

use crate::context::{format_local_context, rank_entities};
use crate::error::{Result, SearchError};
use crate::prompts::{local_prompt, DEFAULT_RESPONSE_TYPE};

#[derive(Debug, Clone)]
pub struct LocalSearchOptions {
    /// Number of entities to anchor the context on.
    pub top_k: usize,
    /// Maximum source chunk excerpts to include.
    pub chunk_limit: u32,
    pub response_type: String,
}

impl Default for LocalSearchOptions {
    fn default() -> Self {
        Self {
            top_k: 10,
            chunk_limit: 5,
            response_type: DEFAULT_RESPONSE_TYPE.to_string(),
        }
    }
}

/// Result of a local search.
#[derive(Debug, Clone)]
pub struct LocalAnswer {
    pub answer: String,
    /// Names of the entities the context was anchored on, best match first.
    pub entities: Vec<String>,
}

/// Answer a question from the local neighborhood of the most similar entities.
pub async fn local_search(
    graph: &GraphClient,
    chat: Arc<dyn ChatModel>,
    embedder: Arc<dyn EmbeddingModel>,
    question: &str,
    options: &LocalSearchOptions,
) -> Result<LocalAnswer> {
    let query_embedding = embedder.embed(question).await?;

    let entities = graph.fetch_entity_embeddings().await?;
    if entities.is_empty() {
        return Err(SearchError::NoEmbeddings);
    }

    let ranked = rank_entities(&query_embedding, entities, options.top_k);
    let names: Vec<String> = ranked.iter().map(|r| r.entity.name.clone()).collect();
    tracing::info!(anchors = ?names, "Ranked context entities");

    let relationships = graph.fetch_summarized_relationships(&names).await?;
    let sources = graph
        .fetch_chunks_mentioning(&names, options.chunk_limit)
        .await?;

    let community_ids: Vec<i64> = ranked
        .iter()
        .map(|r| r.entity.community)
        .filter(|&c| c >= 0)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let reports = if community_ids.is_empty() {
        Vec::new()
    } else {
        graph.fetch_reports_for_communities(&community_ids).await?
    };

    let context = format_local_context(&ranked, &relationships, &reports, &sources);
    let request = ChatRequest::new(question.to_string())
        .with_system(local_prompt(&context, &options.response_type));
    let response = chat.complete(request).await?;

    Ok(LocalAnswer {
        answer: response.text,
        entities: names,
    })
}
