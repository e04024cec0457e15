//! Description condensation: entity and relationship summaries, plus
//! summary embeddings for local search.
//!
//! Ingestion accumulates one description per mention. This stage asks the
//! model to merge multi-description entities and entity pairs into a
//! single summary; singletons are copied in Cypher without a model call.

use std::sync::Arc;

use tokio::sync::Semaphore;

use graphrag_graph::mutations::RelationshipSummary;
use graphrag_graph::GraphClient;
use graphrag_llm::{ChatModel, ChatRequest, EmbeddingModel};

use crate::error::Result;

const SUMMARIZE_PROMPT: &str = r#"
You are a helpful assistant responsible for generating a comprehensive summary of the data provided below.
Given one or two entities, and a list of descriptions, all related to the same entity or group of entities.
Please concatenate all of these into a single, comprehensive description. Make sure to include information collected from all the descriptions.
If the provided descriptions are contradictory, please resolve the contradictions and provide a single, coherent summary.
Make sure it is written in third person, and include the entity names so we have the full context.

#######
-Data-
Entities: {entity_name}
Description List: {description_list}
#######
Output:
"#;

/// Render the description-condensation prompt.
pub fn summarize_prompt(entity_name: &str, descriptions: &[String]) -> String {
    let description_list =
        serde_json::to_string(descriptions).unwrap_or_else(|_| format!("{descriptions:?}"));
    SUMMARIZE_PROMPT
        .replace("{entity_name}", entity_name)
        .replace("{description_list}", &description_list)
}

/// Condense multi-description entities into summaries. Returns the number
/// of entities summarized by the model.
pub async fn summarize_entities(
    graph: &GraphClient,
    chat: Arc<dyn ChatModel>,
    max_concurrent: usize,
) -> Result<usize> {
    let pending = graph.fetch_multi_description_entities().await?;
    tracing::info!(count = pending.len(), "Entities pending summarization");

    let semaphore = Arc::new(Semaphore::new(max_concurrent));
    let mut handles = Vec::with_capacity(pending.len());

    for entity in pending {
        let chat = chat.clone();
        let semaphore = semaphore.clone();
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire().await.expect("Semaphore closed");
            let prompt = summarize_prompt(&entity.name, &entity.descriptions);
            chat.complete(ChatRequest::new(prompt))
                .await
                .map(|response| (entity.name, response.text.trim().to_string()))
        }));
    }

    let mut summaries = Vec::new();
    for handle in handles {
        match handle.await {
            Ok(Ok(pair)) => summaries.push(pair),
            Ok(Err(e)) => tracing::warn!(error = %e, "Entity summarization failed, skipping"),
            Err(e) => tracing::error!(error = %e, "Summarization task panicked"),
        }
    }

    graph.set_entity_summaries(&summaries).await?;
    graph.copy_single_description_summaries().await?;
    Ok(summaries.len())
}

/// Condense entity pairs with multiple relationship descriptions into
/// SUMMARIZED_RELATIONSHIP edges. Returns the number summarized by the model.
pub async fn summarize_relationships(
    graph: &GraphClient,
    chat: Arc<dyn ChatModel>,
    max_concurrent: usize,
) -> Result<usize> {
    let pending = graph.fetch_multi_description_relationships().await?;
    tracing::info!(count = pending.len(), "Relationship pairs pending summarization");

    let semaphore = Arc::new(Semaphore::new(max_concurrent));
    let mut handles = Vec::with_capacity(pending.len());

    for pair in pending {
        let chat = chat.clone();
        let semaphore = semaphore.clone();
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire().await.expect("Semaphore closed");
            let names = format!("{}, {}", pair.source, pair.target);
            let prompt = summarize_prompt(&names, &pair.descriptions);
            chat.complete(ChatRequest::new(prompt))
                .await
                .map(|response| RelationshipSummary {
                    source: pair.source,
                    target: pair.target,
                    summary: response.text.trim().to_string(),
                })
        }));
    }

    let mut summaries = Vec::new();
    for handle in handles {
        match handle.await {
            Ok(Ok(summary)) => summaries.push(summary),
            Ok(Err(e)) => tracing::warn!(error = %e, "Relationship summarization failed, skipping"),
            Err(e) => tracing::error!(error = %e, "Summarization task panicked"),
        }
    }

    graph.set_relationship_summaries(&summaries).await?;
    graph.copy_single_relationship_summaries().await?;
    Ok(summaries.len())
}

/// Embed entity summaries that have no stored vector yet. Returns the
/// number embedded.
pub async fn embed_summaries(
    graph: &GraphClient,
    embedder: Arc<dyn EmbeddingModel>,
    max_concurrent: usize,
) -> Result<usize> {
    let pending = graph.fetch_unembedded_summaries().await?;
    tracing::info!(count = pending.len(), "Entity summaries pending embedding");

    let semaphore = Arc::new(Semaphore::new(max_concurrent));
    let mut handles = Vec::with_capacity(pending.len());

    for entity in pending {
        let graph = graph.clone();
        let embedder = embedder.clone();
        let semaphore = semaphore.clone();
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire().await.expect("Semaphore closed");
            let vector = embedder.embed(&entity.summary).await?;
            graph.set_entity_embedding(&entity.name, &vector).await?;
            Ok::<_, crate::error::IndexError>(())
        }));
    }

    let mut embedded = 0usize;
    for handle in handles {
        match handle.await {
            Ok(Ok(())) => embedded += 1,
            Ok(Err(e)) => tracing::warn!(error = %e, "Embedding failed, skipping"),
            Err(e) => tracing::error!(error = %e, "Embedding task panicked"),
        }
    }

    Ok(embedded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_includes_entity_and_descriptions() {
        let descriptions = vec![
            "A regional bank".to_string(),
            "The central bank of Verdantis".to_string(),
        ];
        let prompt = summarize_prompt("CENTRAL INSTITUTION", &descriptions);

        assert!(prompt.contains("Entities: CENTRAL INSTITUTION"));
        assert!(prompt.contains("A regional bank"));
        assert!(prompt.contains("The central bank of Verdantis"));
        assert!(!prompt.contains("{entity_name}"));
        assert!(!prompt.contains("{description_list}"));
    }
}
