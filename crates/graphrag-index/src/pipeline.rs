//! The ingestion pipeline: chunk → extract → import.
//!
//! Chunks of one book are processed concurrently under a semaphore bound
//! on model requests. A failed chunk is logged and counted, never fatal;
//! re-running ingest is safe because imports merge.

use std::sync::Arc;

use tokio::sync::Semaphore;

use graphrag_core::chunk::chunk_text;
use graphrag_graph::GraphClient;
use graphrag_llm::{ChatModel, ChatRequest};

use crate::config::IndexConfig;
use crate::error::Result;
use crate::extract::{extraction_prompt, parse_extraction_output};
use crate::manifest::{BookRunStats, RunManifest};

/// One input document.
#[derive(Debug, Clone)]
pub struct BookInput {
    pub id: String,
    pub text: String,
}

/// Ingest a set of books into the knowledge graph.
pub async fn ingest_books(
    graph: &GraphClient,
    chat: Arc<dyn ChatModel>,
    config: &IndexConfig,
    books: Vec<BookInput>,
) -> Result<RunManifest> {
    let mut manifest = RunManifest::new();
    let entity_types = config.entity_types.join(",");
    let semaphore = Arc::new(Semaphore::new(config.max_concurrent_requests));

    for book in books {
        let chunks = chunk_text(
            &book.text,
            config.chunk_size,
            config.chunk_overlap,
            config.split_on_whitespace_only,
        );
        tracing::info!(book = %book.id, chunks = chunks.len(), "Chunked book");

        let mut handles = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.into_iter().enumerate() {
            let graph = graph.clone();
            let chat = chat.clone();
            let semaphore = semaphore.clone();
            let entity_types = entity_types.clone();
            let book_id = book.id.clone();
            let chunk_id = format!("{}:{}", book.id, i);

            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire().await.expect("Semaphore closed");
                process_chunk(&graph, chat.as_ref(), &entity_types, &book_id, &chunk_id, &chunk)
                    .await
            }));
        }

        let mut stats = BookRunStats::new(&book.id);
        for handle in handles {
            match handle.await {
                Ok(Ok((entities, relationships))) => {
                    stats.chunks += 1;
                    stats.entities += entities;
                    stats.relationships += relationships;
                }
                Ok(Err(e)) => {
                    tracing::warn!(book = %book.id, error = %e, "Chunk failed, skipping");
                    stats.errors += 1;
                }
                Err(e) => {
                    tracing::error!(book = %book.id, error = %e, "Chunk task panicked");
                    stats.errors += 1;
                }
            }
        }

        tracing::info!(
            book = %book.id,
            chunks = stats.chunks,
            entities = stats.entities,
            relationships = stats.relationships,
            errors = stats.errors,
            "Book ingested"
        );
        manifest.record_book(stats);
    }

    manifest.finalize();
    Ok(manifest)
}

/// Extract and import a single chunk. Returns (entities, relationships) counts.
async fn process_chunk(
    graph: &GraphClient,
    chat: &dyn ChatModel,
    entity_types: &str,
    book_id: &str,
    chunk_id: &str,
    text: &str,
) -> Result<(usize, usize)> {
    let prompt = extraction_prompt(entity_types, text);
    let response = chat.complete(ChatRequest::new(prompt)).await?;

    let (entities, relationships) = parse_extraction_output(&response.text, None, None);

    graph
        .import_chunk(book_id, chunk_id, text, &entities, &relationships)
        .await?;

    tracing::debug!(
        chunk = %chunk_id,
        entities = entities.len(),
        relationships = relationships.len(),
        "Imported chunk"
    );
    Ok((entities.len(), relationships.len()))
}
