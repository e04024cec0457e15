//! Write operations for the knowledge graph.
//!
//! Imports use MERGE (upsert) semantics so re-ingesting a chunk is
//! idempotent for books, chunks, and entities. RELATIONSHIP edges are
//! CREATEd per extracted mention; duplicates across chunks are expected
//! and condensed later by summarization.

use graphrag_core::types::{CommunityReport, ExtractedEntity, ExtractedRelationship};
use neo4rs::query;

use crate::client::{GraphClient, GraphError};

/// A condensed summary for one entity pair.
#[derive(Debug, Clone)]
pub struct RelationshipSummary {
    pub source: String,
    pub target: String,
    pub summary: String,
}

impl GraphClient {
    // ── Chunk Import ─────────────────────────────────────────────

    /// Import one chunk with its extracted entities and relationships in a
    /// single transaction.
    ///
    /// Entities are merged by name; each mention appends its description and
    /// adds a MENTIONS edge from the chunk. The entity type becomes an extra
    /// node label when it survives sanitization.
    pub async fn import_chunk(
        &self,
        book_id: &str,
        chunk_id: &str,
        text: &str,
        entities: &[ExtractedEntity],
        relationships: &[ExtractedRelationship],
    ) -> Result<(), GraphError> {
        let mut txn = self.start_txn().await?;

        let q = query(
            "MERGE (b:Book {id: $book_id})
             MERGE (b)-[:HAS_CHUNK]->(c:__Chunk__ {id: $chunk_id})
             SET c.text = $text",
        )
        .param("book_id", book_id.to_string())
        .param("chunk_id", chunk_id.to_string())
        .param("text", text.to_string());
        txn.run(q).await?;

        for entity in entities {
            let label_clause = match cypher_label(&entity.entity_type) {
                Some(label) => format!("SET n:{label}\n             "),
                None => String::new(),
            };
            let cypher = format!(
                "MATCH (c:__Chunk__ {{id: $chunk_id}})
             MERGE (n:__Entity__ {{name: $name}})
             {label_clause}SET n.description = coalesce(n.description, []) + [$description]
             MERGE (c)-[:MENTIONS]->(n)"
            );

            let q = query(&cypher)
                .param("chunk_id", chunk_id.to_string())
                .param("name", entity.name.clone())
                .param("description", entity.description.clone());
            txn.run(q).await?;
        }

        for rel in relationships {
            let q = query(
                "MERGE (s:__Entity__ {name: $source})
                 MERGE (t:__Entity__ {name: $target})
                 CREATE (s)-[:RELATIONSHIP {description: $description, strength: $strength}]->(t)",
            )
            .param("source", rel.source.clone())
            .param("target", rel.target.clone())
            .param("description", rel.description.clone())
            .param("strength", rel.strength);
            txn.run(q).await?;
        }

        txn.commit().await?;
        Ok(())
    }

    // ── Summaries ────────────────────────────────────────────────

    /// Store condensed summaries for entities with multiple descriptions.
    pub async fn set_entity_summaries(
        &self,
        summaries: &[(String, String)],
    ) -> Result<(), GraphError> {
        let mut txn = self.start_txn().await?;

        for (name, summary) in summaries {
            let q = query(
                "MATCH (e:__Entity__ {name: $name})
                 SET e.summary = $summary",
            )
            .param("name", name.clone())
            .param("summary", summary.clone());
            txn.run(q).await?;
        }

        txn.commit().await?;
        Ok(())
    }

    /// Entities with exactly one description use it as the summary directly.
    pub async fn copy_single_description_summaries(&self) -> Result<(), GraphError> {
        self.run(query(
            "MATCH (e:__Entity__)
             WHERE size(e.description) = 1
             SET e.summary = e.description[0]",
        ))
        .await
    }

    /// Store condensed SUMMARIZED_RELATIONSHIP edges for entity pairs.
    pub async fn set_relationship_summaries(
        &self,
        summaries: &[RelationshipSummary],
    ) -> Result<(), GraphError> {
        let mut txn = self.start_txn().await?;

        for rel in summaries {
            let q = query(
                "MATCH (s:__Entity__ {name: $source}), (t:__Entity__ {name: $target})
                 MERGE (s)-[r:SUMMARIZED_RELATIONSHIP]-(t)
                 SET r.summary = $summary",
            )
            .param("source", rel.source.clone())
            .param("target", rel.target.clone())
            .param("summary", rel.summary.clone());
            txn.run(q).await?;
        }

        txn.commit().await?;
        Ok(())
    }

    /// Pairs without a summarized edge copy the lone RELATIONSHIP description.
    pub async fn copy_single_relationship_summaries(&self) -> Result<(), GraphError> {
        self.run(query(
            "MATCH (s:__Entity__)-[e:RELATIONSHIP]-(t:__Entity__)
             WHERE NOT (s)-[:SUMMARIZED_RELATIONSHIP]-(t)
             MERGE (s)-[r:SUMMARIZED_RELATIONSHIP]-(t)
             SET r.summary = e.description",
        ))
        .await
    }

    /// Store the embedding of an entity's summary.
    pub async fn set_entity_embedding(
        &self,
        name: &str,
        embedding: &[f32],
    ) -> Result<(), GraphError> {
        let vector: Vec<f64> = embedding.iter().map(|&v| v as f64).collect();
        let q = query(
            "MATCH (e:__Entity__ {name: $name})
             SET e.embedding = $embedding",
        )
        .param("name", name.to_string())
        .param("embedding", vector);
        self.run(q).await
    }

    // ── Communities ──────────────────────────────────────────────

    /// Write community assignments back onto entities.
    pub async fn assign_communities(
        &self,
        assignments: &[(String, i64)],
    ) -> Result<(), GraphError> {
        let mut txn = self.start_txn().await?;

        for (name, community) in assignments {
            let q = query(
                "MATCH (e:__Entity__ {name: $name})
                 SET e.community = $community",
            )
            .param("name", name.clone())
            .param("community", *community);
            txn.run(q).await?;
        }

        txn.commit().await?;
        Ok(())
    }

    /// Import a generated community report and its membership edges.
    pub async fn import_community_report(
        &self,
        community_id: i64,
        report: &CommunityReport,
        members: &[String],
    ) -> Result<(), GraphError> {
        let mut txn = self.start_txn().await?;

        let q = query(
            "MERGE (c:__Community__ {communityId: $id})
             SET c.title = $title,
                 c.summary = $summary,
                 c.rating = $rating,
                 c.rating_explanation = $rating_explanation",
        )
        .param("id", community_id)
        .param("title", report.title.clone())
        .param("summary", report.summary.clone())
        .param("rating", report.rating)
        .param("rating_explanation", report.rating_explanation.clone());
        txn.run(q).await?;

        for name in members {
            let q = query(
                "MATCH (c:__Community__ {communityId: $id})
                 MERGE (n:__Entity__ {name: $name})
                 MERGE (n)-[:IN_COMMUNITY]->(c)",
            )
            .param("id", community_id)
            .param("name", name.clone());
            txn.run(q).await?;
        }

        txn.commit().await?;
        Ok(())
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Sanitize a model-supplied entity type into a Cypher label.
///
/// Labels are interpolated into query text, so only uppercase
/// alphanumerics and underscores survive, and the first character must
/// not be a digit. Anything else yields `None` and the entity keeps only
/// the `__Entity__` label.
pub(crate) fn cypher_label(raw: &str) -> Option<String> {
    let label: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if label.is_empty() || label.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_sanitization_passes_clean_types() {
        assert_eq!(cypher_label("PERSON"), Some("PERSON".to_string()));
        assert_eq!(cypher_label("organization"), Some("ORGANIZATION".to_string()));
        assert_eq!(cypher_label(" Geo "), Some("GEO".to_string()));
    }

    #[test]
    fn label_sanitization_strips_injection_characters() {
        assert_eq!(
            cypher_label("PERSON) DETACH DELETE (n"),
            Some("PERSONDETACHDELETEN".to_string())
        );
        assert_eq!(cypher_label("A-B"), Some("AB".to_string()));
    }

    #[test]
    fn label_sanitization_rejects_unusable_types() {
        assert_eq!(cypher_label(""), None);
        assert_eq!(cypher_label("!!!"), None);
        assert_eq!(cypher_label("1PERSON"), None);
    }
}
