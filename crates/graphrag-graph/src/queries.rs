//! Read operations for the knowledge graph.
//!
//! Results come back as lightweight records with flat typed columns; the
//! in-memory analysis stages build richer structures from them.

use neo4rs::query;

use crate::client::{GraphClient, GraphError};

/// An entity and the names of its RELATIONSHIP neighbors (undirected).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EntityAdjacency {
    pub name: String,
    pub neighbors: Vec<String>,
}

/// An entity carrying multiple accumulated descriptions.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EntityDescriptions {
    pub name: String,
    pub descriptions: Vec<String>,
}

/// An entity pair with the descriptions of all RELATIONSHIP edges between them.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RelationshipDescriptions {
    pub source: String,
    pub target: String,
    pub descriptions: Vec<String>,
}

/// An entity summary pending embedding.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EntitySummary {
    pub name: String,
    pub summary: String,
}

/// An entity with its stored summary embedding.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EntityEmbedding {
    pub name: String,
    pub summary: String,
    /// Community id, or -1 when unassigned.
    pub community: i64,
    pub embedding: Vec<f32>,
}

/// A community id with its member count.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct CommunitySize {
    pub id: i64,
    pub size: i64,
}

/// A member entity of one community.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CommunityMember {
    pub name: String,
    pub summary: String,
    pub entity_type: String,
}

/// A relationship between two members of the same community.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CommunityEdge {
    pub source: String,
    pub target: String,
    pub description: String,
}

/// A summarized relationship between two entities.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SummarizedRelationship {
    pub source: String,
    pub target: String,
    pub summary: String,
}

/// A stored community report row.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CommunityReportRow {
    pub community_id: i64,
    pub title: String,
    pub summary: String,
    pub rating: f64,
    pub rating_explanation: String,
}

impl GraphClient {
    // ── Community Detection Input ────────────────────────────────

    /// Fetch every entity with its undirected RELATIONSHIP neighborhood.
    pub async fn fetch_entity_adjacency(&self) -> Result<Vec<EntityAdjacency>, GraphError> {
        let q = query(
            "MATCH (e:__Entity__)
             OPTIONAL MATCH (e)-[:RELATIONSHIP]-(connected:__Entity__)
             RETURN e.name AS name, collect(DISTINCT connected.name) AS neighbors",
        );

        let rows = self.query_rows(q).await?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            results.push(EntityAdjacency {
                name: row.get("name").unwrap_or_default(),
                neighbors: row.get("neighbors").unwrap_or_default(),
            });
        }
        Ok(results)
    }

    // ── Summarization Input ──────────────────────────────────────

    /// Entities with more than one description and no summary yet.
    pub async fn fetch_multi_description_entities(
        &self,
    ) -> Result<Vec<EntityDescriptions>, GraphError> {
        let q = query(
            "MATCH (e:__Entity__)
             WHERE size(e.description) > 1 AND e.summary IS NULL
             RETURN e.name AS name, e.description AS descriptions",
        );

        let rows = self.query_rows(q).await?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            results.push(EntityDescriptions {
                name: row.get("name").unwrap_or_default(),
                descriptions: row.get("descriptions").unwrap_or_default(),
            });
        }
        Ok(results)
    }

    /// Entity pairs connected by more than one RELATIONSHIP edge.
    pub async fn fetch_multi_description_relationships(
        &self,
    ) -> Result<Vec<RelationshipDescriptions>, GraphError> {
        let q = query(
            "MATCH (s:__Entity__)-[r:RELATIONSHIP]-(t:__Entity__)
             WHERE s.name < t.name
             WITH s.name AS source, t.name AS target, collect(r.description) AS descriptions
             WHERE size(descriptions) > 1
             RETURN source, target, descriptions",
        );

        let rows = self.query_rows(q).await?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            results.push(RelationshipDescriptions {
                source: row.get("source").unwrap_or_default(),
                target: row.get("target").unwrap_or_default(),
                descriptions: row.get("descriptions").unwrap_or_default(),
            });
        }
        Ok(results)
    }

    /// Entity summaries that do not have an embedding yet.
    pub async fn fetch_unembedded_summaries(&self) -> Result<Vec<EntitySummary>, GraphError> {
        let q = query(
            "MATCH (e:__Entity__)
             WHERE e.summary IS NOT NULL AND e.embedding IS NULL
             RETURN e.name AS name, e.summary AS summary",
        );

        let rows = self.query_rows(q).await?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            results.push(EntitySummary {
                name: row.get("name").unwrap_or_default(),
                summary: row.get("summary").unwrap_or_default(),
            });
        }
        Ok(results)
    }

    // ── Search Input ─────────────────────────────────────────────

    /// All entities with stored summary embeddings.
    pub async fn fetch_entity_embeddings(&self) -> Result<Vec<EntityEmbedding>, GraphError> {
        let q = query(
            "MATCH (e:__Entity__)
             WHERE e.embedding IS NOT NULL
             RETURN e.name AS name,
                    coalesce(e.summary, '') AS summary,
                    coalesce(e.community, -1) AS community,
                    e.embedding AS embedding",
        );

        let rows = self.query_rows(q).await?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let raw: Vec<f64> = row.get("embedding").unwrap_or_default();
            results.push(EntityEmbedding {
                name: row.get("name").unwrap_or_default(),
                summary: row.get("summary").unwrap_or_default(),
                community: row.get("community").unwrap_or(-1),
                embedding: raw.into_iter().map(|v| v as f32).collect(),
            });
        }
        Ok(results)
    }

    /// Texts of chunks mentioning any of the given entities.
    pub async fn fetch_chunks_mentioning(
        &self,
        names: &[String],
        limit: u32,
    ) -> Result<Vec<String>, GraphError> {
        let q = query(
            "MATCH (c:__Chunk__)-[:MENTIONS]->(e:__Entity__)
             WHERE e.name IN $names
             RETURN DISTINCT c.text AS text
             LIMIT $limit",
        )
        .param("names", names.to_vec())
        .param("limit", limit as i64);

        let rows = self.query_rows(q).await?;
        Ok(rows
            .into_iter()
            .map(|row| row.get("text").unwrap_or_default())
            .collect())
    }

    /// Summarized relationships among the given entities.
    pub async fn fetch_summarized_relationships(
        &self,
        names: &[String],
    ) -> Result<Vec<SummarizedRelationship>, GraphError> {
        let q = query(
            "MATCH (s:__Entity__)-[r:SUMMARIZED_RELATIONSHIP]-(t:__Entity__)
             WHERE s.name IN $names AND t.name IN $names AND s.name < t.name
             RETURN DISTINCT s.name AS source, t.name AS target,
                    coalesce(r.summary, '') AS summary",
        )
        .param("names", names.to_vec());

        let rows = self.query_rows(q).await?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            results.push(SummarizedRelationship {
                source: row.get("source").unwrap_or_default(),
                target: row.get("target").unwrap_or_default(),
                summary: row.get("summary").unwrap_or_default(),
            });
        }
        Ok(results)
    }

    // ── Communities ──────────────────────────────────────────────

    /// Communities with more than one member, largest first.
    pub async fn list_multi_member_communities(&self) -> Result<Vec<CommunitySize>, GraphError> {
        let q = query(
            "MATCH (e:__Entity__)
             WHERE e.community IS NOT NULL
             WITH e.community AS id, count(e) AS size
             WHERE size > 1
             RETURN id, size
             ORDER BY size DESC",
        );

        let rows = self.query_rows(q).await?;
        Ok(rows
            .into_iter()
            .map(|row| CommunitySize {
                id: row.get("id").unwrap_or(-1),
                size: row.get("size").unwrap_or(0),
            })
            .collect())
    }

    /// Member entities of one community.
    pub async fn fetch_community_members(
        &self,
        community: i64,
    ) -> Result<Vec<CommunityMember>, GraphError> {
        let q = query(
            "MATCH (e:__Entity__ {community: $community})
             RETURN e.name AS name,
                    coalesce(e.summary, '') AS summary,
                    coalesce([l IN labels(e) WHERE l <> '__Entity__'][0], '') AS entity_type",
        )
        .param("community", community);

        let rows = self.query_rows(q).await?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            results.push(CommunityMember {
                name: row.get("name").unwrap_or_default(),
                summary: row.get("summary").unwrap_or_default(),
                entity_type: row.get("entity_type").unwrap_or_default(),
            });
        }
        Ok(results)
    }

    /// Relationships where both endpoints belong to the given community.
    pub async fn fetch_community_relationships(
        &self,
        community: i64,
    ) -> Result<Vec<CommunityEdge>, GraphError> {
        let q = query(
            "MATCH (s:__Entity__ {community: $community})-[r:RELATIONSHIP]-(t:__Entity__ {community: $community})
             WHERE s.name < t.name
             RETURN DISTINCT s.name AS source, t.name AS target,
                    coalesce(r.description, '') AS description",
        )
        .param("community", community);

        let rows = self.query_rows(q).await?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            results.push(CommunityEdge {
                source: row.get("source").unwrap_or_default(),
                target: row.get("target").unwrap_or_default(),
                description: row.get("description").unwrap_or_default(),
            });
        }
        Ok(results)
    }

    /// Stored community reports, highest rated first.
    pub async fn fetch_community_reports(
        &self,
        limit: u32,
    ) -> Result<Vec<CommunityReportRow>, GraphError> {
        let q = query(
            "MATCH (c:__Community__)
             RETURN c.communityId AS community_id,
                    coalesce(c.title, '') AS title,
                    coalesce(c.summary, '') AS summary,
                    coalesce(c.rating, 0.0) AS rating,
                    coalesce(c.rating_explanation, '') AS rating_explanation
             ORDER BY rating DESC
             LIMIT $limit",
        )
        .param("limit", limit as i64);

        let rows = self.query_rows(q).await?;
        Ok(rows.into_iter().map(report_from_row).collect())
    }

    /// Reports for a specific set of communities.
    pub async fn fetch_reports_for_communities(
        &self,
        ids: &[i64],
    ) -> Result<Vec<CommunityReportRow>, GraphError> {
        let q = query(
            "MATCH (c:__Community__)
             WHERE c.communityId IN $ids
             RETURN c.communityId AS community_id,
                    coalesce(c.title, '') AS title,
                    coalesce(c.summary, '') AS summary,
                    coalesce(c.rating, 0.0) AS rating,
                    coalesce(c.rating_explanation, '') AS rating_explanation",
        )
        .param("ids", ids.to_vec());

        let rows = self.query_rows(q).await?;
        Ok(rows.into_iter().map(report_from_row).collect())
    }
}

fn report_from_row(row: neo4rs::Row) -> CommunityReportRow {
    CommunityReportRow {
        community_id: row.get("community_id").unwrap_or(-1),
        title: row.get("title").unwrap_or_default(),
        summary: row.get("summary").unwrap_or_default(),
        rating: row.get("rating").unwrap_or(0.0),
        rating_explanation: row.get("rating_explanation").unwrap_or_default(),
    }
}
