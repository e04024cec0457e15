//! Administrative maintenance: wiping graph data between ingest runs.

use neo4rs::query;

use crate::client::{GraphClient, GraphError};

/// Labels owned by the pipeline, used by the selective clear.
pub const PIPELINE_LABELS: [&str; 4] = ["__Entity__", "__Chunk__", "__Community__", "Book"];

/// Outcome of a full clear.
#[derive(Debug, Default)]
pub struct ClearStats {
    pub deleted_relationships: i64,
    pub deleted_nodes: i64,
    pub remaining_nodes: i64,
}

/// Outcome of a selective clear.
#[derive(Debug, Default)]
pub struct LabelClearStats {
    pub labels: Vec<String>,
    pub deleted_nodes: i64,
}

impl GraphClient {
    /// Delete everything: relationships, nodes, constraints, indexes.
    ///
    /// Constraints are dropped before indexes since they own their backing
    /// indexes; individual drop failures are logged and skipped.
    pub async fn clear_all(&self) -> Result<ClearStats, GraphError> {
        let mut stats = ClearStats::default();

        let q = query("MATCH ()-[r]->() DELETE r RETURN count(r) AS deleted");
        if let Some(row) = self.query_one(q).await? {
            stats.deleted_relationships = row.get("deleted").unwrap_or(0);
        }

        let q = query("MATCH (n) DELETE n RETURN count(n) AS deleted");
        if let Some(row) = self.query_one(q).await? {
            stats.deleted_nodes = row.get("deleted").unwrap_or(0);
        }

        for name in self.schema_names("SHOW CONSTRAINTS").await? {
            let drop = format!("DROP CONSTRAINT {name}");
            if let Err(e) = self.run(query(&drop)).await {
                tracing::warn!(constraint = %name, error = %e, "Failed to drop constraint");
            }
        }

        for name in self.schema_names("SHOW INDEXES").await? {
            let drop = format!("DROP INDEX {name}");
            if let Err(e) = self.run(query(&drop)).await {
                tracing::warn!(index = %name, error = %e, "Failed to drop index");
            }
        }

        let q = query("MATCH (n) RETURN count(n) AS remaining");
        if let Some(row) = self.query_one(q).await? {
            stats.remaining_nodes = row.get("remaining").unwrap_or(0);
        }

        if stats.remaining_nodes > 0 {
            tracing::warn!(
                remaining = stats.remaining_nodes,
                "Nodes remain after clear; check for system nodes"
            );
        }

        Ok(stats)
    }

    /// Detach-delete only the pipeline's own labels.
    pub async fn clear_labels(&self, labels: &[&str]) -> Result<LabelClearStats, GraphError> {
        let mut stats = LabelClearStats::default();

        for label in labels {
            if !label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                return Err(GraphError::InvalidLabel(label.to_string()));
            }

            let cypher = format!(
                "MATCH (n:{label})
                 DETACH DELETE n
                 RETURN count(n) AS deleted"
            );

            let deleted = match self.query_one(query(&cypher)).await? {
                Some(row) => row.get("deleted").unwrap_or(0),
                None => 0,
            };

            tracing::info!(label, deleted, "Cleared label");
            stats.labels.push(label.to_string());
            stats.deleted_nodes += deleted;
        }

        Ok(stats)
    }

    /// Names returned by a SHOW CONSTRAINTS / SHOW INDEXES query.
    async fn schema_names(&self, show: &str) -> Result<Vec<String>, GraphError> {
        let rows = self.query_rows(query(show)).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.get::<String>("name").ok())
            .filter(|name| !name.is_empty())
            .collect())
    }
}
