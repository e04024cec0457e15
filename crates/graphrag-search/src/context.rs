//! Similarity ranking and context-table assembly for local search.

use graphrag_llm::cosine_similarity;

use graphrag_graph::queries::{
    CommunityReportRow, EntityEmbedding, SummarizedRelationship,
};

/// An entity ranked against the query embedding.
#[derive(Debug, Clone)]
pub struct RankedEntity {
    pub entity: EntityEmbedding,
    pub score: f32,
}

/// Rank entities by cosine similarity to the query, best first, keeping the
/// top `k`.
pub fn rank_entities(
    query_embedding: &[f32],
    entities: Vec<EntityEmbedding>,
    k: usize,
) -> Vec<RankedEntity> {
    let mut ranked: Vec<RankedEntity> = entities
        .into_iter()
        .map(|entity| {
            let score = cosine_similarity(query_embedding, &entity.embedding);
            RankedEntity { entity, score }
        })
        .collect();

    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(k);
    ranked
}

/// Assemble the local-search data tables: entities, relationships, community
/// reports, and source chunk excerpts.
pub fn format_local_context(
    entities: &[RankedEntity],
    relationships: &[SummarizedRelationship],
    reports: &[CommunityReportRow],
    sources: &[String],
) -> String {
    let mut out = String::new();

    out.push_str("Entities\n\nid,entity,description\n");
    for (i, ranked) in entities.iter().enumerate() {
        out.push_str(&format!(
            "{},{},{}\n",
            i + 1,
            ranked.entity.name,
            single_line(&ranked.entity.summary)
        ));
    }

    out.push_str("\nRelationships\n\nid,source,target,description\n");
    for (i, rel) in relationships.iter().enumerate() {
        out.push_str(&format!(
            "{},{},{},{}\n",
            i + 1,
            rel.source,
            rel.target,
            single_line(&rel.summary)
        ));
    }

    if !reports.is_empty() {
        out.push_str("\nReports\n\nid,title,summary\n");
        for report in reports {
            out.push_str(&format!(
                "{},{},{}\n",
                report.community_id,
                single_line(&report.title),
                single_line(&report.summary)
            ));
        }
    }

    if !sources.is_empty() {
        out.push_str("\nSources\n\nid,text\n");
        for (i, text) in sources.iter().enumerate() {
            out.push_str(&format!("{},{}\n", i + 1, single_line(text)));
        }
    }

    out
}

/// Collapse newlines so each record stays a single table row.
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(name: &str, embedding: Vec<f32>) -> EntityEmbedding {
        EntityEmbedding {
            name: name.to_string(),
            summary: format!("{name} summary"),
            community: 0,
            embedding,
        }
    }

    #[test]
    fn ranking_orders_by_similarity() {
        let query = vec![1.0, 0.0];
        let entities = vec![
            entity("ORTHOGONAL", vec![0.0, 1.0]),
            entity("ALIGNED", vec![1.0, 0.0]),
            entity("PARTIAL", vec![0.7, 0.7]),
        ];

        let ranked = rank_entities(&query, entities, 3);
        assert_eq!(ranked[0].entity.name, "ALIGNED");
        assert_eq!(ranked[1].entity.name, "PARTIAL");
        assert_eq!(ranked[2].entity.name, "ORTHOGONAL");
    }

    #[test]
    fn ranking_truncates_to_k() {
        let query = vec![1.0, 0.0];
        let entities = (0..20)
            .map(|i| entity(&format!("E{i}"), vec![1.0, i as f32 * 0.1]))
            .collect();

        let ranked = rank_entities(&query, entities, 5);
        assert_eq!(ranked.len(), 5);
    }

    #[test]
    fn context_includes_all_sections() {
        let entities = vec![RankedEntity {
            entity: entity("ACME", vec![1.0]),
            score: 0.9,
        }];
        let relationships = vec![SummarizedRelationship {
            source: "ACME".to_string(),
            target: "BOB".to_string(),
            summary: "Bob founded\nAcme".to_string(),
        }];
        let reports = vec![CommunityReportRow {
            community_id: 0,
            title: "Acme community".to_string(),
            summary: "About Acme".to_string(),
            rating: 5.0,
            rating_explanation: String::new(),
        }];
        let sources = vec!["Bob founded Acme in 2001.".to_string()];

        let context = format_local_context(&entities, &relationships, &reports, &sources);
        assert!(context.contains("1,ACME,ACME summary"));
        assert!(context.contains("1,ACME,BOB,Bob founded Acme"));
        assert!(context.contains("0,Acme community,About Acme"));
        assert!(context.contains("1,Bob founded Acme in 2001."));
    }

    #[test]
    fn empty_sections_are_omitted() {
        let context = format_local_context(&[], &[], &[], &[]);
        assert!(context.contains("Entities"));
        assert!(context.contains("Relationships"));
        assert!(!context.contains("Reports"));
        assert!(!context.contains("Sources"));
    }
}
