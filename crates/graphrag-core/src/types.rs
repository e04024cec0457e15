//! Core domain types for the graphrag knowledge graph.
//!
//! These types carry data between the extraction, import, community analysis,
//! and search stages. The knowledge graph itself holds `Book`, `__Chunk__`,
//! `__Entity__`, and `__Community__` nodes; the structs here are their
//! in-flight representations.

use serde::{Deserialize, Serialize};

// ── Extraction Records ────────────────────────────────────────────

/// A single entity mention extracted from one chunk of text.
///
/// The same entity name may appear across many chunks; descriptions are
/// accumulated on the graph node and condensed later by summarization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedEntity {
    /// Entity name, capitalized by the extraction prompt.
    pub name: String,
    /// One of the configured entity types (e.g. "PERSON", "ORGANIZATION").
    pub entity_type: String,
    /// Description of the entity as seen in this chunk.
    pub description: String,
}

/// A directed relationship between two extracted entities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedRelationship {
    pub source: String,
    pub target: String,
    pub description: String,
    /// Numeric relationship strength reported by the model.
    pub strength: f64,
}

// ── Community Reports ─────────────────────────────────────────────

/// A generated report describing one entity community.
///
/// Mirrors the JSON shape the report prompt asks the model to produce;
/// persisted onto `__Community__` nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityReport {
    pub title: String,
    pub summary: String,
    pub rating: f64,
    pub rating_explanation: String,
    #[serde(default)]
    pub findings: Vec<Finding>,
}

/// A single insight within a community report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub summary: String,
    pub explanation: String,
}

impl CommunityReport {
    /// Placeholder report used when the model output cannot be recovered
    /// as JSON. Keeps the import pipeline total.
    pub fn fallback() -> Self {
        Self {
            title: "Unknown Community".to_string(),
            summary: "Failed to parse community summary".to_string(),
            rating: 5.0,
            rating_explanation: "Default rating due to parsing failure".to_string(),
            findings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn community_report_deserializes_prompt_shape() {
        let json = r#"{
            "title": "Verdant Oasis Plaza and Unity March",
            "summary": "The community revolves around the Verdant Oasis Plaza.",
            "rating": 5.0,
            "rating_explanation": "Moderate impact severity.",
            "findings": [
                {"summary": "Central location", "explanation": "The plaza links all entities."}
            ]
        }"#;

        let report: CommunityReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.title, "Verdant Oasis Plaza and Unity March");
        assert_eq!(report.findings.len(), 1);
        assert!((report.rating - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn community_report_tolerates_missing_findings() {
        let json = r#"{
            "title": "T",
            "summary": "S",
            "rating": 2.5,
            "rating_explanation": "E"
        }"#;

        let report: CommunityReport = serde_json::from_str(json).unwrap();
        assert!(report.findings.is_empty());
    }

    #[test]
    fn extraction_record_roundtrip() {
        let rel = ExtractedRelationship {
            source: "MARTIN SMITH".to_string(),
            target: "CENTRAL INSTITUTION".to_string(),
            description: "Martin Smith is the Chair of the Central Institution".to_string(),
            strength: 9.0,
        };

        let json = serde_json::to_string(&rel).unwrap();
        let back: ExtractedRelationship = serde_json::from_str(&json).unwrap();
        assert_eq!(rel, back);
    }
}
