//! Global search: map-reduce over community reports.
//!
//! The map stage scores key points per batch of reports; the reduce stage
//! synthesizes the ranked points into the final answer. Batches are sized
//! by token budget so each map call stays well inside the context window.

use std::sync::Arc;

use tokio::sync::Semaphore;

use graphrag_core::chunk::token_count;
use graphrag_graph::queries::CommunityReportRow;
use graphrag_graph::GraphClient;
use graphrag_llm::json::extract_json;
use graphrag_llm::{ChatModel, ChatRequest};

use crate::error::Result;
use crate::prompts::{map_prompt, reduce_prompt, DEFAULT_RESPONSE_TYPE};

/// Standard refusal when the reports cannot support an answer.
pub const NO_DATA_ANSWER: &str =
    "I am sorry but I am unable to answer this question given the provided data.";

#[derive(Debug, Clone)]
pub struct GlobalSearchOptions {
    pub response_type: String,
    /// Maximum community reports fetched (highest rated first).
    pub report_limit: u32,
    /// Token budget per map batch and for the reduce context.
    pub token_budget: usize,
    pub max_concurrent: usize,
}

impl Default for GlobalSearchOptions {
    fn default() -> Self {
        Self {
            response_type: DEFAULT_RESPONSE_TYPE.to_string(),
            report_limit: 100,
            token_budget: 8000,
            max_concurrent: 4,
        }
    }
}

/// A scored key point from the map stage.
#[derive(Debug, Clone)]
pub struct MapPoint {
    pub description: String,
    pub score: f64,
}

/// Result of a global search.
#[derive(Debug, Clone)]
pub struct GlobalAnswer {
    pub answer: String,
    pub communities_consulted: usize,
    pub points_used: usize,
}

/// Answer a corpus-wide question by map-reducing over community reports.
pub async fn global_search(
    graph: &GraphClient,
    chat: Arc<dyn ChatModel>,
    question: &str,
    options: &GlobalSearchOptions,
) -> Result<GlobalAnswer> {
    let reports = graph.fetch_community_reports(options.report_limit).await?;
    if reports.is_empty() {
        tracing::warn!("No community reports in the graph; run graphrag-community first");
        return Ok(GlobalAnswer {
            answer: NO_DATA_ANSWER.to_string(),
            communities_consulted: 0,
            points_used: 0,
        });
    }

    let communities_consulted = reports.len();
    let batches = batch_reports(&reports, options.token_budget);
    tracing::info!(
        reports = communities_consulted,
        batches = batches.len(),
        "Running map stage"
    );

    // Map: score key points per batch, concurrently.
    let semaphore = Arc::new(Semaphore::new(options.max_concurrent));
    let mut handles = Vec::with_capacity(batches.len());
    for batch in batches {
        let chat = chat.clone();
        let semaphore = semaphore.clone();
        let question = question.to_string();

        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire().await.expect("Semaphore closed");
            let request = ChatRequest::new(question).with_system(map_prompt(&batch));
            chat.complete(request).await.map(|r| parse_map_response(&r.text))
        }));
    }

    let mut points: Vec<MapPoint> = Vec::new();
    for handle in handles {
        match handle.await {
            Ok(Ok(batch_points)) => points.extend(batch_points),
            Ok(Err(e)) => tracing::warn!(error = %e, "Map batch failed, skipping"),
            Err(e) => tracing::error!(error = %e, "Map task panicked"),
        }
    }

    points.retain(|p| p.score > 0.0);
    points.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    if points.is_empty() {
        return Ok(GlobalAnswer {
            answer: NO_DATA_ANSWER.to_string(),
            communities_consulted,
            points_used: 0,
        });
    }

    // Reduce: synthesize ranked points within the token budget.
    let report_data = format_ranked_points(&points, options.token_budget);
    let points_used = report_data.matches("Importance Score:").count();

    let request = ChatRequest::new(question.to_string())
        .with_system(reduce_prompt(&report_data, &options.response_type));
    let response = chat.complete(request).await?;

    Ok(GlobalAnswer {
        answer: response.text,
        communities_consulted,
        points_used,
    })
}

/// Group report rows into context batches within the token budget. Every
/// batch holds at least one report.
pub fn batch_reports(reports: &[CommunityReportRow], token_budget: usize) -> Vec<String> {
    const HEADER: &str = "-----Reports-----\nid,title,summary,rating\n";

    let mut batches = Vec::new();
    let mut current = String::from(HEADER);
    let mut current_tokens = token_count(HEADER);

    for report in reports {
        let row = format!(
            "{},{},{},{}\n",
            report.community_id,
            report.title.replace('\n', " "),
            report.summary.replace('\n', " "),
            report.rating
        );
        let row_tokens = token_count(&row);

        if current_tokens + row_tokens > token_budget && current.len() > HEADER.len() {
            batches.push(current);
            current = String::from(HEADER);
            current_tokens = token_count(HEADER);
        }

        current.push_str(&row);
        current_tokens += row_tokens;
    }

    if current.len() > HEADER.len() {
        batches.push(current);
    }
    batches
}

/// Parse a map-stage response into scored points. Anything unrecoverable
/// yields an empty list.
pub fn parse_map_response(text: &str) -> Vec<MapPoint> {
    let Some(value) = extract_json(text) else {
        tracing::warn!("Map response was not JSON, dropping batch");
        return Vec::new();
    };

    let Some(points) = value.get("points").and_then(|p| p.as_array()) else {
        return Vec::new();
    };

    points
        .iter()
        .filter_map(|point| {
            let description = point.get("description")?.as_str()?.to_string();
            let score = point.get("score")?.as_f64()?;
            Some(MapPoint { description, score })
        })
        .collect()
}

/// Format ranked points as analyst-report context, best first, stopping at
/// the token budget.
fn format_ranked_points(points: &[MapPoint], token_budget: usize) -> String {
    let mut out = String::new();
    let mut used_tokens = 0usize;

    for (i, point) in points.iter().enumerate() {
        let section = format!(
            "----Analyst {}----\nImportance Score: {}\n{}\n\n",
            i + 1,
            point.score,
            point.description
        );
        let section_tokens = token_count(&section);
        if used_tokens + section_tokens > token_budget && !out.is_empty() {
            break;
        }
        out.push_str(&section);
        used_tokens += section_tokens;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(id: i64, title: &str, summary: &str, rating: f64) -> CommunityReportRow {
        CommunityReportRow {
            community_id: id,
            title: title.to_string(),
            summary: summary.to_string(),
            rating,
            rating_explanation: String::new(),
        }
    }

    #[test]
    fn batching_keeps_all_reports() {
        let reports: Vec<CommunityReportRow> = (0..10)
            .map(|i| report(i, &format!("Community {i}"), "A summary of the community.", 5.0))
            .collect();

        let batches = batch_reports(&reports, 60);
        assert!(batches.len() > 1);

        let joined = batches.join("");
        for i in 0..10 {
            assert!(joined.contains(&format!("Community {i}")));
        }
    }

    #[test]
    fn single_batch_when_budget_is_large() {
        let reports = vec![report(0, "A", "short", 1.0), report(1, "B", "short", 2.0)];
        let batches = batch_reports(&reports, 100_000);
        assert_eq!(batches.len(), 1);
    }

    #[test]
    fn no_reports_yield_no_batches() {
        assert!(batch_reports(&[], 1000).is_empty());
    }

    #[test]
    fn map_response_parses_points() {
        let text = r#"{"points": [
            {"description": "Point one [Data: Reports (1)]", "score": 80},
            {"description": "Point two", "score": 20.5}
        ]}"#;

        let points = parse_map_response(text);
        assert_eq!(points.len(), 2);
        assert!((points[0].score - 80.0).abs() < f64::EPSILON);
        assert!((points[1].score - 20.5).abs() < f64::EPSILON);
    }

    #[test]
    fn map_response_skips_malformed_points() {
        let text = r#"{"points": [
            {"description": "good", "score": 10},
            {"score": 50},
            {"description": "no score"}
        ]}"#;

        let points = parse_map_response(text);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].description, "good");
    }

    #[test]
    fn map_response_tolerates_prose() {
        assert!(parse_map_response("I cannot answer this.").is_empty());
    }

    #[test]
    fn ranked_points_respect_budget() {
        let points: Vec<MapPoint> = (0..50)
            .map(|i| MapPoint {
                description: format!("Observation number {i} about the dataset."),
                score: (100 - i) as f64,
            })
            .collect();

        let formatted = format_ranked_points(&points, 100);
        assert!(formatted.contains("Observation number 0"));
        assert!(!formatted.contains("Observation number 49"));
        // Best point survives even under a tiny budget.
        let tiny = format_ranked_points(&points, 1);
        assert!(tiny.contains("Observation number 0"));
    }
}
