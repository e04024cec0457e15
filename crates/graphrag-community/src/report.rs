//! Community report generation.
//!
//! Each multi-member community gets a model-written report: title, summary,
//! impact rating, and findings. The model is asked for JSON; output that
//! cannot be recovered as JSON falls back to a placeholder report so the
//! import stays total.

use std::sync::Arc;

use tokio::sync::Semaphore;

use graphrag_core::types::CommunityReport;
use graphrag_graph::queries::{CommunityEdge, CommunityMember};
use graphrag_graph::GraphClient;
use graphrag_llm::json::extract_json;
use graphrag_llm::{ChatModel, ChatRequest};

use crate::error::Result;
use crate::types::ReportStats;

/// At most this many entities and relationships are shown to the model per
/// community; very large communities are represented by a sample.
const MAX_CONTEXT_ROWS: usize = 10;

const COMMUNITY_REPORT_PROMPT: &str = r#"
You are an AI assistant that helps a human analyst to perform general information discovery. Information discovery is the process of identifying and assessing relevant information associated with certain entities (e.g., organizations and individuals) within a network.

# Goal
Write a comprehensive report of a community, given a list of entities that belong to the community as well as their relationships and optional associated claims. The report will be used to inform decision-makers about information associated with the community and their potential impact. The content of this report includes an overview of the community's key entities, their legal compliance, technical capabilities, reputation, and noteworthy claims.

# Report Structure

The report should include the following sections:

- TITLE: community's name that represents its key entities - title should be short but specific. When possible, include representative named entities in the title.
- SUMMARY: An executive summary of the community's overall structure, how its entities are related to each other, and significant information associated with its entities.
- IMPACT SEVERITY RATING: a float score between 0-10 that represents the severity of IMPACT posed by entities within the community.  IMPACT is the scored importance of a community.
- RATING EXPLANATION: Give a single sentence explanation of the IMPACT severity rating.
- DETAILED FINDINGS: A list of 5-10 key insights about the community. Each insight should have a short summary followed by multiple paragraphs of explanatory text grounded according to the grounding rules below. Be comprehensive.

Return output as a well-formed JSON-formatted string with the following format:
    {
        "title": <report_title>,
        "summary": <executive_summary>,
        "rating": <impact_severity_rating>,
        "rating_explanation": <rating_explanation>,
        "findings": [
            {
                "summary":<insight_1_summary>,
                "explanation": <insight_1_explanation>
            },
            {
                "summary":<insight_2_summary>,
                "explanation": <insight_2_explanation>
            }
        ]
    }

# Grounding Rules

Points supported by data should list their data references as follows:

"This is an example sentence supported by multiple data references [Data: <dataset name> (record ids); <dataset name> (record ids)]."

Do not list more than 5 record ids in a single reference. Instead, list the top 5 most relevant record ids and add "+more" to indicate that there are more.

For example:
"Person X is the owner of Company Y and subject to many allegations of wrongdoing [Data: Reports (1), Entities (5, 7); Relationships (23); Claims (7, 2, 34, 64, 46, +more)]."

where 1, 5, 7, 23, 2, 34, 46, and 64 represent the id (not the index) of the relevant data record.

Do not include information where the supporting evidence for it is not provided.


# Example Input
-----------
Text:

Entities

id,entity,description
5,VERDANT OASIS PLAZA,Verdant Oasis Plaza is the location of the Unity March
6,HARMONY ASSEMBLY,Harmony Assembly is an organization that is holding a march at Verdant Oasis Plaza

Relationships

id,source,target,description
37,VERDANT OASIS PLAZA,UNITY MARCH,Verdant Oasis Plaza is the location of the Unity March
38,VERDANT OASIS PLAZA,HARMONY ASSEMBLY,Harmony Assembly is holding a march at Verdant Oasis Plaza
39,VERDANT OASIS PLAZA,UNITY MARCH,The Unity March is taking place at Verdant Oasis Plaza
40,VERDANT OASIS PLAZA,TRIBUNE SPOTLIGHT,Tribune Spotlight is reporting on the Unity march taking place at Verdant Oasis Plaza
41,VERDANT OASIS PLAZA,BAILEY ASADI,Bailey Asadi is speaking at Verdant Oasis Plaza about the march
43,HARMONY ASSEMBLY,UNITY MARCH,Harmony Assembly is organizing the Unity March

Output:
{
    "title": "Verdant Oasis Plaza and Unity March",
    "summary": "The community revolves around the Verdant Oasis Plaza, which is the location of the Unity March. The plaza has relationships with the Harmony Assembly, Unity March, and Tribune Spotlight, all of which are associated with the march event.",
    "rating": 5.0,
    "rating_explanation": "The impact severity rating is moderate due to the potential for unrest or conflict during the Unity March.",
    "findings": [
        {
            "summary": "Verdant Oasis Plaza as the central location",
            "explanation": "Verdant Oasis Plaza is the central entity in this community, serving as the location for the Unity March. This plaza is the common link between all other entities, suggesting its significance in the community. The plaza's association with the march could potentially lead to issues such as public disorder or conflict, depending on the nature of the march and the reactions it provokes. [Data: Entities (5), Relationships (37, 38, 39, 40, 41,+more)]"
        },
        {
            "summary": "Harmony Assembly's role in the community",
            "explanation": "Harmony Assembly is another key entity in this community, being the organizer of the march at Verdant Oasis Plaza. The nature of Harmony Assembly and its march could be a potential source of threat, depending on their objectives and the reactions they provoke. The relationship between Harmony Assembly and the plaza is crucial in understanding the dynamics of this community. [Data: Entities(6), Relationships (38, 43)]"
        },
        {
            "summary": "Unity March as a significant event",
            "explanation": "The Unity March is a significant event taking place at Verdant Oasis Plaza. This event is a key factor in the community's dynamics and could be a potential source of threat, depending on the nature of the march and the reactions it provokes. The relationship between the march and the plaza is crucial in understanding the dynamics of this community. [Data: Relationships (39)]"
        },
        {
            "summary": "Role of Tribune Spotlight",
            "explanation": "Tribune Spotlight is reporting on the Unity March taking place in Verdant Oasis Plaza. This suggests that the event has attracted media attention, which could amplify its impact on the community. The role of Tribune Spotlight could be significant in shaping public perception of the event and the entities involved. [Data: Relationships (40)]"
        }
    ]
}


# Real Data

Use the following text for your answer. Do not make anything up in your answer.

Text:
{input_text}

Output:"#;

/// Render the report prompt for one community's members and relationships.
pub fn community_report_prompt(
    members: &[CommunityMember],
    relationships: &[CommunityEdge],
) -> String {
    let node_lines: Vec<String> = members
        .iter()
        .take(MAX_CONTEXT_ROWS)
        .enumerate()
        .map(|(i, m)| {
            let description = if m.summary.is_empty() {
                "No description available"
            } else {
                &m.summary
            };
            format!("{},{},{}", i + 1, m.name, description)
        })
        .collect();

    let rel_lines: Vec<String> = relationships
        .iter()
        .take(MAX_CONTEXT_ROWS)
        .enumerate()
        .map(|(i, r)| {
            let description = if r.description.is_empty() {
                format!("{} is related to {}", r.source, r.target)
            } else {
                r.description.clone()
            };
            format!("{},{},{},{}", i + 1, r.source, r.target, description)
        })
        .collect();

    let input_text = format!(
        "Entities\n\nid,entity,description\n{}\n\nRelationships\n\nid,source,target,description\n{}\n",
        node_lines.join("\n"),
        rel_lines.join("\n")
    );

    COMMUNITY_REPORT_PROMPT.replace("{input_text}", &input_text)
}

/// Recover a report from model output. The second element is true when the
/// fallback placeholder was used.
pub fn parse_report(text: &str) -> (CommunityReport, bool) {
    let recovered = extract_json(text).and_then(|v| serde_json::from_value::<CommunityReport>(v).ok());
    match recovered {
        Some(report) => (report, false),
        None => {
            tracing::warn!(
                head = %text.chars().take(120).collect::<String>(),
                "Could not recover report JSON, using fallback"
            );
            (CommunityReport::fallback(), true)
        }
    }
}

/// Generate and import a report for every multi-member community.
pub async fn generate_reports(
    graph: &GraphClient,
    chat: Arc<dyn ChatModel>,
    max_concurrent: usize,
) -> Result<ReportStats> {
    let communities = graph.list_multi_member_communities().await?;
    tracing::info!(count = communities.len(), "Generating community reports");

    let semaphore = Arc::new(Semaphore::new(max_concurrent));
    let mut handles = Vec::with_capacity(communities.len());

    for community in communities {
        let graph = graph.clone();
        let chat = chat.clone();
        let semaphore = semaphore.clone();

        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire().await.expect("Semaphore closed");

            let members = graph.fetch_community_members(community.id).await?;
            let relationships = graph.fetch_community_relationships(community.id).await?;

            let prompt = community_report_prompt(&members, &relationships);
            let response = chat.complete(ChatRequest::new(prompt)).await?;
            let (report, fallback) = parse_report(&response.text);

            let names: Vec<String> = members.into_iter().map(|m| m.name).collect();
            graph
                .import_community_report(community.id, &report, &names)
                .await?;

            tracing::debug!(community = community.id, title = %report.title, "Report imported");
            Ok::<_, crate::error::CommunityError>(fallback)
        }));
    }

    let mut stats = ReportStats {
        communities: handles.len(),
        reports_generated: 0,
        fallbacks: 0,
    };

    for handle in handles {
        match handle.await {
            Ok(Ok(fallback)) => {
                stats.reports_generated += 1;
                if fallback {
                    stats.fallbacks += 1;
                }
            }
            Ok(Err(e)) => tracing::warn!(error = %e, "Report generation failed, skipping"),
            Err(e) => tracing::error!(error = %e, "Report task panicked"),
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(name: &str, summary: &str) -> CommunityMember {
        CommunityMember {
            name: name.to_string(),
            summary: summary.to_string(),
            entity_type: "ORGANIZATION".to_string(),
        }
    }

    fn edge(source: &str, target: &str, description: &str) -> CommunityEdge {
        CommunityEdge {
            source: source.to_string(),
            target: target.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn prompt_contains_member_rows() {
        let members = vec![member("ACME", "A company"), member("BOB", "Founder of Acme")];
        let rels = vec![edge("BOB", "ACME", "Bob founded Acme")];

        let prompt = community_report_prompt(&members, &rels);
        assert!(prompt.contains("1,ACME,A company"));
        assert!(prompt.contains("2,BOB,Founder of Acme"));
        assert!(prompt.contains("1,BOB,ACME,Bob founded Acme"));
        assert!(!prompt.contains("{input_text}"));
    }

    #[test]
    fn prompt_caps_context_rows() {
        let members: Vec<CommunityMember> = (0..25)
            .map(|i| member(&format!("E{i}"), "desc"))
            .collect();
        let prompt = community_report_prompt(&members, &[]);

        assert!(prompt.contains("10,E9,desc"));
        assert!(!prompt.contains("11,E10,desc"));
    }

    #[test]
    fn prompt_fills_missing_descriptions() {
        let members = vec![member("X", "")];
        let rels = vec![edge("X", "Y", "")];
        let prompt = community_report_prompt(&members, &rels);

        assert!(prompt.contains("1,X,No description available"));
        assert!(prompt.contains("X is related to Y"));
    }

    #[test]
    fn parse_report_accepts_fenced_json() {
        let text = "```json\n{\"title\":\"T\",\"summary\":\"S\",\"rating\":7.0,\"rating_explanation\":\"E\",\"findings\":[]}\n```";
        let (report, fallback) = parse_report(text);
        assert!(!fallback);
        assert_eq!(report.title, "T");
        assert!((report.rating - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_report_falls_back_on_garbage() {
        let (report, fallback) = parse_report("I am unable to produce a report.");
        assert!(fallback);
        assert_eq!(report.title, "Unknown Community");
        assert!((report.rating - 5.0).abs() < f64::EPSILON);
    }
}
