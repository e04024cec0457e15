//! Connectivity smoke checks for the deployment's moving parts:
//! Neo4j over Bolt, Bedrock chat, and Bedrock embeddings.

use serde::Serialize;

use graphrag_graph::GraphClient;
use graphrag_llm::{ChatModel, ChatRequest, EmbeddingModel};

/// Result of one connectivity check.
#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub status: String,
    pub message: String,
}

impl CheckResult {
    fn connected(message: impl Into<String>) -> Self {
        Self {
            status: "connected".to_string(),
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }

    pub fn ok(&self) -> bool {
        self.status == "connected"
    }
}

/// Combined report across all checks.
#[derive(Debug, Serialize)]
pub struct DoctorReport {
    pub neo4j: CheckResult,
    pub chat: CheckResult,
    pub embedding: CheckResult,
}

impl DoctorReport {
    pub fn healthy(&self) -> bool {
        self.neo4j.ok() && self.chat.ok() && self.embedding.ok()
    }
}

/// Run every check. Individual failures are reported, not propagated.
pub async fn run_doctor(
    graph: &GraphClient,
    chat: &dyn ChatModel,
    embedder: &dyn EmbeddingModel,
) -> DoctorReport {
    let neo4j = match graph.ping().await {
        Ok(()) => CheckResult::connected("Neo4j connection successful"),
        Err(e) => CheckResult::error(format!("Neo4j connection failed: {e}")),
    };

    let mut request = ChatRequest::new("Reply with the single word OK.");
    request.max_tokens = 16;
    let chat_check = match chat.complete(request).await {
        Ok(response) => CheckResult::connected(format!(
            "Chat successful via {}, response length: {}",
            chat.model_id(),
            response.text.len()
        )),
        Err(e) => CheckResult::error(format!("Chat failed: {e}")),
    };

    let embedding = match embedder.embed("connectivity probe").await {
        Ok(vector) => {
            CheckResult::connected(format!("Embedding successful, dimensions: {}", vector.len()))
        }
        Err(e) => CheckResult::error(format!("Embedding failed: {e}")),
    };

    DoctorReport {
        neo4j,
        chat: chat_check,
        embedding,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_health_requires_all_checks() {
        let report = DoctorReport {
            neo4j: CheckResult::connected("ok"),
            chat: CheckResult::connected("ok"),
            embedding: CheckResult::error("down"),
        };
        assert!(!report.healthy());

        let report = DoctorReport {
            neo4j: CheckResult::connected("ok"),
            chat: CheckResult::connected("ok"),
            embedding: CheckResult::connected("ok"),
        };
        assert!(report.healthy());
    }
}
