//! CLI entry point for the graphrag-index ingestion pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use graphrag_graph::admin::PIPELINE_LABELS;
use graphrag_graph::{GraphClient, GraphConfig};
use graphrag_index::config::IndexConfig;
use graphrag_index::doctor::run_doctor;
use graphrag_index::manifest::store_manifest;
use graphrag_index::pipeline::{ingest_books, BookInput};
use graphrag_index::summarize;
use graphrag_llm::{bedrock_client, BedrockChat, BedrockChatConfig, TitanEmbedding, TitanEmbeddingConfig};

#[derive(Parser)]
#[command(name = "graphrag-index")]
#[command(about = "Ingestion pipeline for the graphrag knowledge graph")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: graphrag).
    #[arg(short, long, default_value = "graphrag", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Command {
    /// Chunk, extract, and import text files (one book per file).
    Ingest {
        /// Input text files.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Condense entity and relationship descriptions, then embed summaries.
    Summarize {
        /// Skip the embedding pass.
        #[arg(long)]
        skip_embed: bool,
    },
    /// Check connectivity to Neo4j and the Bedrock models.
    Doctor,
    /// Wipe graph data.
    Clear {
        /// Delete everything, including indexes and constraints.
        #[arg(long, conflicts_with = "labels")]
        all: bool,
        /// Delete only the pipeline's own labels.
        #[arg(long)]
        labels: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let index_config = load_index_config(&cli.config)?;
    let chat_config = load_chat_config(&cli.config);
    let embed_config = load_embedding_config(&cli.config);

    let graph_config = load_graph_config(&cli.config);
    let graph = GraphClient::connect(&graph_config).await?;

    match cli.command {
        Command::Ingest { files } => {
            let mut books = Vec::with_capacity(files.len());
            for path in &files {
                let id = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .ok_or_else(|| anyhow::anyhow!("Cannot derive a book id from {path:?}"))?;
                let text = std::fs::read_to_string(path)?;
                books.push(BookInput { id, text });
            }

            let client = bedrock_client(&chat_config.region).await;
            let chat = Arc::new(BedrockChat::new(client, chat_config));

            let manifest = ingest_books(&graph, chat, &index_config, books).await?;
            store_manifest(&manifest, &index_config.runs_dir)?;
            println!("{}", serde_json::to_string_pretty(&manifest)?);

            if manifest.total_errors() > 0 {
                tracing::warn!(errors = manifest.total_errors(), "Ingest completed with errors");
            }
        }
        Command::Summarize { skip_embed } => {
            let client = bedrock_client(&chat_config.region).await;
            let chat = Arc::new(BedrockChat::new(client.clone(), chat_config));

            let entities =
                summarize::summarize_entities(&graph, chat.clone(), index_config.max_concurrent_requests)
                    .await?;
            let relationships =
                summarize::summarize_relationships(&graph, chat, index_config.max_concurrent_requests)
                    .await?;
            tracing::info!(entities, relationships, "Summarization complete");

            if !skip_embed {
                let embedder = Arc::new(TitanEmbedding::new(client, embed_config));
                let embedded =
                    summarize::embed_summaries(&graph, embedder, index_config.max_concurrent_requests)
                        .await?;
                tracing::info!(embedded, "Embedding complete");
            }
        }
        Command::Doctor => {
            let client = bedrock_client(&chat_config.region).await;
            let chat = BedrockChat::new(client.clone(), chat_config);
            let embedder = TitanEmbedding::new(client, embed_config);

            let report = run_doctor(&graph, &chat, &embedder).await;
            println!("{}", serde_json::to_string_pretty(&report)?);

            if !report.healthy() {
                anyhow::bail!("One or more connectivity checks failed");
            }
        }
        Command::Clear { all, labels } => {
            if all {
                let stats = graph.clear_all().await?;
                tracing::info!(
                    relationships = stats.deleted_relationships,
                    nodes = stats.deleted_nodes,
                    remaining = stats.remaining_nodes,
                    "Graph cleared"
                );
            } else if labels {
                let stats = graph.clear_labels(&PIPELINE_LABELS).await?;
                tracing::info!(deleted = stats.deleted_nodes, "Pipeline labels cleared");
            } else {
                anyhow::bail!("Specify --all (full wipe) or --labels (pipeline labels only)");
            }
        }
    }

    Ok(())
}

fn load_index_config(file_prefix: &str) -> anyhow::Result<IndexConfig> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("GRAPHRAG")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    match cfg.get::<IndexConfig>("index") {
        Ok(c) => Ok(c),
        Err(_) => Ok(IndexConfig::default()),
    }
}

fn load_chat_config(file_prefix: &str) -> BedrockChatConfig {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("GRAPHRAG")
                .separator("__")
                .try_parsing(true),
        )
        .build();

    match cfg {
        Ok(c) => c.get::<BedrockChatConfig>("llm").unwrap_or_default(),
        Err(_) => BedrockChatConfig::default(),
    }
}

fn load_embedding_config(file_prefix: &str) -> TitanEmbeddingConfig {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("GRAPHRAG")
                .separator("__")
                .try_parsing(true),
        )
        .build();

    match cfg {
        Ok(c) => c.get::<TitanEmbeddingConfig>("llm.embedding").unwrap_or_default(),
        Err(_) => TitanEmbeddingConfig::default(),
    }
}

fn load_graph_config(file_prefix: &str) -> GraphConfig {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("GRAPHRAG")
                .separator("__")
                .try_parsing(true),
        )
        .build();

    let defaults = GraphConfig::default();
    match cfg {
        Ok(c) => GraphConfig {
            uri: c
                .get_string("neo4j.uri")
                .ok()
                .or_else(|| std::env::var("NEO4J_URI").ok())
                .unwrap_or(defaults.uri),
            user: c
                .get_string("neo4j.user")
                .ok()
                .or_else(|| std::env::var("NEO4J_USERNAME").ok())
                .unwrap_or(defaults.user),
            password: c
                .get_string("neo4j.password")
                .ok()
                .or_else(|| std::env::var("NEO4J_PASSWORD").ok())
                .unwrap_or(defaults.password),
            max_connections: defaults.max_connections,
            fetch_size: defaults.fetch_size,
        },
        Err(_) => GraphConfig::default(),
    }
}
