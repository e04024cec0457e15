//! CLI entry point for graphrag-search.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use graphrag_graph::{GraphClient, GraphConfig};
use graphrag_llm::{
    bedrock_client, BedrockChat, BedrockChatConfig, TitanEmbedding, TitanEmbeddingConfig,
};
use graphrag_search::{global_search, local_search, GlobalSearchOptions, LocalSearchOptions};

#[derive(Parser)]
#[command(name = "graphrag-search")]
#[command(about = "Local and global search over the graphrag knowledge graph")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: graphrag).
    #[arg(short, long, default_value = "graphrag", global = true)]
    config: String,

    /// Target response length and format.
    #[arg(long, default_value = "multiple paragraphs", global = true)]
    response_type: String,
}

#[derive(Subcommand)]
enum Command {
    /// Entity-centric search over summaries, relationships, and sources.
    Local {
        /// The question to answer.
        question: String,

        /// Number of entities to anchor the context on.
        #[arg(long, default_value_t = 10)]
        top_k: usize,
    },
    /// Corpus-wide search over community reports (map-reduce).
    Global {
        /// The question to answer.
        question: String,

        /// Maximum community reports to consult.
        #[arg(long, default_value_t = 100)]
        report_limit: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let graph_config = load_graph_config(&cli.config);
    let graph = GraphClient::connect(&graph_config).await?;

    let chat_config = load_chat_config(&cli.config);
    let client = bedrock_client(&chat_config.region).await;
    let chat = Arc::new(BedrockChat::new(client.clone(), chat_config));

    match cli.command {
        Command::Local { question, top_k } => {
            let embed_config = load_embedding_config(&cli.config);
            let embedder = Arc::new(TitanEmbedding::new(client, embed_config));

            let options = LocalSearchOptions {
                top_k,
                response_type: cli.response_type,
                ..Default::default()
            };
            let result = local_search(&graph, chat, embedder, &question, &options).await?;

            tracing::info!(entities = ?result.entities, "Context entities");
            println!("{}", result.answer);
        }
        Command::Global {
            question,
            report_limit,
        } => {
            let options = GlobalSearchOptions {
                response_type: cli.response_type,
                report_limit,
                ..Default::default()
            };
            let result = global_search(&graph, chat, &question, &options).await?;

            tracing::info!(
                communities = result.communities_consulted,
                points = result.points_used,
                "Global search context"
            );
            println!("{}", result.answer);
        }
    }

    Ok(())
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
