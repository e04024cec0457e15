//! CLI entry point for graphrag-community analysis.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use graphrag_community::detect::detect_communities;
use graphrag_community::report::generate_reports;
use graphrag_graph::{GraphClient, GraphConfig};
use graphrag_llm::{bedrock_client, BedrockChat, BedrockChatConfig};

#[derive(Parser)]
#[command(name = "graphrag-community")]
#[command(about = "Community detection and reports for the graphrag knowledge graph")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: graphrag).
    #[arg(short, long, default_value = "graphrag", global = true)]
    config: String,

    /// Maximum concurrent model requests.
    #[arg(long, default_value_t = 4)]
    max_concurrent: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Compute connected-component communities and write assignments back.
    Detect,
    /// Generate a model-written report per multi-member community.
    Report,
    /// Detect, then report.
    Build,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let graph_config = load_graph_config(&cli.config);
    let graph = GraphClient::connect(&graph_config).await?;

    match cli.command {
        Command::Detect => {
            let stats = detect_communities(&graph).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Report => {
            let chat = connect_chat(&cli.config).await;
            let stats = generate_reports(&graph, chat, cli.max_concurrent).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Build => {
            let detect_stats = detect_communities(&graph).await?;
            let chat = connect_chat(&cli.config).await;
            let report_stats = generate_reports(&graph, chat, cli.max_concurrent).await?;

            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "detection": detect_stats,
                    "reports": report_stats,
                }))?
            );
        }
    }

    Ok(())
}

async fn connect_chat(file_prefix: &str) -> Arc<BedrockChat> {
    let chat_config = load_chat_config(file_prefix);
    let client = bedrock_client(&chat_config.region).await;
    Arc::new(BedrockChat::new(client, chat_config))
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
