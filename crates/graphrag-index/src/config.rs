//! Configuration for the graphrag-index ingestion pipeline.

use serde::Deserialize;

/// Top-level index configuration.
///
/// Loaded from the `graphrag.toml` `[index]` section or
/// `GRAPHRAG__INDEX__` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    /// Entity types the extraction prompt asks for.
    #[serde(default = "default_entity_types")]
    pub entity_types: Vec<String>,

    /// Target chunk size in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap carried between adjacent chunks, in characters.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Snap chunk boundaries to whitespace.
    #[serde(default = "default_true")]
    pub split_on_whitespace_only: bool,

    /// Maximum concurrent model requests.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,

    /// Directory for run manifests.
    #[serde(default = "default_runs_dir")]
    pub runs_dir: String,
}

fn default_entity_types() -> Vec<String> {
    ["ORGANIZATION", "PERSON", "LOCATION", "EVENT"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_max_concurrent() -> usize {
    4
}

fn default_runs_dir() -> String {
    "./runs".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            entity_types: default_entity_types(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            split_on_whitespace_only: true,
            max_concurrent_requests: default_max_concurrent(),
            runs_dir: default_runs_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IndexConfig::default();
        assert_eq!(config.entity_types.len(), 4);
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 100);
        assert!(config.split_on_whitespace_only);
        assert_eq!(config.max_concurrent_requests, 4);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let cfg = config::Config::builder()
            .add_source(config::File::from_str(
                "chunk_size = 500",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let config: IndexConfig = cfg.try_deserialize().unwrap();
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunk_overlap, 100);
        assert_eq!(config.entity_types.len(), 4);
    }
}
