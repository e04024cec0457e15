//! Ingest run manifests.
//!
//! Every ingest run records what it processed into a JSON file under a
//! dated directory tree:
//!
//! ```text
//! {runs_dir}/
//!   2026/
//!     08/
//!       06/
//!         {run_id}.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-book counters for one ingest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookRunStats {
    pub book_id: String,
    pub chunks: usize,
    pub entities: usize,
    pub relationships: usize,
    pub errors: usize,
}

impl BookRunStats {
    pub fn new(book_id: &str) -> Self {
        Self {
            book_id: book_id.to_string(),
            chunks: 0,
            entities: 0,
            relationships: 0,
            errors: 0,
        }
    }
}

/// Record of one complete ingest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub books: Vec<BookRunStats>,
}

impl RunManifest {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            completed_at: None,
            books: Vec::new(),
        }
    }

    pub fn record_book(&mut self, stats: BookRunStats) {
        self.books.push(stats);
    }

    pub fn finalize(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    pub fn total_chunks(&self) -> usize {
        self.books.iter().map(|b| b.chunks).sum()
    }

    pub fn total_errors(&self) -> usize {
        self.books.iter().map(|b| b.errors).sum()
    }
}

impl Default for RunManifest {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a finalized manifest to its dated path. Returns the file path.
pub fn store_manifest(manifest: &RunManifest, runs_dir: &str) -> std::io::Result<PathBuf> {
    let date = manifest.started_at;
    let dir = Path::new(runs_dir)
        .join(format!("{:04}", date.year()))
        .join(format!("{:02}", date.month()))
        .join(format!("{:02}", date.day()));
    fs::create_dir_all(&dir)?;

    let path = dir.join(format!("{}.json", manifest.id));
    let json = serde_json::to_vec_pretty(manifest)?;
    fs::write(&path, json)?;

    tracing::info!(path = %path.display(), "Stored run manifest");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalize_sets_completion_time() {
        let mut manifest = RunManifest::new();
        assert!(manifest.completed_at.is_none());
        manifest.finalize();
        assert!(manifest.completed_at.is_some());
    }

    #[test]
    fn totals_sum_across_books() {
        let mut manifest = RunManifest::new();
        manifest.record_book(BookRunStats {
            book_id: "a".to_string(),
            chunks: 3,
            entities: 10,
            relationships: 5,
            errors: 1,
        });
        manifest.record_book(BookRunStats {
            book_id: "b".to_string(),
            chunks: 2,
            entities: 4,
            relationships: 2,
            errors: 0,
        });

        assert_eq!(manifest.total_chunks(), 5);
        assert_eq!(manifest.total_errors(), 1);
    }

    #[test]
    fn store_and_read_back() {
        let dir = std::env::temp_dir().join(format!("graphrag-manifest-{}", Uuid::new_v4()));
        let runs_dir = dir.to_string_lossy().to_string();

        let mut manifest = RunManifest::new();
        manifest.record_book(BookRunStats::new("book"));
        manifest.finalize();

        let path = store_manifest(&manifest, &runs_dir).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        let back: RunManifest = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.id, manifest.id);
        assert_eq!(back.books.len(), 1);

        fs::remove_dir_all(&dir).unwrap();
    }
}
