//! Persisted vector index using cosine similarity.
//!
//! [`VectorIndex`] keeps every [`IndexEntry`] in memory in insertion order and
//! performs an exhaustive scan on search. The whole index is written as one
//! JSON file under the persist directory and replaced atomically on rebuild.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::document::{IndexEntry, SearchResult};
use crate::error::{RagError, Result};

/// Name of the index file inside the persist directory.
pub const INDEX_FILE_NAME: &str = "index.json";

const FORMAT_VERSION: u32 = 1;
const METRIC: &str = "cosine";

#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    format_version: u32,
    metric: String,
    dimensions: usize,
    entries: Vec<IndexEntry>,
}

/// An immutable, fully built set of index entries.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    dimensions: usize,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Build an index from `entries` and persist it to `persist_dir`,
    /// replacing any index already stored there.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if entries disagree on dimension
    /// or the index cannot be written.
    pub fn build(entries: Vec<IndexEntry>, persist_dir: impl AsRef<Path>) -> Result<Self> {
        let index = Self::from_entries(entries)?;
        index.persist(persist_dir.as_ref())?;
        info!(
            entry_count = index.len(),
            dimensions = index.dimensions,
            path = %persist_dir.as_ref().display(),
            "built vector index"
        );
        Ok(index)
    }

    /// Build an in-memory index without touching disk.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if entries disagree on dimension.
    pub fn from_entries(entries: Vec<IndexEntry>) -> Result<Self> {
        let dimensions = entries.first().map_or(0, |entry| entry.embedding.len());
        if let Some(bad) = entries.iter().find(|entry| entry.embedding.len() != dimensions) {
            return Err(RagError::index(format!(
                "chunk '{}' has {} dimensions, expected {dimensions}",
                bad.chunk.id,
                bad.embedding.len()
            )));
        }
        Ok(Self { dimensions, entries })
    }

    /// Load a previously persisted index.
    ///
    /// Returns `Ok(None)` when no index has been persisted yet.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if the file exists but cannot be
    /// read or was written with a different format or metric.
    pub fn load(persist_dir: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = index_path(persist_dir.as_ref());
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no persisted index");
                return Ok(None);
            }
            Err(e) => {
                return Err(RagError::index(format!("failed to read {}: {e}", path.display())));
            }
        };

        let persisted: PersistedIndex = serde_json::from_slice(&bytes)
            .map_err(|e| RagError::index(format!("failed to parse {}: {e}", path.display())))?;
        if persisted.format_version != FORMAT_VERSION {
            return Err(RagError::index(format!(
                "unsupported index format version {}",
                persisted.format_version
            )));
        }
        if persisted.metric != METRIC {
            return Err(RagError::index(format!(
                "index was built with metric '{}', expected '{METRIC}'",
                persisted.metric
            )));
        }

        let index = Self::from_entries(persisted.entries)?;
        if !index.is_empty() && index.dimensions != persisted.dimensions {
            return Err(RagError::index(format!(
                "header declares {} dimensions, entries have {}",
                persisted.dimensions, index.dimensions
            )));
        }
        info!(entry_count = index.len(), path = %path.display(), "loaded vector index");
        Ok(Some(index))
    }

    /// Delete the persisted index file, if any.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if the file exists but cannot be
    /// removed.
    pub fn remove_persisted(persist_dir: impl AsRef<Path>) -> Result<()> {
        let path = index_path(persist_dir.as_ref());
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), "removed persisted index");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RagError::index(format!("failed to remove {}: {e}", path.display()))),
        }
    }

    /// Return up to `k` entries ranked by descending cosine similarity.
    ///
    /// Entries with equal scores keep their insertion order. A non-finite
    /// score (from a NaN or infinite embedding) ranks below every real one.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if `query` does not match the
    /// index dimension.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(RagError::index(format!(
                "query has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<SearchResult> = self
            .entries
            .iter()
            .map(|entry| {
                let score = cosine_similarity(&entry.embedding, query);
                SearchResult {
                    chunk: entry.chunk.clone(),
                    score: if score.is_finite() { score } else { f32::NEG_INFINITY },
                }
            })
            .collect();

        // `sort_by` is stable, which keeps insertion order among ties.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }

    /// Number of entries in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embedding dimension shared by every entry (0 for an empty index).
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    fn persist(&self, persist_dir: &Path) -> Result<()> {
        fs::create_dir_all(persist_dir).map_err(|e| {
            RagError::index(format!("failed to create {}: {e}", persist_dir.display()))
        })?;

        let persisted = PersistedIndex {
            format_version: FORMAT_VERSION,
            metric: METRIC.to_string(),
            dimensions: self.dimensions,
            entries: self.entries.clone(),
        };
        let bytes = serde_json::to_vec(&persisted)
            .map_err(|e| RagError::index(format!("failed to serialize index: {e}")))?;

        let target = index_path(persist_dir);
        let staging = persist_dir.join(format!("{INDEX_FILE_NAME}.tmp"));
        let write_staging = || -> std::io::Result<()> {
            let mut file = fs::File::create(&staging)?;
            file.write_all(&bytes)?;
            file.sync_all()
        };
        write_staging()
            .map_err(|e| RagError::index(format!("failed to write {}: {e}", staging.display())))?;
        fs::rename(&staging, &target).map_err(|e| {
            RagError::index(format!("failed to replace {}: {e}", target.display()))
        })?;
        Ok(())
    }
}

fn index_path(persist_dir: &Path) -> PathBuf {
    persist_dir.join(INDEX_FILE_NAME)
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Chunk;

    fn entry(id: &str, embedding: Vec<f32>) -> IndexEntry {
        IndexEntry {
            chunk: Chunk {
                id: id.to_string(),
                text: format!("text of {id}"),
                source_path: "a.txt".to_string(),
                chunk_index: 0,
                start: 0,
                end: 0,
            },
            embedding,
        }
    }

    #[test]
    fn ranks_by_cosine_and_keeps_insertion_order_on_ties() {
        let index = VectorIndex::from_entries(vec![
            entry("far", vec![0.0, 1.0]),
            entry("tie-a", vec![1.0, 1.0]),
            entry("near", vec![1.0, 0.0]),
            entry("tie-b", vec![2.0, 2.0]),
        ])
        .unwrap();

        let results = index.search(&[1.0, 0.0], 3).unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.chunk.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "tie-a", "tie-b"]);
    }

    #[test]
    fn zero_k_and_empty_index_return_nothing() {
        let index = VectorIndex::from_entries(vec![entry("a", vec![1.0])]).unwrap();
        assert!(index.search(&[1.0], 0).unwrap().is_empty());
        let empty = VectorIndex::from_entries(Vec::new()).unwrap();
        assert!(empty.search(&[1.0, 2.0], 5).unwrap().is_empty());
    }

    #[test]
    fn query_dimension_mismatch_is_an_error() {
        let index = VectorIndex::from_entries(vec![entry("a", vec![1.0, 0.0])]).unwrap();
        assert!(matches!(index.search(&[1.0], 1), Err(RagError::VectorStoreError { .. })));
    }

    #[test]
    fn mixed_dimensions_are_rejected() {
        let err = VectorIndex::from_entries(vec![entry("a", vec![1.0]), entry("b", vec![1.0, 0.0])])
            .unwrap_err();
        assert!(err.to_string().contains("'b'"));
    }

    #[test]
    fn load_from_missing_directory_is_none() {
        let temp = tempfile::tempdir().unwrap();
        assert!(VectorIndex::load(temp.path().join("db")).unwrap().is_none());
    }

    #[test]
    fn rebuild_replaces_persisted_index() {
        let temp = tempfile::tempdir().unwrap();
        VectorIndex::build(vec![entry("old", vec![1.0, 0.0])], temp.path()).unwrap();
        VectorIndex::build(vec![entry("new", vec![0.0, 1.0])], temp.path()).unwrap();

        let loaded = VectorIndex::load(temp.path()).unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.entries()[0].chunk.id, "new");
        assert!(!temp.path().join("index.json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join(INDEX_FILE_NAME), "{not json").unwrap();
        assert!(VectorIndex::load(temp.path()).is_err());
    }

    #[test]
    fn nan_embedding_ranks_last() {
        let index = VectorIndex::from_entries(vec![
            entry("broken", vec![f32::NAN, 0.0]),
            entry("far", vec![0.0, 1.0]),
            entry("near", vec![1.0, 0.0]),
        ])
        .unwrap();

        let results = index.search(&[1.0, 0.0], 3).unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.chunk.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "far", "broken"]);
        assert_eq!(results[2].score, f32::NEG_INFINITY);
    }

    #[test]
    fn remove_persisted_deletes_file_and_tolerates_absence() {
        let temp = tempfile::tempdir().unwrap();
        VectorIndex::build(vec![entry("a", vec![1.0])], temp.path()).unwrap();
        VectorIndex::remove_persisted(temp.path()).unwrap();
        assert!(VectorIndex::load(temp.path()).unwrap().is_none());
        VectorIndex::remove_persisted(temp.path()).unwrap();
    }

    #[test]
    fn zero_vector_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[2.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }
}
