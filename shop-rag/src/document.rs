//! Data types for documents, chunks, index entries, and search results.

use serde::{Deserialize, Serialize};

/// A plain-text file read from the corpus directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Path relative to the corpus root, using `/` separators.
    pub id: String,
    /// Path of the file as it was read.
    pub path: String,
    /// Full text content of the file.
    pub text: String,
}

impl Document {
    /// Create a document whose id equals its path.
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        let path = path.into();
        Self { id: path.clone(), path, text: text.into() }
    }
}

/// A bounded slice of a [`Document`], the unit of embedding and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// `{document_id}#{chunk_index}`.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// Path of the source document.
    pub source_path: String,
    /// Position of this chunk within its document.
    pub chunk_index: usize,
    /// Character offset (inclusive) of the chunk in the source text.
    pub start: usize,
    /// Character offset (exclusive) of the chunk in the source text.
    pub end: usize,
}

/// A chunk paired with its embedding, as stored in the index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexEntry {
    /// The embedded chunk.
    pub chunk: Chunk,
    /// Embedding vector for the chunk text.
    pub embedding: Vec<f32>,
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Cosine similarity to the query (higher is more relevant).
    pub score: f32,
}
