//! Document chunking.
//!
//! [`FixedSizeChunker`] splits text purely by character count. It does not
//! look for sentence or paragraph boundaries.

use crate::document::{Chunk, Document};

/// A strategy for splitting documents into chunks.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has no non-whitespace text.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;

    /// Chunk every document, preserving document order.
    fn chunk_all(&self, documents: &[Document]) -> Vec<Chunk> {
        documents.iter().flat_map(|document| self.chunk(document)).collect()
    }
}

/// Splits text into windows of `chunk_size` characters.
///
/// Consecutive windows share `chunk_overlap` characters. The last chunk of a
/// document may be shorter than `chunk_size`. Offsets are counted in
/// characters, so multi-byte text is never split inside a code point.
///
/// # Example
///
/// ```rust,ignore
/// use shop_rag::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(1000, 0);
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of characters shared by consecutive chunks
    ///
    /// A `chunk_size` of zero is treated as one, and an overlap that is not
    /// smaller than the chunk size is clamped to `chunk_size - 1`.
    /// [`RagConfig`](crate::RagConfig) rejects both cases up front.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self { chunk_size, chunk_overlap: chunk_overlap.min(chunk_size - 1) }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.trim().is_empty() {
            return Vec::new();
        }

        // Byte offset of every char boundary, plus the end of the text.
        let boundaries: Vec<usize> = document
            .text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(document.text.len()))
            .collect();
        let char_count = boundaries.len() - 1;
        let step = self.chunk_size - self.chunk_overlap;

        let mut chunks = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(char_count);
            let chunk_index = chunks.len();
            chunks.push(Chunk {
                id: format!("{}#{chunk_index}", document.id),
                text: document.text[boundaries[start]..boundaries[end]].to_string(),
                source_path: document.path.clone(),
                chunk_index,
                start,
                end,
            });
            if end >= char_count {
                break;
            }
            start += step;
        }

        chunks
    }
}
