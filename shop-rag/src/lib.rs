//! # shop-rag
//!
//! Retrieval-augmented question answering over a directory of plain-text
//! files.
//!
//! ## Overview
//!
//! - [`load_documents`] reads the corpus
//! - [`FixedSizeChunker`] splits documents into character windows
//! - [`EmbeddingProvider`] turns chunks and questions into vectors
//! - [`VectorIndex`] stores and persists the vectors and ranks them by cosine similarity
//! - [`AnswerSynthesizer`] asks a chat model to answer from the retrieved chunks
//! - [`QueryService`] ties them together and never fails a question
//!
//! ## Features
//!
//! - `openai` (default): [`openai::OpenAIEmbeddingProvider`] and
//!   [`openai::OpenAIChatSynthesizer`]

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod index;
pub mod loader;
pub mod service;
pub mod synthesizer;

#[cfg(feature = "openai")]
pub mod openai;

pub use chunking::{Chunker, FixedSizeChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, IndexEntry, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use index::VectorIndex;
pub use loader::load_documents;
pub use service::{
    Answer, AnswerOutcome, IngestOutcome, QueryService, QueryServiceBuilder, ServiceState,
};
pub use synthesizer::{AnswerSynthesizer, build_prompt};
