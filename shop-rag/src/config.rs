//! Configuration for ingestion and querying.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Answer returned while no index has been built or loaded.
pub const DEFAULT_NOT_READY_ANSWER: &str =
    "죄송합니다. 현재 AI 지식 베이스가 초기화되지 않았습니다.";

/// Answer returned when retrieval or generation fails.
pub const DEFAULT_GENERATION_FAILED_ANSWER: &str =
    "죄송합니다. 답변을 생성하는 중에 오류가 발생했습니다. (API Key 확인 필요)";

/// Configuration parameters for the query service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Directory scanned for documents.
    pub data_dir: PathBuf,
    /// Directory holding the persisted vector index.
    pub persist_dir: PathBuf,
    /// File extensions (without the dot) treated as plain text.
    pub extensions: Vec<String>,
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Answer returned while the service has no index.
    pub not_ready_answer: String,
    /// Answer returned when retrieval or generation fails.
    pub generation_failed_answer: String,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            persist_dir: PathBuf::from("./db"),
            extensions: vec!["txt".to_string()],
            chunk_size: 1000,
            chunk_overlap: 0,
            top_k: 4,
            not_ready_answer: DEFAULT_NOT_READY_ANSWER.to_string(),
            generation_failed_answer: DEFAULT_GENERATION_FAILED_ANSWER.to_string(),
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the corpus directory.
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = dir.into();
        self
    }

    /// Set the directory the index is persisted to.
    pub fn persist_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.persist_dir = dir.into();
        self
    }

    /// Replace the accepted file extensions.
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of chunks retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Override the answer returned while no index is installed.
    pub fn not_ready_answer(mut self, answer: impl Into<String>) -> Self {
        self.config.not_ready_answer = answer.into();
        self
    }

    /// Override the answer returned when retrieval or generation fails.
    pub fn generation_failed_answer(mut self, answer: impl Into<String>) -> Self {
        self.config.generation_failed_answer = answer.into();
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - no file extension is configured
    pub fn build(self) -> Result<RagConfig> {
        let config = self.config;
        if config.chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        if config.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if config.extensions.iter().all(|ext| ext.trim().is_empty()) {
            return Err(RagError::ConfigError(
                "at least one file extension is required".to_string(),
            ));
        }
        Ok(config)
    }
}
