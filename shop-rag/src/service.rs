//! Query service: owns the index and answers questions.
//!
//! The [`QueryService`] coordinates ingestion (load → chunk → embed → build)
//! and per-question answering (embed → search → synthesize). It starts
//! `Uninitialized` and becomes `Ready` once an index has been built or
//! loaded.
//!
//! # Example
//!
//! ```rust,ignore
//! use shop_rag::{QueryService, RagConfig};
//!
//! let service = QueryService::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .synthesizer(Arc::new(synthesizer))
//!     .build()?;
//!
//! service.initialize().await?;
//! let answer = service.ask("How long does shipping take?").await;
//! ```

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

use crate::chunking::{Chunker, FixedSizeChunker};
use crate::config::RagConfig;
use crate::document::{IndexEntry, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::VectorIndex;
use crate::loader::load_documents;
use crate::synthesizer::AnswerSynthesizer;

/// Whether the service has an index to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Uninitialized,
    Ready,
}

/// Result of one ingestion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A new index was built from the corpus and persisted.
    Ready { documents: usize, chunks: usize },
    /// The corpus produced no chunks, but a persisted index was loaded.
    Restored { chunks: usize },
    /// The corpus produced no chunks and the service has no index.
    NoDocuments,
}

/// How an [`Answer`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Generated,
    NotReady,
    GenerationFailed,
}

/// The text returned to a caller, always user-presentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub outcome: AnswerOutcome,
}

/// Answers questions against a lazily (re)built vector index.
///
/// Concurrent [`ask`](QueryService::ask) calls share the index through an
/// `Arc`; the read lock is held only long enough to clone it. Rebuilds are
/// serialized and swap the finished index in as a whole.
pub struct QueryService {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    synthesizer: Arc<dyn AnswerSynthesizer>,
    chunker: Arc<dyn Chunker>,
    index: RwLock<Option<Arc<VectorIndex>>>,
    rebuild: Mutex<()>,
}

impl QueryService {
    /// Create a new [`QueryServiceBuilder`].
    pub fn builder() -> QueryServiceBuilder {
        QueryServiceBuilder::default()
    }

    /// Return a reference to the service configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Report whether an index is currently installed.
    pub async fn state(&self) -> ServiceState {
        if self.index.read().await.is_some() {
            ServiceState::Ready
        } else {
            ServiceState::Uninitialized
        }
    }

    /// Number of chunks in the current index, if any.
    pub async fn chunk_count(&self) -> Option<usize> {
        self.index.read().await.as_ref().map(|index| index.len())
    }

    /// Run a full ingestion and swap the result in.
    ///
    /// When the corpus yields no chunks, an uninitialized service loads the
    /// persisted index if there is one. A service that is already ready
    /// drops its index and deletes the persisted file instead.
    ///
    /// # Errors
    ///
    /// Returns the first loader, embedding or index error. The previously
    /// installed index, if any, stays in place.
    pub async fn initialize(&self) -> Result<IngestOutcome> {
        let _guard = self.rebuild.lock().await;
        self.rebuild_locked().await
    }

    /// Answer a question, never failing.
    ///
    /// When no index is installed one ingestion attempt is made first. If the
    /// service is still not ready the configured *not ready* answer is
    /// returned; any retrieval or generation failure yields the configured
    /// *generation failed* answer.
    pub async fn ask(&self, question: &str) -> Answer {
        if self.current_index().await.is_none() {
            self.initialize_if_uninitialized().await;
        }

        match self.answer_question(question).await {
            Ok(text) => Answer { text, outcome: AnswerOutcome::Generated },
            Err(RagError::IndexUnavailable) => {
                info!("question received before knowledge base is ready");
                Answer {
                    text: self.config.not_ready_answer.clone(),
                    outcome: AnswerOutcome::NotReady,
                }
            }
            Err(e) => {
                error!(
                    error = %e,
                    provider_error = e.is_provider_error(),
                    "failed to answer question"
                );
                Answer {
                    text: self.config.generation_failed_answer.clone(),
                    outcome: AnswerOutcome::GenerationFailed,
                }
            }
        }
    }

    /// Retrieve the top-K chunks and synthesize an answer.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexUnavailable`] when no index is installed, or
    /// the embedding, search or synthesizer error.
    pub async fn answer_question(&self, question: &str) -> Result<String> {
        let results = self.retrieve(question).await?;
        let context: Vec<_> = results.into_iter().map(|r| r.chunk).collect();
        self.synthesizer.answer(question, &context).await
    }

    /// Embed `question` and return the most similar chunks.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexUnavailable`] when no index is installed.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchResult>> {
        let index = self.current_index().await.ok_or(RagError::IndexUnavailable)?;
        let query_embedding = self.embedding_provider.embed(question).await?;
        let results = index.search(&query_embedding, self.config.top_k)?;
        info!(result_count = results.len(), "retrieved context");
        Ok(results)
    }

    async fn current_index(&self) -> Option<Arc<VectorIndex>> {
        self.index.read().await.clone()
    }

    async fn initialize_if_uninitialized(&self) {
        let _guard = self.rebuild.lock().await;
        // Another request may have finished a rebuild while we waited.
        if self.index.read().await.is_some() {
            return;
        }
        match self.rebuild_locked().await {
            Ok(outcome) => info!(?outcome, "lazy initialization finished"),
            Err(e) => warn!(error = %e, "lazy initialization failed"),
        }
    }

    /// Must be called with `self.rebuild` held.
    async fn rebuild_locked(&self) -> Result<IngestOutcome> {
        let data_dir = self.config.data_dir.clone();
        let extensions = self.config.extensions.clone();
        let documents = tokio::task::spawn_blocking(move || load_documents(&data_dir, &extensions))
            .await
            .map_err(|e| RagError::LoaderError {
                path: self.config.data_dir.display().to_string(),
                message: format!("loader task failed: {e}"),
            })??;

        let chunks = self.chunker.chunk_all(&documents);
        if chunks.is_empty() {
            info!(path = %self.config.data_dir.display(), "no documents found in data directory");
            if self.index.read().await.is_some() {
                return self.clear_index().await;
            }
            return self.restore_persisted().await;
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedding_provider.embed_batch(&texts).await.inspect_err(|e| {
            error!(chunk_count = chunks.len(), error = %e, "embedding failed during ingestion");
        })?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::EmbeddingError {
                provider: "unknown".to_string(),
                message: format!(
                    "provider returned {} embeddings for {} chunks",
                    embeddings.len(),
                    chunks.len()
                ),
            });
        }

        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();
        let persist_dir = self.config.persist_dir.clone();
        let index = tokio::task::spawn_blocking(move || VectorIndex::build(entries, &persist_dir))
            .await
            .map_err(|e| RagError::index(format!("index build task failed: {e}")))??;

        let outcome = IngestOutcome::Ready { documents: documents.len(), chunks: index.len() };
        *self.index.write().await = Some(Arc::new(index));
        info!(?outcome, "knowledge base ready");
        Ok(outcome)
    }

    /// Drop the installed index and its persisted file after the corpus was
    /// emptied.
    async fn clear_index(&self) -> Result<IngestOutcome> {
        let persist_dir = self.config.persist_dir.clone();
        tokio::task::spawn_blocking(move || VectorIndex::remove_persisted(&persist_dir))
            .await
            .map_err(|e| RagError::index(format!("index removal task failed: {e}")))??;
        *self.index.write().await = None;
        warn!("corpus is empty, knowledge base cleared");
        Ok(IngestOutcome::NoDocuments)
    }

    /// Only reached while uninitialized, so a persisted index never shadows
    /// an explicit rebuild.
    async fn restore_persisted(&self) -> Result<IngestOutcome> {
        let persist_dir = self.config.persist_dir.clone();
        let loaded = tokio::task::spawn_blocking(move || VectorIndex::load(&persist_dir))
            .await
            .map_err(|e| RagError::index(format!("index load task failed: {e}")))??;

        match loaded {
            Some(index) if !index.is_empty() => {
                let outcome = IngestOutcome::Restored { chunks: index.len() };
                *self.index.write().await = Some(Arc::new(index));
                info!(?outcome, "knowledge base restored from disk");
                Ok(outcome)
            }
            _ => Ok(IngestOutcome::NoDocuments),
        }
    }
}

/// Builder for constructing a [`QueryService`].
///
/// `config`, `embedding_provider` and `synthesizer` are required. When no
/// chunker is set a [`FixedSizeChunker`] is built from the configuration.
#[derive(Default)]
pub struct QueryServiceBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    synthesizer: Option<Arc<dyn AnswerSynthesizer>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl QueryServiceBuilder {
    /// Set the service configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the answer synthesizer.
    pub fn synthesizer(mut self, synthesizer: Arc<dyn AnswerSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Override the chunker derived from the configuration.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`QueryService`] in the `Uninitialized` state.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing.
    pub fn build(self) -> Result<QueryService> {
        let config =
            self.config.ok_or_else(|| RagError::ConfigError("config is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let synthesizer = self
            .synthesizer
            .ok_or_else(|| RagError::ConfigError("synthesizer is required".to_string()))?;
        let chunker = self.chunker.unwrap_or_else(|| {
            Arc::new(FixedSizeChunker::new(config.chunk_size, config.chunk_overlap))
        });

        Ok(QueryService {
            config,
            embedding_provider,
            synthesizer,
            chunker,
            index: RwLock::new(None),
            rebuild: Mutex::new(()),
        })
    }
}
