//! Error types for the `shop-rag` crate.

use thiserror::Error;

/// Errors that can occur while ingesting documents or answering questions.
#[derive(Debug, Error)]
pub enum RagError {
    /// The embedding provider failed (auth, rate limit, network, timeout or a malformed response).
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The chat-completion provider failed.
    #[error("Completion error ({provider}): {message}")]
    CompletionError {
        /// The completion provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The vector index could not be built, persisted, loaded or searched.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The index backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A query arrived before any index was built or loaded.
    #[error("Index unavailable: no documents have been ingested")]
    IndexUnavailable,

    /// The document corpus could not be scanned.
    #[error("Loader error ({path}): {message}")]
    LoaderError {
        /// The path that could not be processed.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl RagError {
    /// Returns `true` for failures raised by a remote model provider.
    pub fn is_provider_error(&self) -> bool {
        matches!(self, Self::EmbeddingError { .. } | Self::CompletionError { .. })
    }

    pub(crate) fn index(message: impl Into<String>) -> Self {
        Self::VectorStoreError { backend: "FileIndex".to_string(), message: message.into() }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
