#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use shop_rag::{AnswerSynthesizer, Chunk, EmbeddingProvider, RagError};

/// Deterministic hash-based embeddings.
pub struct MockEmbeddingProvider {
    dimensions: usize,
    pub calls: AtomicUsize,
}

impl MockEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> shop_rag::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut emb = vec![0.0f32; self.dimensions];
        for (i, v) in emb.iter_mut().enumerate() {
            *v = ((hash.wrapping_add(i as u64)) as f32).sin();
        }
        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            emb.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(emb)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Wraps [`MockEmbeddingProvider`] and yields to the scheduler before every
/// embedding, so a batch is spread across many polls.
pub struct YieldingEmbeddingProvider {
    inner: MockEmbeddingProvider,
}

impl YieldingEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { inner: MockEmbeddingProvider::new(dimensions) }
    }
}

#[async_trait]
impl EmbeddingProvider for YieldingEmbeddingProvider {
    async fn embed(&self, text: &str) -> shop_rag::Result<Vec<f32>> {
        tokio::task::yield_now().await;
        self.inner.embed(text).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

/// Always fails, like a provider called without a valid key.
pub struct FailingEmbeddingProvider;

#[async_trait]
impl EmbeddingProvider for FailingEmbeddingProvider {
    async fn embed(&self, _text: &str) -> shop_rag::Result<Vec<f32>> {
        Err(RagError::EmbeddingError {
            provider: "mock".into(),
            message: "401 Unauthorized".into(),
        })
    }

    fn dimensions(&self) -> usize {
        8
    }
}

/// Echoes the question and the ids of the context chunks it received.
pub struct EchoSynthesizer;

#[async_trait]
impl AnswerSynthesizer for EchoSynthesizer {
    async fn answer(&self, question: &str, context: &[Chunk]) -> shop_rag::Result<String> {
        let ids: Vec<_> = context.iter().map(|c| c.id.as_str()).collect();
        Ok(format!("{question} <- [{}]", ids.join(", ")))
    }
}

pub struct FailingSynthesizer;

#[async_trait]
impl AnswerSynthesizer for FailingSynthesizer {
    async fn answer(&self, _question: &str, _context: &[Chunk]) -> shop_rag::Result<String> {
        Err(RagError::CompletionError {
            provider: "mock".into(),
            message: "429 rate limited".into(),
        })
    }
}
