//! Answer synthesis from retrieved context.

use async_trait::async_trait;

use crate::document::Chunk;
use crate::error::Result;

/// Produces a natural-language answer to `question` grounded in `context`.
///
/// Failures must surface as [`RagError::CompletionError`](crate::RagError::CompletionError).
#[async_trait]
pub trait AnswerSynthesizer: Send + Sync {
    async fn answer(&self, question: &str, context: &[Chunk]) -> Result<String>;
}

/// Render the fixed prompt template sent to the chat model.
///
/// Chunks appear in retrieval order, separated by blank lines.
pub fn build_prompt(question: &str, context: &[Chunk]) -> String {
    let context = context.iter().map(|chunk| chunk.text.trim()).collect::<Vec<_>>().join("\n\n");
    format!(
        "Using only the following context, answer the question.\n\n\
         Context:\n{context}\n\n\
         Question: {question}"
    )
}
