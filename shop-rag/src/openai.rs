//! OpenAI embedding and chat-completion providers.
//!
//! Both call the REST API directly with `reqwest`. This module is only
//! available when the `openai` feature is enabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::document::Chunk;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::synthesizer::{AnswerSynthesizer, build_prompt};

/// The default OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// The default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// The default chat model.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

/// The dimensionality of `text-embedding-3-small`.
const DEFAULT_DIMENSIONS: usize = 1536;

/// Maximum number of inputs sent in one embeddings request.
const DEFAULT_MAX_BATCH_SIZE: usize = 256;

const PROVIDER: &str = "OpenAI";

/// Connection settings shared by the OpenAI providers.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key; an empty key makes every call fail with a provider error.
    pub api_key: String,
    /// Base URL, e.g. `https://api.openai.com/v1` or a compatible gateway.
    pub base_url: String,
    /// Upper bound on each HTTP call. Expiry is reported as a provider error.
    pub timeout: Duration,
}

impl OpenAIConfig {
    /// Settings for the public OpenAI endpoint with a 30 second timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: OPENAI_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Read the key from `OPENAI_API_KEY`, leaving it empty when unset.
    pub fn from_env() -> Self {
        Self::new(std::env::var("OPENAI_API_KEY").unwrap_or_default())
    }

    /// Point the providers at a different OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the upper bound on each HTTP call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }

    fn http_client(&self) -> std::result::Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder().timeout(self.timeout).build()
    }
}

// ── OpenAI API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Send a JSON POST and decode the JSON body, mapping every failure through `fail`.
async fn post_json<Req, Resp>(
    client: &reqwest::Client,
    config: &OpenAIConfig,
    path: &str,
    body: &Req,
    fail: fn(String) -> RagError,
) -> Result<Resp>
where
    Req: Serialize + ?Sized,
    Resp: for<'de> Deserialize<'de>,
{
    if config.api_key.is_empty() {
        return Err(fail("OPENAI_API_KEY is not configured".to_string()));
    }

    let response = client
        .post(config.endpoint(path))
        .bearer_auth(&config.api_key)
        .json(body)
        .send()
        .await
        .map_err(|e| {
            error!(provider = PROVIDER, path, error = %e, "request failed");
            let kind = if e.is_timeout() { "request timed out" } else { "request failed" };
            fail(format!("{kind}: {e}"))
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail =
            serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body);

        error!(provider = PROVIDER, path, %status, "API error");
        return Err(fail(format!("API returned {status}: {detail}")));
    }

    response.json::<Resp>().await.map_err(|e| {
        error!(provider = PROVIDER, path, error = %e, "failed to parse response");
        fail(format!("failed to parse response: {e}"))
    })
}

fn embedding_error(message: String) -> RagError {
    RagError::EmbeddingError { provider: PROVIDER.into(), message }
}

fn completion_error(message: String) -> RagError {
    RagError::CompletionError { provider: PROVIDER.into(), message }
}

/// An [`EmbeddingProvider`] backed by the OpenAI embeddings API.
///
/// # Example
///
/// ```rust,ignore
/// use shop_rag::openai::{OpenAIConfig, OpenAIEmbeddingProvider};
///
/// let provider = OpenAIEmbeddingProvider::new(OpenAIConfig::from_env())?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    config: OpenAIConfig,
    model: String,
    dimensions: usize,
    /// If set, passed to the API for Matryoshka dimension truncation.
    request_dimensions: Option<usize>,
    max_batch_size: usize,
}

impl OpenAIEmbeddingProvider {
    /// Create a provider using `text-embedding-3-small` (1536 dimensions).
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if the HTTP client cannot be built.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = config
            .http_client()
            .map_err(|e| embedding_error(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            config,
            model: DEFAULT_EMBEDDING_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
            request_dimensions: None,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        })
    }

    /// Set the model name (e.g. `text-embedding-3-large`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Request truncated embeddings of `dims` length.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.request_dimensions = Some(dims);
        self
    }

    /// Cap the number of inputs per request. Larger batches are split.
    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size.max(1);
        self
    }

    async fn embed_request(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let request_body = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.request_dimensions,
        };
        let response: EmbeddingResponse =
            post_json(&self.client, &self.config, "embeddings", &request_body, embedding_error)
                .await?;

        if response.data.len() != texts.len() {
            return Err(embedding_error(format!(
                "API returned {} embeddings for {} inputs",
                response.data.len(),
                texts.len()
            )));
        }

        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| embedding_error("API returned empty response".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = PROVIDER,
            batch_size = texts.len(),
            model = %self.model,
            "embedding batch"
        );

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.max_batch_size) {
            vectors.extend(self.embed_request(batch).await?);
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// An [`AnswerSynthesizer`] backed by the OpenAI chat-completions API.
///
/// The prompt comes from [`build_prompt`] and sampling temperature is pinned
/// to zero.
pub struct OpenAIChatSynthesizer {
    client: reqwest::Client,
    config: OpenAIConfig,
    model: String,
}

impl OpenAIChatSynthesizer {
    /// Create a synthesizer using `gpt-3.5-turbo`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::CompletionError`] if the HTTP client cannot be built.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = config
            .http_client()
            .map_err(|e| completion_error(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config, model: DEFAULT_CHAT_MODEL.into() })
    }

    /// Set the chat model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl AnswerSynthesizer for OpenAIChatSynthesizer {
    async fn answer(&self, question: &str, context: &[Chunk]) -> Result<String> {
        let prompt = build_prompt(question, context);
        debug!(
            provider = PROVIDER,
            model = %self.model,
            context_chunks = context.len(),
            prompt_len = prompt.len(),
            "requesting completion"
        );

        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: &prompt }],
            temperature: 0.0,
        };
        let response: ChatResponse = post_json(
            &self.client,
            &self.config,
            "chat/completions",
            &request_body,
            completion_error,
        )
        .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| completion_error("API returned no message content".into()))
    }
}
