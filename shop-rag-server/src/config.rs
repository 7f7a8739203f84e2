//! Process configuration read from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow, bail};
use shop_rag::RagConfig;
use shop_rag::openai::{DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL, OPENAI_API_BASE, OpenAIConfig};

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rag: RagConfig,
    /// `None` when `OPENAI_API_KEY` is unset or blank.
    pub api_key: Option<String>,
    pub base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub provider_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            rag: RagConfig::default(),
            api_key: None,
            base_url: OPENAI_API_BASE.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            provider_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for
    /// unset or blank variables.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let mut rag = RagConfig::builder()
            .chunk_size(parse_or(&get, "RAG_CHUNK_SIZE", defaults.rag.chunk_size)?)
            .chunk_overlap(parse_or(&get, "RAG_CHUNK_OVERLAP", defaults.rag.chunk_overlap)?)
            .top_k(parse_or(&get, "RAG_TOP_K", defaults.rag.top_k)?);
        if let Some(dir) = get("RAG_DATA_DIR") {
            rag = rag.data_dir(PathBuf::from(dir));
        }
        if let Some(dir) = get("RAG_PERSIST_DIR") {
            rag = rag.persist_dir(PathBuf::from(dir));
        }
        if let Some(extensions) = get("RAG_EXTENSIONS") {
            rag = rag.extensions(extensions.split(',').map(|e| e.trim().trim_start_matches('.')));
        }
        let rag = rag.build().context("invalid RAG configuration")?;

        let timeout_secs =
            parse_or(&get, "RAG_PROVIDER_TIMEOUT_SECS", defaults.provider_timeout.as_secs())?;
        if timeout_secs == 0 {
            bail!("RAG_PROVIDER_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Self {
            host: get("RAG_HOST").unwrap_or(defaults.host),
            port: parse_or(&get, "RAG_PORT", defaults.port)?,
            rag,
            api_key: get("OPENAI_API_KEY"),
            base_url: get("OPENAI_BASE_URL").unwrap_or(defaults.base_url),
            embedding_model: get("RAG_EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            chat_model: get("RAG_CHAT_MODEL").unwrap_or(defaults.chat_model),
            provider_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Connection settings for the OpenAI providers.
    pub fn openai(&self) -> OpenAIConfig {
        OpenAIConfig::new(self.api_key.clone().unwrap_or_default())
            .with_base_url(&self.base_url)
            .with_timeout(self.provider_timeout)
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|e| anyhow!("{key}={raw:?} is invalid: {e}")),
        None => Ok(default),
    }
}
