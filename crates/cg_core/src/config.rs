use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Dummy,
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "openai" | "deepseek" => Ok(Provider::OpenAi),
            "dummy" => Ok(Provider::Dummy),
            other => Err(Error::Config(format!(
                "Unknown model provider: {}. Available providers: openai, dummy",
                other
            ))),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAi => write!(f, "openai"),
            Provider::Dummy => write!(f, "dummy"),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub provider: Provider,
    pub base_url: String,
    pub api_key: Option<String>,
    pub chat_model: String,
    pub embedding_model: String,
    pub max_input_tokens: usize,
    pub request_timeout_secs: u64,
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .field("max_input_tokens", &self.max_input_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAi,
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            chat_model: "gpt-3.5-turbo-16k".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            max_input_tokens: 16_000,
            request_timeout_secs: 120,
        }
    }
}

impl ModelConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSettings {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl ChunkSettings {
    fn validate(&self, what: &str) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config(format!("{} chunk size must be positive", what)));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::Config(format!(
                "{} chunk overlap ({}) must be smaller than the chunk size ({})",
                what, self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Chunking used to pick the text a summary is written from.
    pub summary: ChunkSettings,
    /// Chunking used to build the retrieval index.
    pub retrieval: ChunkSettings,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            summary: ChunkSettings { chunk_size: 7000, overlap: 0 },
            retrieval: ChunkSettings { chunk_size: 400, overlap: 100 },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Token budget for the generated-text history fed back to the writer.
    pub max_tokens: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { max_tokens: 1200 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackoffConfig {
    None,
    Fixed { delay_ms: u64 },
    Exponential { base_ms: u64, max_ms: u64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub initial_k: usize,
    pub backoff: BackoffConfig,
    pub embedding_concurrency: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            initial_k: 5,
            backoff: BackoffConfig::None,
            embedding_concurrency: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub max_concurrency: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self { max_concurrency: 10 }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    pub result_count: usize,
    pub serp_location: String,
    pub serp_api_key: Option<String>,
    pub serp_endpoint: String,
}

impl fmt::Debug for CollectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionConfig")
            .field("result_count", &self.result_count)
            .field("serp_location", &self.serp_location)
            .field("serp_api_key", &self.serp_api_key.as_deref().map(|_| "<redacted>"))
            .field("serp_endpoint", &self.serp_endpoint)
            .finish()
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            result_count: 3,
            serp_location: "Austin,Texas".to_string(),
            serp_api_key: None,
            serp_endpoint: "https://serpapi.com/search.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub chunking: ChunkingConfig,
    pub memory: MemoryConfig,
    pub retrieval: RetrievalConfig,
    pub summarizer: SummarizerConfig,
    pub collection: CollectionConfig,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::Config(format!("Invalid configuration: {}", e)))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Checks the whole configuration once, before any pipeline stage runs.
    pub fn validate(&self) -> Result<()> {
        self.chunking.summary.validate("Summary")?;
        self.chunking.retrieval.validate("Retrieval")?;

        if self.memory.max_tokens == 0 {
            return Err(Error::Config("Memory token budget must be positive".to_string()));
        }
        if self.summarizer.max_concurrency == 0 || self.retrieval.embedding_concurrency == 0 {
            return Err(Error::Config("Concurrency limits must be positive".to_string()));
        }
        if self.model.max_input_tokens == 0 {
            return Err(Error::Config("Model input limit must be positive".to_string()));
        }

        if self.model.provider == Provider::OpenAi {
            Url::parse(&self.model.base_url).map_err(|e| {
                Error::Config(format!("Invalid model base URL {}: {}", self.model.base_url, e))
            })?;
            if self.model.api_key.as_deref().map_or(true, str::is_empty) {
                return Err(Error::Config(format!(
                    "An API key is required for the {} provider",
                    self.model.provider
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline() -> Config {
        let mut config = Config::default();
        config.model.provider = Provider::Dummy;
        config
    }

    #[test]
    fn test_defaults_are_valid_offline() {
        assert!(offline().validate().is_ok());
    }

    #[test]
    fn test_remote_provider_requires_api_key() {
        let mut config = Config::default();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.model.api_key = Some("sk-test".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let mut config = offline();
        config.chunking.retrieval = ChunkSettings { chunk_size: 100, overlap: 100 };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("overlap"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [model]
            provider = "dummy"

            [memory]
            max_tokens = 300

            [retrieval.backoff]
            kind = "fixed"
            delay_ms = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.model.provider, Provider::Dummy);
        assert_eq!(config.memory.max_tokens, 300);
        assert_eq!(config.retrieval.initial_k, 5);
        assert_eq!(config.retrieval.backoff, BackoffConfig::Fixed { delay_ms: 50 });
        assert_eq!(config.chunking.retrieval.chunk_size, 400);
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("DeepSeek".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert!("ollama".parse::<Provider>().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = offline();
        config.model.api_key = Some("sk-secret".to_string());
        assert!(!format!("{:?}", config).contains("sk-secret"));
    }
}
