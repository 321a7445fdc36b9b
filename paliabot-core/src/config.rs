//! Configuration management
//!
//! All tunables live in one [`BotConfig`] loaded from a TOML file with
//! sensible defaults, plus environment fallback for API keys. Components
//! receive their section by value at construction time; nothing reads
//! configuration from global state.

use crate::error::{BotError, BotResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for the bot
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BotConfig {
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub storage: StorageConfig,
    pub scraper: ScraperConfig,
    pub engine: EngineConfig,
    pub cache: CacheConfig,
}

/// Chat model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider type (currently "openai")
    pub provider: String,
    /// Model name
    pub model: String,
    /// API key (optional, can be set via environment)
    pub api_key: Option<String>,
    /// Base URL for custom providers
    pub base_url: Option<String>,
    /// Sampling temperature; kept low for consistent answers
    pub temperature: f32,
    /// Maximum tokens to generate per answer
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            base_url: None,
            temperature: 0.3,
            max_tokens: 200,
        }
    }
}

/// Embedding model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding provider (currently "openai")
    pub provider: String,
    /// Embedding model name
    pub model: String,
    /// API key for the embedding service
    pub api_key: Option<String>,
    /// Dimension of the embedding vectors
    pub dimension: usize,
    /// Batch size for embedding calls during indexing
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key: None,
            dimension: 1536,
            batch_size: 100,
        }
    }
}

/// Where the vector collection lives on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base directory for persisted collections
    pub base_dir: PathBuf,
    /// Collection name within the base directory
    pub collection: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("paliabot")
            .join("vector_db");

        Self {
            base_dir,
            collection: "palia_wiki".to_string(),
        }
    }
}

/// Scrape-run configuration; immutable for the duration of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Sitemap index to discover page URLs from
    pub sitemap_index_url: String,
    /// Milliseconds to wait between page requests
    pub delay_ms: u64,
    /// Page cap for test runs; None means unlimited
    pub max_pages: Option<usize>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            sitemap_index_url: "https://palia.wiki.gg/sitemaps/sitemap-index-palia_en.xml"
                .to_string(),
            delay_ms: 1000,
            max_pages: None,
            timeout_secs: 30,
        }
    }
}

/// Answer engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of chunks to retrieve per question
    pub retrieval_k: usize,
    /// Number of chunks consulted when listing sources
    pub sources_k: usize,
    /// Hard ceiling on the composed response, in characters
    pub max_response_length: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retrieval_k: 5,
            sources_k: 3,
            // Nightbot truncates at 400 characters
            max_response_length: 400,
        }
    }
}

/// Response cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds an answer stays valid
    pub ttl_secs: u64,
    /// Maximum cached answers before eviction kicks in
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            max_entries: 1000,
        }
    }
}

impl BotConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> BotResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: BotConfig = toml::from_str(&content)
            .map_err(|e| BotError::config(format!("invalid config file: {}", e), "config"))?;
        Ok(config)
    }

    /// Load from a file when one is given, otherwise defaults.
    pub fn load(path: Option<&Path>) -> BotResult<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    /// Fill unset API keys from the environment.
    pub fn apply_env(mut self) -> Self {
        if self.llm.api_key.is_none() {
            self.llm.api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        if self.embedding.api_key.is_none() {
            self.embedding.api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = BotConfig::default();
        assert_eq!(config.engine.max_response_length, 400);
        assert_eq!(config.embedding.batch_size, 100);
        assert_eq!(config.storage.collection, "palia_wiki");
        assert!(config.scraper.sitemap_index_url.ends_with(".xml"));
    }

    #[test]
    fn partial_toml_overrides_defaults() {
        let toml = r#"
            [engine]
            retrieval_k = 8

            [scraper]
            delay_ms = 250
        "#;
        let config: BotConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.engine.retrieval_k, 8);
        assert_eq!(config.scraper.delay_ms, 250);
        // untouched sections keep their defaults
        assert_eq!(config.engine.max_response_length, 400);
        assert_eq!(config.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.toml");
        std::fs::write(
            &path,
            r#"
                [llm]
                model = "gpt-4o"
                temperature = 0.1

                [cache]
                ttl_secs = 60
            "#,
        )
        .unwrap();

        let loaded = BotConfig::from_file(&path).unwrap();
        assert_eq!(loaded.llm.model, "gpt-4o");
        assert_eq!(loaded.cache.ttl_secs, 60);
        assert_eq!(loaded.engine.retrieval_k, 5);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.toml");
        std::fs::write(&path, "not [valid toml").unwrap();
        assert!(BotConfig::from_file(&path).is_err());
    }
}
