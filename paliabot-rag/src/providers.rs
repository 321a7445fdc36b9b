//! Embedding and generation providers
//!
//! Thin trait seams over the siumai framework so the index and engine can be
//! exercised with deterministic doubles in tests. Model, temperature, and
//! token budget are fixed at client construction; a provider failure is
//! fatal for the single operation in progress and is never retried here.

use async_trait::async_trait;
use paliabot_core::{BotError, BotResult, EmbeddingConfig, LlmConfig};
use siumai::prelude::*;
use tracing::{debug, info};

/// Converts text into fixed-dimension vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed_one(&self, text: &str) -> BotResult<Vec<f32>>;
    async fn embed_many(&self, texts: &[String]) -> BotResult<Vec<Vec<f32>>>;
}

/// Produces a completion from a system instruction and a user turn.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> BotResult<String>;
}

/// Embedding client backed by siumai.
pub struct SiumaiEmbeddings {
    client: Box<dyn LlmClient>,
    config: EmbeddingConfig,
}

impl SiumaiEmbeddings {
    pub async fn new(config: EmbeddingConfig) -> BotResult<Self> {
        let client = match config.provider.as_str() {
            "openai" => {
                let api_key = config
                    .api_key
                    .clone()
                    .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                    .ok_or_else(|| {
                        BotError::config("OpenAI API key not found", "embeddings")
                    })?;

                let client = LlmBuilder::new()
                    .openai()
                    .api_key(&api_key)
                    .model(&config.model)
                    .build()
                    .await
                    .map_err(|e| {
                        BotError::embedding(
                            format!("failed to create OpenAI client: {}", e),
                            Some(config.provider.clone()),
                        )
                    })?;

                Box::new(client) as Box<dyn LlmClient>
            }
            provider => {
                return Err(BotError::config(
                    format!("unsupported embedding provider: {}", provider),
                    "embeddings",
                ))
            }
        };

        info!(
            "Initialized embedding client: {}/{} ({} dims)",
            config.provider, config.model, config.dimension
        );

        Ok(Self { client, config })
    }

    pub fn dimension(&self) -> usize {
        self.config.dimension
    }
}

#[async_trait]
impl EmbeddingProvider for SiumaiEmbeddings {
    async fn embed_one(&self, text: &str) -> BotResult<Vec<f32>> {
        let mut embeddings = self.embed_many(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| BotError::embedding("no embedding data returned", None))
    }

    async fn embed_many(&self, texts: &[String]) -> BotResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embedding_client = self.client.as_embedding_capability().ok_or_else(|| {
            BotError::config(
                format!(
                    "provider {} does not support embeddings",
                    self.config.provider
                ),
                "embeddings",
            )
        })?;

        debug!("Embedding {} texts", texts.len());
        let response = embedding_client.embed(texts.to_vec()).await.map_err(|e| {
            BotError::embedding(
                format!("embedding API call failed: {}", e),
                Some(self.config.provider.clone()),
            )
        })?;

        if response.embeddings.len() != texts.len() {
            return Err(BotError::embedding(
                format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    response.embeddings.len()
                ),
                Some(self.config.provider.clone()),
            ));
        }

        Ok(response.embeddings)
    }
}

/// Chat completion client backed by siumai.
pub struct SiumaiGenerator {
    client: Box<dyn LlmClient>,
    config: LlmConfig,
}

impl SiumaiGenerator {
    pub async fn new(config: LlmConfig) -> BotResult<Self> {
        let client = match config.provider.as_str() {
            "openai" => {
                let api_key = config
                    .api_key
                    .clone()
                    .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                    .ok_or_else(|| BotError::config("OpenAI API key not found", "llm"))?;

                let mut builder = LlmBuilder::new()
                    .openai()
                    .api_key(&api_key)
                    .model(&config.model)
                    .temperature(config.temperature)
                    .max_tokens(config.max_tokens);

                if let Some(base_url) = &config.base_url {
                    builder = builder.base_url(base_url);
                }

                let client = builder.build().await.map_err(|e| {
                    BotError::llm(
                        format!("failed to build OpenAI client: {}", e),
                        Some(config.provider.clone()),
                    )
                })?;

                Box::new(client) as Box<dyn LlmClient>
            }
            provider => {
                return Err(BotError::config(
                    format!("unsupported LLM provider: {}", provider),
                    "llm",
                ))
            }
        };

        info!(
            "Created LLM client: {}/{} (temp {:.1}, max {} tokens)",
            config.provider, config.model, config.temperature, config.max_tokens
        );

        Ok(Self { client, config })
    }
}

#[async_trait]
impl GenerationProvider for SiumaiGenerator {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> BotResult<String> {
        let messages = vec![system!(system_prompt), user!(user_prompt)];

        let response = self.client.chat(messages).await.map_err(|e| {
            BotError::llm(
                format!("LLM generation failed: {}", e),
                Some(self.config.provider.clone()),
            )
        })?;

        match response.content_text() {
            Some(content) => {
                debug!("Generated response ({} chars)", content.len());
                Ok(content.to_string())
            }
            None => Err(BotError::llm(
                "no text content in LLM response",
                Some(self.config.provider.clone()),
            )),
        }
    }
}
