//! Deterministic provider doubles for tests.
//!
//! No network, no randomness: embeddings are keyword-presence vectors, and
//! the generator returns a canned answer while counting invocations.

use crate::providers::{EmbeddingProvider, GenerationProvider};
use async_trait::async_trait;
use paliabot_core::{BotError, BotResult};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Embeds text as a keyword-presence vector plus a constant bias term, so
/// related texts land close together under cosine similarity.
pub struct KeywordEmbedder;

impl KeywordEmbedder {
    pub const DIMENSION: usize = 8;

    const KEYWORDS: [&'static str; 7] = [
        "sturgeon", "lake", "fish", "hassian", "gift", "heat root", "habitat",
    ];

    pub fn new() -> Self {
        Self
    }

    fn embed_text(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let mut vector: Vec<f32> = Self::KEYWORDS
            .iter()
            .map(|kw| if lower.contains(kw) { 1.0 } else { 0.0 })
            .collect();
        // Bias dimension keeps the norm non-zero for keyword-free text.
        vector.push(1.0);
        vector
    }
}

impl Default for KeywordEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed_one(&self, text: &str) -> BotResult<Vec<f32>> {
        Ok(Self::embed_text(text))
    }

    async fn embed_many(&self, texts: &[String]) -> BotResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::embed_text(t)).collect())
    }
}

/// Returns a fixed answer and counts how many times it was asked.
pub struct CannedGenerator {
    answer: String,
    calls: AtomicUsize,
}

impl CannedGenerator {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationProvider for CannedGenerator {
    async fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> BotResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.answer.clone())
    }
}

/// Always fails, for exercising the provider-failure path.
pub struct FailingGenerator;

#[async_trait]
impl GenerationProvider for FailingGenerator {
    async fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> BotResult<String> {
        Err(BotError::llm("provider unavailable", Some("test".to_string())))
    }
}
