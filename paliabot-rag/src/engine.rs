//! Answer engine
//!
//! Orchestrates one question end to end: fingerprint, cache lookup,
//! retrieval, context assembly, generation, citation selection, fitting the
//! response to a hard character budget, and caching the final string.
//! Queries are independent; the only shared state is the cache and the
//! read-only index handle.

use crate::cache::ResponseCache;
use crate::providers::GenerationProvider;
use crate::store::{ScoredChunk, VectorIndex};
use paliabot_core::{BotResult, CacheConfig, EngineConfig};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// The designed content-gap reply. Not an error, never logged as one, and
/// never cached: the index may grow to cover the question later.
pub const NOT_FOUND_MESSAGE: &str = "I couldn't find that info in the wiki yet.";

const CITATION_SEPARATOR: &str = " | ";
const ELLIPSIS: &str = "...";

const SYSTEM_PROMPT: &str = "You are a helpful assistant for the game Palia. Answer questions based ONLY on the provided context from the Palia wiki.

Rules:
1. Be concise - responses must be under 280 characters (a wiki link will be added after)
2. If the answer isn't in the context, say \"I couldn't find that info.\"
3. Never make up information not in the context
4. Include specific details like locations, item names, or NPC names when relevant
5. For gift preferences, be specific about what the villager loves/likes/dislikes
6. Don't include citations or source references in your answer
7. Write in a friendly, helpful tone suitable for Twitch chat";

/// A deduplicated source reference for the diagnostic endpoint
#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub title: String,
    pub url: String,
    pub section: String,
}

/// Retrieval-augmented answer engine over the wiki index.
pub struct AnswerEngine {
    index: Arc<VectorIndex>,
    generator: Arc<dyn GenerationProvider>,
    cache: ResponseCache,
    config: EngineConfig,
}

impl AnswerEngine {
    pub fn new(
        index: Arc<VectorIndex>,
        generator: Arc<dyn GenerationProvider>,
        engine_config: EngineConfig,
        cache_config: CacheConfig,
    ) -> Self {
        Self {
            index,
            generator,
            cache: ResponseCache::new(
                cache_config.max_entries,
                Duration::from_secs(cache_config.ttl_secs),
            ),
            config: engine_config,
        }
    }

    /// Answer a question. The returned string fits the configured character
    /// budget and, when possible, ends with the wiki URL of the most
    /// relevant source.
    pub async fn query(&self, question: &str) -> BotResult<String> {
        let cache_key = fingerprint(question);
        if let Some(cached) = self.cache.get(&cache_key) {
            debug!("Cache hit for question: {:.50}", question);
            return Ok(cached);
        }

        let results = self
            .index
            .search(question, self.config.retrieval_k)
            .await?;
        if results.is_empty() {
            debug!("No relevant chunks for question: {:.50}", question);
            return Ok(NOT_FOUND_MESSAGE.to_string());
        }

        let context = build_context(&results);
        let user_prompt = format!(
            "Context from Palia Wiki:\n{}\n\nQuestion: {}\n\nProvide a brief, helpful answer (under 280 characters):",
            context, question
        );

        let answer = self.generator.complete(SYSTEM_PROMPT, &user_prompt).await?;
        let answer = answer.trim();

        let source_url = best_source_url(&results);
        let response = self.fit_to_budget(answer, source_url);

        info!(
            "Answered question ({} chars, cited: {})",
            response.chars().count(),
            source_url.is_some()
        );

        self.cache.insert(cache_key, response.clone());
        Ok(response)
    }

    /// Retrieve the sources a question would draw on, deduplicated by URL
    /// with first-occurrence rank order preserved. Bypasses the cache and
    /// the generation pipeline entirely.
    pub async fn get_sources(&self, question: &str, k: usize) -> BotResult<Vec<SourceInfo>> {
        let results = self.index.search(question, k).await?;

        let mut seen = HashSet::new();
        let mut sources = Vec::new();
        for result in &results {
            let url = &result.metadata.url;
            if url.is_empty() || !seen.insert(url.clone()) {
                continue;
            }
            sources.push(SourceInfo {
                title: result.metadata.title.clone(),
                url: url.clone(),
                section: result.metadata.section.clone(),
            });
        }

        Ok(sources)
    }

    /// Default-k variant used by the JSON endpoint.
    pub async fn get_default_sources(&self, question: &str) -> BotResult<Vec<SourceInfo>> {
        self.get_sources(question, self.config.sources_k).await
    }

    /// Number of documents currently indexed; health checks report this.
    pub fn indexed_documents(&self) -> usize {
        self.index.count()
    }

    /// Number of cached answers.
    pub fn cached_responses(&self) -> usize {
        self.cache.len()
    }

    /// Hard response-length ceiling in characters.
    pub fn max_response_length(&self) -> usize {
        self.config.max_response_length
    }

    /// Compose answer and citation so the whole string fits the budget. The
    /// citation URL is kept verbatim; the answer is what gets truncated.
    fn fit_to_budget(&self, answer: &str, source_url: Option<&str>) -> String {
        let max_len = self.config.max_response_length;
        match source_url {
            Some(url) => {
                let reserved = url.chars().count() + CITATION_SEPARATOR.chars().count();
                let budget = max_len.saturating_sub(reserved);
                format!(
                    "{}{}{}",
                    truncate_answer(answer, budget),
                    CITATION_SEPARATOR,
                    url
                )
            }
            None => truncate_answer(answer, max_len),
        }
    }
}

/// Normalize and hash a question into a cache key. Case and surrounding
/// whitespace do not affect the fingerprint.
pub fn fingerprint(question: &str) -> String {
    let normalized = question.trim().to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Concatenate retrieved chunks, most relevant first, each introduced by a
/// bracketed source header so the model can tell passages apart.
fn build_context(chunks: &[ScoredChunk]) -> String {
    let parts: Vec<String> = chunks
        .iter()
        .map(|chunk| {
            let meta = &chunk.metadata;
            let header = if !meta.section.is_empty() && meta.section != "infobox" {
                format!("[{} - {}]", meta.title, meta.section)
            } else {
                format!("[{}]", meta.title)
            };
            format!("{}\n{}", header, chunk.text)
        })
        .collect();

    parts.join("\n\n---\n\n")
}

/// The URL of the most relevant source: first chunk by retrieval rank with
/// a non-empty URL.
fn best_source_url(chunks: &[ScoredChunk]) -> Option<&str> {
    chunks
        .iter()
        .map(|chunk| chunk.metadata.url.as_str())
        .find(|url| !url.is_empty())
}

/// Truncate `text` to at most `budget` characters, appending an ellipsis
/// marker that counts against the budget. Cuts on a word boundary when one
/// exists in the kept window, and always on a char boundary.
fn truncate_answer(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    if budget <= ELLIPSIS.len() {
        return ELLIPSIS.chars().take(budget).collect();
    }

    let keep = budget - ELLIPSIS.len();
    let mut cut: String = text.chars().take(keep).collect();
    if let Some(idx) = cut.rfind(char::is_whitespace) {
        if idx > 0 {
            cut.truncate(idx);
        }
    }
    format!("{}{}", cut.trim_end(), ELLIPSIS)
}
