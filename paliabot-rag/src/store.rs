//! Persistent vector index
//!
//! Chunk embeddings plus text and metadata, held in memory and persisted as
//! JSON under `{base_dir}/{collection}/vectors.json`. Reads take `&self` and
//! are safe to run concurrently; mutation (`add_chunks`, `clear`) takes
//! `&mut self` and must be serialized by the caller (rebuilds run offline).

use crate::providers::EmbeddingProvider;
use paliabot_core::{BotError, BotResult, EmbeddingConfig, StorageConfig};
use paliabot_scraper::{Chunk, ChunkMetadata};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

const VECTORS_FILE: &str = "vectors.json";

/// A chunk with its embedding, as stored in the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub id: Uuid,
    pub text: String,
    pub metadata: ChunkMetadata,
    pub embedding: Vec<f32>,
}

/// A search hit. `distance` is cosine distance: lower is more similar, and
/// the range is [0, 2], not a bounded [0, 1] similarity score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub text: String,
    pub metadata: ChunkMetadata,
    pub distance: f32,
}

/// Durable vector index over wiki chunks.
pub struct VectorIndex {
    chunks: Vec<IndexedChunk>,
    embedder: Arc<dyn EmbeddingProvider>,
    dimension: usize,
    batch_size: usize,
    storage_path: PathBuf,
    dirty: bool,
}

impl VectorIndex {
    /// Open (or create) the collection at `{base_dir}/{collection}` and load
    /// any previously persisted chunks.
    pub fn open(
        storage: &StorageConfig,
        embedding: &EmbeddingConfig,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> BotResult<Self> {
        let collection_dir = storage.base_dir.join(&storage.collection);
        std::fs::create_dir_all(&collection_dir).map_err(|e| BotError::Storage {
            message: format!("cannot create collection dir {:?}", collection_dir),
            source: Some(Box::new(e)),
            context: paliabot_core::ErrorContext::new("store").with_operation("open"),
        })?;

        let storage_path = collection_dir.join(VECTORS_FILE);
        let chunks = if storage_path.exists() {
            let data = std::fs::read_to_string(&storage_path)?;
            let chunks: Vec<IndexedChunk> = serde_json::from_str(&data)?;
            info!("Loaded {} chunks from {:?}", chunks.len(), storage_path);
            chunks
        } else {
            info!("Creating new vector collection at {:?}", storage_path);
            Vec::new()
        };

        Ok(Self {
            chunks,
            embedder,
            dimension: embedding.dimension,
            batch_size: embedding.batch_size.max(1),
            storage_path,
            dirty: false,
        })
    }

    /// Embed and store chunks in batches. Each batch either fully persists
    /// or its error is surfaced without committing that batch.
    pub async fn add_chunks(&mut self, chunks: &[Chunk]) -> BotResult<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        info!("Adding {} chunks to vector index", chunks.len());
        let mut added = 0;

        for (batch_index, batch) in chunks.chunks(self.batch_size).enumerate() {
            let batch: Vec<&Chunk> = batch
                .iter()
                .filter(|chunk| {
                    let keep = !chunk.text.trim().is_empty();
                    if !keep {
                        debug!("Skipping empty chunk from {}", chunk.metadata.url);
                    }
                    keep
                })
                .collect();
            if batch.is_empty() {
                continue;
            }

            let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
            let embeddings = self.embedder.embed_many(&texts).await?;

            for (chunk, embedding) in batch.iter().zip(embeddings) {
                if embedding.len() != self.dimension {
                    return Err(BotError::embedding(
                        format!(
                            "embedding dimension mismatch: expected {}, got {}",
                            self.dimension,
                            embedding.len()
                        ),
                        None,
                    ));
                }
                self.chunks.push(IndexedChunk {
                    id: Uuid::new_v4(),
                    text: chunk.text.clone(),
                    metadata: chunk.metadata.clone(),
                    embedding,
                });
                added += 1;
            }

            self.dirty = true;
            self.save()?;
            debug!("Persisted batch {} (total {})", batch_index + 1, self.chunks.len());
        }

        Ok(added)
    }

    /// Nearest-neighbor search, most similar first. An empty index yields
    /// empty results, never an error.
    pub async fn search(&self, query: &str, k: usize) -> BotResult<Vec<ScoredChunk>> {
        if self.chunks.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed_one(query).await?;
        if query_embedding.len() != self.dimension {
            warn!(
                "Query embedding dimension mismatch: expected {}, got {}",
                self.dimension,
                query_embedding.len()
            );
            return Ok(Vec::new());
        }

        let mut scored: Vec<ScoredChunk> = self
            .chunks
            .iter()
            .map(|chunk| ScoredChunk {
                text: chunk.text.clone(),
                metadata: chunk.metadata.clone(),
                distance: 1.0 - cosine_similarity(&query_embedding, &chunk.embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }

    /// Number of chunks in the index.
    pub fn count(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// URLs with at least one indexed chunk, for incremental scrapes.
    pub fn indexed_urls(&self) -> HashSet<String> {
        self.chunks
            .iter()
            .map(|chunk| chunk.metadata.url.clone())
            .collect()
    }

    /// Drop all chunks and recreate the backing collection.
    pub fn clear(&mut self) -> BotResult<()> {
        self.chunks.clear();
        if self.storage_path.exists() {
            std::fs::remove_file(&self.storage_path)?;
        }
        self.dirty = true;
        self.save()?;
        info!("Cleared vector index");
        Ok(())
    }

    /// Write the index to disk if it has unsaved changes.
    pub fn save(&mut self) -> BotResult<()> {
        if !self.dirty {
            return Ok(());
        }
        let data = serde_json::to_string(&self.chunks)?;
        std::fs::write(&self.storage_path, data)?;
        self.dirty = false;
        debug!("Saved {} chunks to {:?}", self.chunks.len(), self.storage_path);
        Ok(())
    }
}

impl Drop for VectorIndex {
    fn drop(&mut self) {
        if self.dirty {
            if let Err(e) = self.save() {
                warn!("Failed to save vector index on drop: {}", e);
            }
        }
    }
}

/// Cosine similarity between two vectors of equal length.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::KeywordEmbedder;
    use paliabot_core::{EmbeddingConfig, StorageConfig};

    fn test_configs(dir: &std::path::Path) -> (StorageConfig, EmbeddingConfig) {
        let storage = StorageConfig {
            base_dir: dir.to_path_buf(),
            collection: "test_wiki".to_string(),
        };
        let embedding = EmbeddingConfig {
            dimension: KeywordEmbedder::DIMENSION,
            batch_size: 2,
            ..EmbeddingConfig::default()
        };
        (storage, embedding)
    }

    fn chunk(text: &str, url: &str, section: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            metadata: ChunkMetadata {
                title: "Sturgeon".to_string(),
                url: url.to_string(),
                category: "Fish".to_string(),
                section: section.to_string(),
                chunk_index: Some(0),
            },
        }
    }

    #[test]
    fn cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn add_search_count_and_urls() {
        let dir = tempfile::tempdir().unwrap();
        let (storage, embedding) = test_configs(dir.path());
        let embedder = Arc::new(KeywordEmbedder::new());

        let mut index = VectorIndex::open(&storage, &embedding, embedder).unwrap();
        assert_eq!(index.count(), 0);
        assert!(index.search("anything", 5).await.unwrap().is_empty());

        let chunks = vec![
            chunk(
                "Sturgeon - Habitat\n\nThe sturgeon is found in lakes.",
                "https://palia.wiki.gg/wiki/Sturgeon",
                "Habitat",
            ),
            chunk(
                "Hassian - Gifts\n\nHassian loves heat root.",
                "https://palia.wiki.gg/wiki/Hassian",
                "Gifts",
            ),
            chunk(
                "Sturgeon\n\nType: fish",
                "https://palia.wiki.gg/wiki/Sturgeon",
                "infobox",
            ),
        ];

        assert_eq!(index.add_chunks(&chunks).await.unwrap(), 3);
        assert_eq!(index.count(), 3);
        assert_eq!(index.indexed_urls().len(), 2);

        let results = index.search("how do I catch a sturgeon in a lake", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].metadata.section, "Habitat");
        assert!(results[0].distance <= results[1].distance);
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let (storage, embedding) = test_configs(dir.path());

        {
            let mut index =
                VectorIndex::open(&storage, &embedding, Arc::new(KeywordEmbedder::new())).unwrap();
            index
                .add_chunks(&[chunk(
                    "Sturgeon lake fish",
                    "https://palia.wiki.gg/wiki/Sturgeon",
                    "Habitat",
                )])
                .await
                .unwrap();
        }

        let reopened =
            VectorIndex::open(&storage, &embedding, Arc::new(KeywordEmbedder::new())).unwrap();
        assert_eq!(reopened.count(), 1);
        assert!(reopened
            .indexed_urls()
            .contains("https://palia.wiki.gg/wiki/Sturgeon"));
    }

    #[tokio::test]
    async fn clear_empties_index_and_disk() {
        let dir = tempfile::tempdir().unwrap();
        let (storage, embedding) = test_configs(dir.path());

        let mut index =
            VectorIndex::open(&storage, &embedding, Arc::new(KeywordEmbedder::new())).unwrap();
        index
            .add_chunks(&[chunk("lake fish", "https://x/wiki/A", "full_text")])
            .await
            .unwrap();
        index.clear().unwrap();
        assert_eq!(index.count(), 0);
        drop(index);

        let reopened =
            VectorIndex::open(&storage, &embedding, Arc::new(KeywordEmbedder::new())).unwrap();
        assert_eq!(reopened.count(), 0);
    }

    #[tokio::test]
    async fn search_caps_results_at_k() {
        let dir = tempfile::tempdir().unwrap();
        let (storage, embedding) = test_configs(dir.path());

        let mut index =
            VectorIndex::open(&storage, &embedding, Arc::new(KeywordEmbedder::new())).unwrap();
        let chunks: Vec<Chunk> = (0..5)
            .map(|i| chunk(&format!("lake fish number {}", i), "https://x/wiki/A", "s"))
            .collect();
        index.add_chunks(&chunks).await.unwrap();

        let results = index.search("lake fish", 3).await.unwrap();
        assert_eq!(results.len(), 3);
    }
}
