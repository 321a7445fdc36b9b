//! Retrieval-augmented answering over the Palia wiki index.
//!
//! Query-time data flow: [`engine::AnswerEngine`] fingerprints and caches,
//! retrieves from [`store::VectorIndex`], assembles context, generates via a
//! [`providers::GenerationProvider`], and fits the response to a hard
//! character budget with a source citation.

pub mod cache;
pub mod engine;
pub mod providers;
pub mod store;
pub mod testing;

pub use cache::ResponseCache;
pub use engine::{fingerprint, AnswerEngine, SourceInfo, NOT_FOUND_MESSAGE};
pub use providers::{
    EmbeddingProvider, GenerationProvider, SiumaiEmbeddings, SiumaiGenerator,
};
pub use store::{IndexedChunk, ScoredChunk, VectorIndex};
