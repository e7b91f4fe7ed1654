//! Vector store abstraction for tubeqa.
//!
//! Provides a trait-based interface over similarity-searchable chunk indexes.

mod memory;

pub use memory::MemoryVectorStore;

use crate::chunking::ContentChunk;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A chunk stored in the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID.
    pub id: Uuid,
    /// Text content of this chunk.
    pub content: String,
    /// Order of this chunk in the transcript.
    pub chunk_order: usize,
    /// Embedding vector.
    pub embedding: Vec<f32>,
}

impl Document {
    /// Create a new document.
    pub fn new(content: String, chunk_order: usize, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            chunk_order,
            embedding,
        }
    }

    /// Pair a chunk with its embedding.
    pub fn from_chunk(chunk: ContentChunk, embedding: Vec<f32>) -> Self {
        Self::new(chunk.content, chunk.order, embedding)
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched document.
    pub document: Document,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Bulk insert documents.
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize>;

    /// Search for the `limit` most similar documents.
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
