//! In-memory vector store implementation.
//!
//! Exhaustive cosine search; one store lives exactly as long as one loaded transcript.

use super::{cosine_similarity, Document, SearchResult, VectorStore};
use crate::error::{Result, TubeQaError};
use async_trait::async_trait;
use std::sync::RwLock;

/// In-memory vector store.
pub struct MemoryVectorStore {
    documents: RwLock<Vec<Document>>,
    dimensions: Option<usize>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
            dimensions: None,
        }
    }

    /// Create a store that rejects embeddings of any other dimension.
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
            dimensions: Some(dimensions),
        }
    }

    fn lock_error() -> TubeQaError {
        TubeQaError::VectorStore("Vector store lock poisoned".to_string())
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        if let Some(expected) = self.dimensions {
            if let Some(bad) = docs.iter().find(|d| d.embedding.len() != expected) {
                return Err(TubeQaError::VectorStore(format!(
                    "Embedding for chunk {} has {} dimensions, expected {}",
                    bad.chunk_order,
                    bad.embedding.len(),
                    expected
                )));
            }
        }

        let mut store = self.documents.write().map_err(|_| Self::lock_error())?;
        for doc in docs {
            match store.iter_mut().find(|d| d.id == doc.id) {
                Some(existing) => *existing = doc.clone(),
                None => store.push(doc.clone()),
            }
        }
        Ok(docs.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let docs = self.documents.read().map_err(|_| Self::lock_error())?;

        let mut results: Vec<SearchResult> = docs
            .iter()
            .map(|doc| SearchResult {
                score: cosine_similarity(query_embedding, &doc.embedding),
                document: doc.clone(),
            })
            .collect();

        // Stable sort keeps transcript order among equal scores.
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(limit);

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content: &str, order: usize, embedding: Vec<f32>) -> Document {
        Document::new(content.to_string(), order, embedding)
    }

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();

        store
            .upsert_batch(&[
                doc("Hello world", 0, vec![1.0, 0.0, 0.0]),
                doc("Goodbye world", 1, vec![0.0, 1.0, 0.0]),
                doc("Hello again", 2, vec![0.9, 0.1, 0.0]),
            ])
            .await
            .unwrap();

        assert_eq!(store.search(&[1.0, 0.0, 0.0], 10).await.unwrap().len(), 3);

        let results = store.search(&[1.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].document.content, "Hello world");
        assert_eq!(results[1].document.content, "Hello again");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let store = MemoryVectorStore::new();
        store
            .upsert_batch(&[
                doc("first", 0, vec![1.0, 0.0]),
                doc("second", 1, vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results[0].document.chunk_order, 0);
        assert_eq!(results[1].document.chunk_order, 1);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let store = MemoryVectorStore::with_dimensions(3);
        let result = store.upsert_batch(&[doc("short", 0, vec![1.0, 0.0])]).await;
        assert!(matches!(result, Err(TubeQaError::VectorStore(_))));
        assert!(store.search(&[1.0, 0.0, 0.0], 10).await.unwrap().is_empty());
    }
}
