//! Retrieval of context chunks for a question.

use super::SourceChunk;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::VectorStore;
use std::sync::Arc;
use tracing::debug;

/// Retrieves the chunks most similar to a query.
#[derive(Clone)]
pub struct Retriever {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    k: usize,
}

impl Retriever {
    /// Create a new retriever returning the top `k` chunks.
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>, k: usize) -> Self {
        Self {
            vector_store,
            embedder,
            k,
        }
    }

    /// Embed the query and return the nearest chunks, best first.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SourceChunk>> {
        let query_embedding = self.embedder.embed(query).await?;
        let results = self.vector_store.search(&query_embedding, self.k).await?;
        debug!("Retrieved {} chunks", results.len());
        Ok(results.into_iter().map(SourceChunk::from).collect())
    }
}

/// Join chunks into the context block of the answer prompt.
pub fn format_context_for_prompt(chunks: &[SourceChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render prior turns for the question-condensing prompt.
pub fn format_chat_history(history: &[super::ConversationTurn]) -> String {
    history
        .iter()
        .map(|turn| format!("\nHuman: {}\nAssistant: {}", turn.question, turn.answer))
        .collect()
}
