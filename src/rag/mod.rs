//! RAG (Retrieval-Augmented Generation) for question answering with sources.
//!
//! A [`ConversationalRetrievalChain`] condenses follow-up questions against the
//! conversation so far, retrieves the most similar transcript chunks, and asks
//! the chat model to answer from those chunks alone.

mod chain;
pub mod context;
mod llm;

pub use chain::{ConversationalRetrievalChain, QaResponse};
pub use context::Retriever;
pub use llm::{ChatMessage, ChatModel, OpenAIChatModel};

use crate::vector_store::SearchResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A retrieved transcript chunk used as answer context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceChunk {
    /// Text content.
    pub content: String,
    /// Position of the chunk in the transcript.
    pub chunk_order: usize,
    /// Similarity score.
    pub score: f32,
}

impl SourceChunk {
    /// First `max_chars` characters followed by "...".
    pub fn preview(&self, max_chars: usize) -> String {
        let head: String = self.content.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

impl From<SearchResult> for SourceChunk {
    fn from(result: SearchResult) -> Self {
        Self {
            content: result.document.content,
            chunk_order: result.document.chunk_order,
            score: result.score,
        }
    }
}

/// One question and its answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
    /// Chunks the answer was based on.
    pub sources: Vec<SourceChunk>,
    pub asked_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>, sources: Vec<SourceChunk>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            sources,
            asked_at: Utc::now(),
        }
    }
}
