//! Transcript chunking for embedding and retrieval.

mod recursive;

pub use recursive::{RecursiveCharacterSplitter, DEFAULT_SEPARATORS};

use crate::config::ChunkingSettings;
use serde::{Deserialize, Serialize};

/// A contiguous piece of transcript text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentChunk {
    /// Text content of this chunk.
    pub content: String,
    /// Position of this chunk in the transcript.
    pub order: usize,
}

impl ContentChunk {
    pub fn new(content: String, order: usize) -> Self {
        Self { content, order }
    }
}

/// Trait for text chunking implementations.
pub trait Chunker: Send + Sync {
    /// Split text into ordered chunks.
    fn chunk(&self, text: &str) -> Vec<ContentChunk>;
}

/// Create the default chunker from settings.
pub fn create_chunker(settings: &ChunkingSettings) -> RecursiveCharacterSplitter {
    RecursiveCharacterSplitter::new(settings.chunk_size, settings.chunk_overlap)
}
