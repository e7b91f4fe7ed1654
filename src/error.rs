//! Error types for tubeqa.

use thiserror::Error;

/// Library-level error type for tubeqa operations.
#[derive(Error, Debug)]
pub enum TubeQaError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Could not extract video ID from URL: {0}")]
    UnrecognizedUrl(String),

    #[error("📝 No transcript available for video ID: {}", display_id(.video_id))]
    NoTranscript { video_id: Option<String> },

    #[error("🚫 Video unavailable or private (ID: {})", display_id(.video_id))]
    VideoUnavailable { video_id: Option<String> },

    #[error("❌ Error: {message} (ID: {})", display_id(.video_id))]
    TranscriptFetch {
        video_id: Option<String>,
        message: String,
    },

    #[error("Transcript is empty: {0}")]
    EmptyTranscript(String),

    #[error("Could not extract any text from {segments} transcript segments")]
    NoExtractableText { segments: usize },

    #[error("{0} not found in environment variables.")]
    MissingCredential(String),

    #[error("No transcript loaded. Load a video before asking questions.")]
    NoSessionLoaded,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("RAG error: {0}")]
    Rag(String),

    #[error("Language model API error: {0}")]
    OpenAI(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

fn display_id(video_id: &Option<String>) -> &str {
    video_id.as_deref().unwrap_or("None")
}

/// Result type alias for tubeqa operations.
pub type Result<T> = std::result::Result<T, TubeQaError>;
