//! Per-user question-answering session.
//!
//! A [`SessionContext`] owns at most one loaded transcript together with the
//! chain built from it and the conversation so far. Loading another video
//! discards all three before anything new is fetched.

mod builder;

pub use builder::{BuiltChain, SessionBuilder};

use crate::error::{Result, TubeQaError};
use crate::rag::{ConversationTurn, ConversationalRetrievalChain};
use crate::transcript::{Transcript, TranscriptFetcher, VideoId};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// Shown after a failed load.
pub const TROUBLESHOOTING_TIPS: [&str; 4] = [
    "Make sure the video URL is correct",
    "Check if the video has subtitles/captions enabled",
    "Try a different video (e.g., popular videos usually have transcripts)",
    "Example working URL format: https://www.youtube.com/watch?v=dQw4w9WgXcQ",
];

/// Snapshot of a session for display.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub loaded: bool,
    pub video_id: Option<VideoId>,
    pub transcript_chars: usize,
    pub chunk_count: usize,
    pub turns: usize,
}

impl SessionStatus {
    /// One-line status message.
    pub fn message(&self) -> &'static str {
        if self.loaded {
            "🟢 Ready to answer questions!"
        } else {
            "🔵 Load a video transcript to start."
        }
    }
}

/// Result of a successful load.
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub video_id: VideoId,
    pub transcript_chars: usize,
    pub segment_count: usize,
    pub skipped_segments: usize,
    pub chunk_count: usize,
}

struct LoadedTranscript {
    transcript: Transcript,
    chain: ConversationalRetrievalChain,
    chunk_count: usize,
}

/// Transcript, chain and history for one user.
#[derive(Default)]
pub struct SessionContext {
    loaded: Option<LoadedTranscript>,
    history: Vec<ConversationTurn>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            loaded: self.loaded.is_some(),
            video_id: self.loaded.as_ref().map(|l| l.transcript.video_id.clone()),
            transcript_chars: self
                .loaded
                .as_ref()
                .map(|l| l.transcript.char_count())
                .unwrap_or(0),
            chunk_count: self.loaded.as_ref().map(|l| l.chunk_count).unwrap_or(0),
            turns: self.history.len(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// The loaded transcript, if any.
    pub fn transcript(&self) -> Option<&Transcript> {
        self.loaded.as_ref().map(|l| &l.transcript)
    }

    /// Fetch the transcript for `url` and build a fresh chain over it.
    ///
    /// The previous transcript and history are dropped first, so a failed
    /// load leaves the session empty.
    #[instrument(skip(self, fetcher, builder), fields(url = %url))]
    pub async fn load(
        &mut self,
        url: &str,
        fetcher: &TranscriptFetcher,
        builder: &SessionBuilder,
    ) -> Result<LoadSummary> {
        self.reset();

        let video_id = VideoId::parse(url)?;
        let transcript = fetcher.fetch(&video_id).await?;
        let BuiltChain { chain, chunk_count } = builder.build(&transcript.text).await?;

        let summary = LoadSummary {
            video_id,
            transcript_chars: transcript.char_count(),
            segment_count: transcript.segment_count,
            skipped_segments: transcript.skipped_segments,
            chunk_count,
        };
        info!(
            "Loaded {} ({} characters, {} chunks)",
            summary.video_id, summary.transcript_chars, summary.chunk_count
        );

        self.loaded = Some(LoadedTranscript {
            transcript,
            chain,
            chunk_count,
        });
        Ok(summary)
    }

    /// Answer a question and append it to the history.
    ///
    /// On failure the history and chain are left as they were.
    pub async fn ask(&mut self, question: &str) -> Result<ConversationTurn> {
        let question = question.trim();
        if question.is_empty() {
            return Err(TubeQaError::InvalidInput(
                "Question cannot be empty".to_string(),
            ));
        }

        let loaded = self.loaded.as_ref().ok_or(TubeQaError::NoSessionLoaded)?;
        let response = loaded.chain.ask(question, &self.history).await.map_err(|e| {
            warn!("Question failed: {}", e);
            e
        })?;
        debug!("Standalone question was: {}", response.generated_question);

        let turn = ConversationTurn::new(question, response.answer, response.sources);
        self.history.push(turn.clone());
        Ok(turn)
    }

    pub fn clear_history(&mut self) {
        debug!("Clearing {} turns", self.history.len());
        self.history.clear();
    }

    /// Drop the transcript, chain and history.
    pub fn reset(&mut self) {
        self.loaded = None;
        self.history.clear();
    }

    /// Prior turns, most recent first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &ConversationTurn> {
        self.history.iter().rev()
    }

    pub fn last_turn(&self) -> Option<&ConversationTurn> {
        self.history.last()
    }
}
