//! Transcript fetching with a fixed fallback ladder.

use super::{normalize, Segments, Transcript, VideoId, YoutubeTranscriptApi};
use crate::config::TranscriptSettings;
use crate::error::{Result, TubeQaError};
use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

/// A transcript advertised by the remote service for a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedTranscript {
    /// Language code, e.g. "en".
    pub language_code: String,
    /// Human-readable language name.
    pub language: String,
    /// Whether the captions were generated automatically.
    pub is_generated: bool,
}

/// Client for a remote transcript service.
#[async_trait]
pub trait TranscriptApi: Send + Sync {
    /// Fetch segments, restricted to `languages` when given.
    async fn fetch(&self, video_id: &VideoId, languages: Option<&[String]>) -> Result<Segments>;

    /// List all transcripts available for a video, in service order.
    async fn list(&self, video_id: &VideoId) -> Result<Vec<ListedTranscript>>;
}

/// Fetches and normalizes transcripts.
///
/// Strategies are tried strictly in order, falling through on error:
/// preferred languages, any language, then the first listed transcript.
pub struct TranscriptFetcher {
    api: Box<dyn TranscriptApi>,
    preferred_languages: Vec<String>,
}

impl TranscriptFetcher {
    pub fn new(api: Box<dyn TranscriptApi>, preferred_languages: Vec<String>) -> Self {
        Self {
            api,
            preferred_languages,
        }
    }

    /// Create a fetcher backed by the YouTube transcript service.
    pub fn from_settings(settings: &TranscriptSettings) -> Result<Self> {
        let api = YoutubeTranscriptApi::new(settings.preserve_formatting)?;
        Ok(Self::new(Box::new(api), settings.preferred_languages.clone()))
    }

    /// Fetch the full transcript text for a video.
    #[instrument(skip(self), fields(video_id = %video_id))]
    pub async fn fetch(&self, video_id: &VideoId) -> Result<Transcript> {
        let segments = self
            .fetch_segments(video_id)
            .await
            .map_err(|e| classify_fetch_error(Some(video_id), e))?;

        let transcript = normalize(video_id, segments)?;
        info!(
            "Fetched transcript for {}: {} segments, {} characters",
            video_id,
            transcript.segment_count,
            transcript.char_count()
        );
        Ok(transcript)
    }

    async fn fetch_segments(&self, video_id: &VideoId) -> Result<Segments> {
        debug!(
            "Attempting fetch with language preference {:?}",
            self.preferred_languages
        );
        match self
            .api
            .fetch(video_id, Some(&self.preferred_languages))
            .await
        {
            Ok(segments) => return Ok(segments),
            Err(e) => warn!("Preferred-language fetch failed: {}", e),
        }

        debug!("Attempting fetch without language restriction");
        match self.api.fetch(video_id, None).await {
            Ok(segments) => return Ok(segments),
            Err(e) => warn!("Unrestricted fetch failed: {}", e),
        }

        debug!("Attempting to list available transcripts");
        let listed = self.api.list(video_id).await?;
        let first = listed.into_iter().next().ok_or_else(|| TubeQaError::NoTranscript {
            video_id: Some(video_id.to_string()),
        })?;

        debug!(
            "Fetching first listed transcript: {} ({})",
            first.language, first.language_code
        );
        self.api
            .fetch(video_id, Some(std::slice::from_ref(&first.language_code)))
            .await
    }
}

/// Settle the final error of a failed fetch.
///
/// Clients report failures already sorted into no-transcript, unavailable
/// or generic; this only attaches the video id. Anything else is generic.
pub fn classify_fetch_error(video_id: Option<&VideoId>, cause: TubeQaError) -> TubeQaError {
    let fallback = || video_id.map(|id| id.to_string());
    match cause {
        TubeQaError::NoTranscript { video_id } => TubeQaError::NoTranscript {
            video_id: video_id.or_else(fallback),
        },
        TubeQaError::VideoUnavailable { video_id } => TubeQaError::VideoUnavailable {
            video_id: video_id.or_else(fallback),
        },
        TubeQaError::TranscriptFetch { video_id, message } => TubeQaError::TranscriptFetch {
            video_id: video_id.or_else(fallback),
            message,
        },
        other => TubeQaError::TranscriptFetch {
            video_id: fallback(),
            message: other.to_string(),
        },
    }
}

/// Sort a failure that only comes with a description.
pub fn classify_description(video_id: Option<&VideoId>, message: &str) -> TubeQaError {
    let video_id = video_id.map(|id| id.to_string());
    let lowered = message.to_lowercase();

    if lowered.contains("unavailable") || lowered.contains("private") {
        TubeQaError::VideoUnavailable { video_id }
    } else if lowered.contains("disabled")
        || lowered.contains("could not retrieve")
        || lowered.contains("no transcript")
    {
        TubeQaError::NoTranscript { video_id }
    } else {
        TubeQaError::TranscriptFetch {
            video_id,
            message: message.to_string(),
        }
    }
}
