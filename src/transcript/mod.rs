//! Transcript acquisition: video ID extraction, remote fetch, and normalization.
//!
//! Transcripts come back from the remote service as ordered segments whose
//! concrete shape depends on the client library. Every shape is adapted to
//! [`SegmentText`] at the boundary so the rest of the crate only ever asks a
//! segment for its text.

mod fetch;
mod video_id;
mod youtube;

pub use fetch::{
    classify_description, classify_fetch_error, ListedTranscript, TranscriptApi, TranscriptFetcher,
};
pub use video_id::{UrlShape, VideoId};
pub use youtube::YoutubeTranscriptApi;

use crate::error::{Result, TubeQaError};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::{debug, warn};

/// The one capability a fetched segment must offer: yield its text.
pub trait SegmentText: Send + Sync {
    /// The segment text, or `None` if this segment carries none.
    fn text(&self) -> Option<Cow<'_, str>>;
}

/// Segments as returned by a [`TranscriptApi`].
pub type Segments = Vec<Box<dyn SegmentText>>;

/// A timed caption segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedSegment {
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// Duration in seconds.
    pub duration: f64,
}

impl TimedSegment {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }
}

impl SegmentText for TimedSegment {
    fn text(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(&self.text))
    }
}

/// Dictionary-shaped segments: a JSON object with a `text` field.
impl SegmentText for serde_json::Value {
    fn text(&self) -> Option<Cow<'_, str>> {
        self.get("text")?.as_str().map(Cow::Borrowed)
    }
}

/// Segments that only expose their text through serialization.
pub struct Serialized<T>(pub T);

impl<T: Serialize + Send + Sync> SegmentText for Serialized<T> {
    fn text(&self) -> Option<Cow<'_, str>> {
        let value = serde_json::to_value(&self.0).ok()?;
        match value.get("text")? {
            serde_json::Value::String(text) => Some(Cow::Owned(text.clone())),
            _ => None,
        }
    }
}

/// A normalized transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Video this transcript belongs to.
    pub video_id: VideoId,
    /// Segment texts joined by single spaces, in original order.
    pub text: String,
    /// Number of segments returned by the service.
    pub segment_count: usize,
    /// Segments whose text could not be extracted.
    pub skipped_segments: usize,
}

impl Transcript {
    /// Length of the normalized text in characters.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Normalize fetched segments into a single transcript string.
pub fn normalize(video_id: &VideoId, segments: Segments) -> Result<Transcript> {
    if segments.is_empty() {
        return Err(TubeQaError::EmptyTranscript(
            "Transcript has no segments".to_string(),
        ));
    }

    let segment_count = segments.len();
    let parts: Vec<Cow<'_, str>> = segments.iter().filter_map(|s| s.text()).collect();
    let skipped_segments = segment_count - parts.len();

    if parts.is_empty() {
        return Err(TubeQaError::NoExtractableText {
            segments: segment_count,
        });
    }

    if skipped_segments > 0 {
        warn!(
            "Skipped {} of {} transcript segments with no extractable text",
            skipped_segments, segment_count
        );
    }

    let text = parts.join(" ");
    debug!(
        "Processed {} segments, {} characters",
        parts.len(),
        text.chars().count()
    );

    Ok(Transcript {
        video_id: video_id.clone(),
        text,
        segment_count,
        skipped_segments,
    })
}
