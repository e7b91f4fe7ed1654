//! YouTube transcript service client.

use super::fetch::{classify_description, ListedTranscript, TranscriptApi};
use super::{SegmentText, Segments, VideoId};
use crate::error::{Result, TubeQaError};
use async_trait::async_trait;
use std::borrow::Cow;
use tracing::debug;
use yt_transcript_rs::api::YouTubeTranscriptApi as YtApi;
use yt_transcript_rs::errors::CouldNotRetrieveTranscriptReason as Reason;
use yt_transcript_rs::{CouldNotRetrieveTranscript, FetchedTranscriptSnippet};

impl SegmentText for FetchedTranscriptSnippet {
    fn text(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(&self.text))
    }
}

/// [`TranscriptApi`] backed by `yt-transcript-rs`.
pub struct YoutubeTranscriptApi {
    api: YtApi,
    preserve_formatting: bool,
}

impl YoutubeTranscriptApi {
    pub fn new(preserve_formatting: bool) -> Result<Self> {
        let api = YtApi::new(None, None, None).map_err(|e| TubeQaError::TranscriptFetch {
            video_id: None,
            message: e.to_string(),
        })?;
        Ok(Self {
            api,
            preserve_formatting,
        })
    }

    async fn fetch_languages(&self, video_id: &VideoId, languages: &[&str]) -> Result<Segments> {
        let fetched = self
            .api
            .fetch_transcript(video_id.as_str(), languages, self.preserve_formatting)
            .await
            .map_err(|e| fetch_error(Some(video_id), e))?;

        debug!(
            "Fetched {} snippets in {} ({})",
            fetched.snippets.len(),
            fetched.language,
            fetched.language_code
        );

        Ok(fetched
            .snippets
            .into_iter()
            .map(|snippet| Box::new(snippet) as Box<dyn SegmentText>)
            .collect())
    }
}

#[async_trait]
impl TranscriptApi for YoutubeTranscriptApi {
    async fn fetch(&self, video_id: &VideoId, languages: Option<&[String]>) -> Result<Segments> {
        match languages {
            Some(languages) => {
                let codes: Vec<&str> = languages.iter().map(String::as_str).collect();
                self.fetch_languages(video_id, &codes).await
            }
            None => {
                // Any language: ask for every code the video advertises.
                let listed = self.list(video_id).await?;
                let codes: Vec<&str> = listed.iter().map(|t| t.language_code.as_str()).collect();
                if codes.is_empty() {
                    return Err(TubeQaError::NoTranscript {
                        video_id: Some(video_id.to_string()),
                    });
                }
                self.fetch_languages(video_id, &codes).await
            }
        }
    }

    async fn list(&self, video_id: &VideoId) -> Result<Vec<ListedTranscript>> {
        let list = self
            .api
            .list_transcripts(video_id.as_str())
            .await
            .map_err(|e| fetch_error(Some(video_id), e))?;

        Ok(list
            .transcripts()
            .map(|t| ListedTranscript {
                language_code: t.language_code.clone(),
                language: t.language.clone(),
                is_generated: t.is_generated,
            })
            .collect())
    }
}

/// Sort a client failure by its reason.
fn fetch_error(video_id: Option<&VideoId>, e: CouldNotRetrieveTranscript) -> TubeQaError {
    let id = video_id.map(|id| id.to_string());
    match &e.reason {
        Some(Reason::TranscriptsDisabled | Reason::NoTranscriptFound { .. }) => {
            TubeQaError::NoTranscript { video_id: id }
        }
        Some(Reason::VideoUnavailable | Reason::VideoUnplayable { .. }) => {
            TubeQaError::VideoUnavailable { video_id: id }
        }
        Some(_) => TubeQaError::TranscriptFetch {
            video_id: id,
            message: e.to_string(),
        },
        None => classify_description(video_id, &e.to_string()),
    }
}
