//! Deterministic stand-ins for the remote and model-backed seams, used by unit tests.

use crate::embedding::Embedder;
use crate::error::{Result, TubeQaError};
use crate::rag::{ChatMessage, ChatModel};
use crate::transcript::{
    classify_description, ListedTranscript, SegmentText, Segments, TimedSegment, TranscriptApi,
    VideoId,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Bag-of-words embedder over a fixed vocabulary.
///
/// Each vocabulary word owns one dimension, so texts sharing more words
/// score a higher cosine similarity. Unknown words are ignored.
pub struct KeywordEmbedder {
    vocabulary: Vec<String>,
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    /// Build the vocabulary from every distinct word in `texts`.
    pub fn from_corpus(texts: &[&str]) -> Self {
        let mut vocabulary: Vec<String> = Vec::new();
        for text in texts {
            for word in words(text) {
                if !vocabulary.contains(&word) {
                    vocabulary.push(word);
                }
            }
        }
        Self {
            vocabulary,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of embed or embed_batch calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimensions()];
        for word in words(text) {
            if let Some(index) = self.vocabulary.iter().position(|w| *w == word) {
                vector[index] += 1.0;
            }
        }
        vector
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vectorize(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.vocabulary.len().max(1)
    }
}

/// Chat model that replays canned responses and records what it was sent.
pub struct ScriptedChatModel {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChatModel {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every message list passed to `complete`, oldest first.
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TubeQaError::OpenAI("Failed to generate response: script exhausted".to_string()))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Transcript service that knows a fixed set of videos.
#[derive(Default)]
pub struct FixedTranscriptApi {
    videos: HashMap<String, Vec<String>>,
}

impl FixedTranscriptApi {
    pub fn with_video(mut self, video_id: &str, segments: &[&str]) -> Self {
        self.videos.insert(
            video_id.to_string(),
            segments.iter().map(|s| s.to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl TranscriptApi for FixedTranscriptApi {
    async fn fetch(&self, video_id: &VideoId, _languages: Option<&[String]>) -> Result<Segments> {
        let texts = self
            .videos
            .get(video_id.as_str())
            .ok_or_else(|| {
                classify_description(Some(video_id), "Subtitles are disabled for this video")
            })?;
        Ok(texts
            .iter()
            .map(|t| Box::new(TimedSegment::new(t.clone(), 0.0, 1.0)) as Box<dyn SegmentText>)
            .collect())
    }

    async fn list(&self, video_id: &VideoId) -> Result<Vec<ListedTranscript>> {
        Ok(if self.videos.contains_key(video_id.as_str()) {
            vec![ListedTranscript {
                language_code: "en".to_string(),
                language: "English".to_string(),
                is_generated: false,
            }]
        } else {
            Vec::new()
        })
    }
}
