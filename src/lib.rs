//! tubeqa - ask questions about YouTube videos
//!
//! Paste a video link, and tubeqa fetches the video's transcript, indexes it
//! in memory, and answers natural-language questions about it using a hosted
//! language model, citing the transcript passages each answer was drawn from.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `transcript` - Video ID extraction, transcript fetching and normalization
//! - `chunking` - Recursive character text splitting
//! - `embedding` - Local sentence embeddings
//! - `vector_store` - In-memory similarity index
//! - `rag` - Conversational retrieval chain
//! - `session` - Per-user session state and chain building
//! - `cli` - Terminal and web surfaces
//!
//! # Example
//!
//! ```rust,no_run
//! use tubeqa::config::Settings;
//! use tubeqa::session::{SessionBuilder, SessionContext};
//! use tubeqa::transcript::TranscriptFetcher;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let fetcher = TranscriptFetcher::from_settings(&settings.transcript)?;
//!     let builder = SessionBuilder::new(&settings)?;
//!
//!     let mut session = SessionContext::new();
//!     session.load("https://youtu.be/dQw4w9WgXcQ", &fetcher, &builder).await?;
//!
//!     let turn = session.ask("What is the main topic of this video?").await?;
//!     println!("{}", turn.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod rag;
pub mod session;
pub mod transcript;
pub mod vector_store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, TubeQaError};
