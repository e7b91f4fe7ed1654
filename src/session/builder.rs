//! Builds a question-answering chain from transcript text.

use crate::chunking::{create_chunker, Chunker};
use crate::config::{EmbeddingSettings, LlmSettings, Prompts, RetrievalSettings, Settings};
use crate::embedding::{Embedder, FastEmbedder};
use crate::error::{Result, TubeQaError};
use crate::rag::{ChatModel, ConversationalRetrievalChain, OpenAIChatModel, Retriever};
use crate::vector_store::{Document, MemoryVectorStore, VectorStore};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

/// A freshly indexed transcript, ready for questions.
pub struct BuiltChain {
    pub chain: ConversationalRetrievalChain,
    /// Number of chunks in the index.
    pub chunk_count: usize,
}

/// Turns transcript text into a conversational retrieval chain.
///
/// The embedding model is loaded on the first successful split, so invalid
/// input never pays for model setup.
pub struct SessionBuilder {
    chunker: Box<dyn Chunker>,
    embedding: EmbeddingSettings,
    embedder: OnceCell<Arc<dyn Embedder>>,
    llm: LlmSettings,
    chat_model: Option<Arc<dyn ChatModel>>,
    retrieval: RetrievalSettings,
    prompts: Prompts,
}

impl SessionBuilder {
    /// Create a builder from settings.
    pub fn new(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        Ok(Self {
            chunker: Box::new(create_chunker(&settings.chunking)),
            embedding: settings.embedding.clone(),
            embedder: OnceCell::new(),
            llm: settings.llm.clone(),
            chat_model: None,
            retrieval: settings.retrieval.clone(),
            prompts,
        })
    }

    /// Use this embedder instead of loading the configured model.
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = OnceCell::new_with(Some(embedder));
        self
    }

    /// Use this chat model instead of the configured remote one.
    pub fn with_chat_model(mut self, chat_model: Arc<dyn ChatModel>) -> Self {
        self.chat_model = Some(chat_model);
        self
    }

    /// Split, embed and index `text`, then wire up the chain.
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn build(&self, text: &str) -> Result<BuiltChain> {
        if text.trim().is_empty() {
            return Err(TubeQaError::EmptyTranscript(
                "Transcript text is empty".to_string(),
            ));
        }

        let chunks = self.chunker.chunk(text);
        if chunks.is_empty() {
            return Err(TubeQaError::EmptyTranscript(
                "Transcript produced no chunks".to_string(),
            ));
        }
        debug!("Split transcript into {} chunks", chunks.len());

        let llm = self.chat_model()?;
        let embedder = self.embedder().await?;

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(TubeQaError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let documents: Vec<Document> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| Document::from_chunk(chunk, embedding))
            .collect();

        let store = Arc::new(MemoryVectorStore::with_dimensions(embedder.dimensions()));
        let chunk_count = store.upsert_batch(&documents).await?;

        let retriever = Retriever::new(store, embedder, self.retrieval.top_k);
        let chain = ConversationalRetrievalChain::new(llm, retriever, self.prompts.clone())
            .with_return_source_documents(self.retrieval.return_source_documents)
            .with_rephrase_question(self.retrieval.rephrase_question);
        info!(
            "Indexed {} chunks, answering with {}",
            chunk_count,
            chain.model_name()
        );

        Ok(BuiltChain { chain, chunk_count })
    }

    fn chat_model(&self) -> Result<Arc<dyn ChatModel>> {
        if let Some(model) = &self.chat_model {
            return Ok(model.clone());
        }
        let api_key = self.llm.api_key()?;
        Ok(Arc::new(OpenAIChatModel::new(&self.llm, &api_key)?))
    }

    async fn embedder(&self) -> Result<Arc<dyn Embedder>> {
        let embedder = self
            .embedder
            .get_or_try_init(|| async {
                let settings = self.embedding.clone();
                let model = tokio::task::spawn_blocking(move || FastEmbedder::new(&settings))
                    .await
                    .map_err(|e| TubeQaError::Embedding(format!("Model loading task failed: {}", e)))??;
                Ok::<Arc<dyn Embedder>, TubeQaError>(Arc::new(model))
            })
            .await?;
        Ok(embedder.clone())
    }
}
