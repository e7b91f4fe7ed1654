//! Local sentence embeddings via fastembed (ONNX runtime, CPU).

use super::Embedder;
use crate::config::{EmbeddingSettings, Settings};
use crate::error::{Result, TubeQaError};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument};

/// Texts per inference batch.
const BATCH_SIZE: usize = 64;

/// Sentence-transformer embedder running on the CPU.
pub struct FastEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
    dimensions: usize,
}

impl FastEmbedder {
    /// Load (downloading on first use) the configured model.
    pub fn new(settings: &EmbeddingSettings) -> Result<Self> {
        let (model, dimensions) = resolve_model(&settings.model)?;
        let cache_dir = Settings::expand_path(&settings.cache_dir);
        std::fs::create_dir_all(&cache_dir)?;

        info!("Loading embedding model {} from {:?}", settings.model, cache_dir);

        let options = InitOptions::new(model)
            .with_cache_dir(cache_dir)
            .with_show_download_progress(settings.show_download_progress);

        let embedding = TextEmbedding::try_new(options).map_err(|e| {
            TubeQaError::Embedding(format!("Failed to load {}: {}", settings.model, e))
        })?;

        Ok(Self {
            model: Arc::new(Mutex::new(embedding)),
            dimensions,
        })
    }
}

/// Map a configured model name to a fastembed model and its dimensions.
fn resolve_model(name: &str) -> Result<(EmbeddingModel, usize)> {
    let short = name.rsplit('/').next().unwrap_or(name).to_lowercase();
    match short.as_str() {
        "all-minilm-l6-v2" => Ok((EmbeddingModel::AllMiniLML6V2, 384)),
        "all-minilm-l12-v2" => Ok((EmbeddingModel::AllMiniLML12V2, 384)),
        "bge-small-en-v1.5" => Ok((EmbeddingModel::BGESmallENV15, 384)),
        "bge-base-en-v1.5" => Ok((EmbeddingModel::BGEBaseENV15, 768)),
        _ => Err(TubeQaError::Config(format!(
            "Unsupported embedding model: {}",
            name
        ))),
    }
}

#[async_trait]
impl Embedder for FastEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| TubeQaError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let model = self.model.clone();
        let input = texts.to_vec();
        let embeddings = tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| TubeQaError::Embedding("Embedding model lock poisoned".to_string()))?;
            model
                .embed(input, Some(BATCH_SIZE))
                .map_err(|e| TubeQaError::Embedding(e.to_string()))
        })
        .await
        .map_err(|e| TubeQaError::Embedding(format!("Embedding task failed: {}", e)))??;

        debug!("Generated {} embeddings", embeddings.len());
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_model_names() {
        let (_, dims) = resolve_model("sentence-transformers/all-MiniLM-L6-v2").unwrap();
        assert_eq!(dims, 384);

        let (_, dims) = resolve_model("all-MiniLM-L6-v2").unwrap();
        assert_eq!(dims, 384);

        let (_, dims) = resolve_model("BAAI/bge-base-en-v1.5").unwrap();
        assert_eq!(dims, 768);
    }

    #[test]
    fn test_unknown_model_is_config_error() {
        assert!(matches!(
            resolve_model("openai/text-embedding-3-small"),
            Err(TubeQaError::Config(_))
        ));
    }
}
