use newsseek_common::{AppConfig, NewsSeekError, Result};
use std::sync::Arc;
use tracing::info;

use crate::hashing::HashEmbedder;
use crate::ollama::OllamaEmbedder;
use crate::provider::EmbeddingProvider;

/// Build the embedding provider selected by the configuration
///
/// This is the expensive "model loading" step; callers are expected to do
/// it once per process and share the result.
pub async fn load_provider(config: &AppConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    info!(
        "Loading embedding provider: {} (model: {})",
        config.embedding_provider, config.embedding_model
    );

    match config.embedding_provider.as_str() {
        "ollama" => {
            let embedder = OllamaEmbedder::load(
                config.ollama_base_url.clone(),
                config.embedding_model.clone(),
                config.embed_batch_size,
            )
            .await?;
            Ok(Arc::new(embedder))
        }
        "hash" => Ok(Arc::new(HashEmbedder::new(config.hash_dimension)?)),
        other => Err(NewsSeekError::provider(format!(
            "Unknown embedding provider: {}",
            other
        ))),
    }
}
