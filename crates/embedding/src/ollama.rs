use async_trait::async_trait;
use newsseek_common::{NewsSeekError, Result};
use tracing::{debug, info};

use crate::client::OllamaClient;
use crate::provider::{check_embeddings, l2_normalize, EmbeddingProvider};

/// Text used to discover the model's output dimension at load time
const DIMENSION_PROBE: &str = "dimension probe";

/// Embedding provider backed by a local Ollama server
///
/// Ollama decides whether the model runs on a GPU; callers only see latency.
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
    dimension: usize,
    batch_size: usize,
}

impl OllamaEmbedder {
    /// Connect to Ollama and probe the model's output dimension
    ///
    /// Fails with a provider error if the server is unreachable or the model
    /// cannot produce an embedding.
    pub async fn load(
        base_url: impl Into<String>,
        model: impl Into<String>,
        batch_size: usize,
    ) -> Result<Self> {
        let client = OllamaClient::new(base_url)?;
        let model = model.into();

        if !client.test_connection().await? {
            return Err(NewsSeekError::provider(format!(
                "Ollama at {} did not answer the health check",
                client.base_url()
            )));
        }

        let probe = client
            .embed_batch(&model, &[DIMENSION_PROBE.to_string()])
            .await
            .map_err(|e| NewsSeekError::provider(format!("Failed to load model '{}': {}", model, e)))?;
        let dimension = probe.first().map(Vec::len).unwrap_or(0);
        if dimension == 0 {
            return Err(NewsSeekError::provider(format!(
                "Model '{}' returned an empty embedding",
                model
            )));
        }

        info!("Embedding model loaded - Model: {}, Dimension: {}", model, dimension);

        Ok(Self {
            client,
            model,
            dimension,
            batch_size: batch_size.max(1),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, texts: &[String], normalize: bool) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for (i, chunk) in texts.chunks(self.batch_size).enumerate() {
            debug!("Embedding sub-batch {} ({} texts)", i + 1, chunk.len());
            let mut batch = self.client.embed_batch(&self.model, chunk).await?;
            check_embeddings(&batch, chunk.len(), self.dimension)?;

            if normalize {
                batch.iter_mut().for_each(|e| l2_normalize(e));
            }
            embeddings.extend(batch);
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
