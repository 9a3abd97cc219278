use newsseek_common::{NewsSeekError, Result};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::types::{EmbedRequest, EmbedResponse};

/// Attempts per embedding request before giving up
const MAX_RETRIES: u32 = 3;

/// Ollama API client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    client: Client,
}

impl OllamaClient {
    /// Create new Ollama client
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(300)) // large batches on CPU are slow
            .build()
            .map_err(|e| NewsSeekError::provider(format!("Failed to create HTTP client: {}", e)))?;

        info!("Ollama client initialized: {}", base_url);
        Ok(Self { base_url, client })
    }

    /// Base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Test connection to Ollama
    pub async fn test_connection(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            NewsSeekError::provider(format!("Failed to connect to Ollama at {}: {}", self.base_url, e))
        })?;
        Ok(response.status().is_success())
    }

    /// Generate embeddings for a batch of texts (with retry logic)
    pub async fn embed_batch(&self, model: &str, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.embed_with_retry(model, texts, MAX_RETRIES).await
    }

    /// Generate embeddings with custom retry count
    async fn embed_with_retry(
        &self,
        model: &str,
        texts: &[String],
        max_retries: u32,
    ) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.base_url);

        debug!("Generating embeddings - Model: {}, Batch: {}", model, texts.len());

        let request = EmbedRequest {
            model: model.to_string(),
            input: texts.to_vec(),
            truncate: Some(true),
        };

        let mut last_error = None;

        for attempt in 1..=max_retries {
            match self.try_embed(&url, &request).await {
                Ok(embeddings) => {
                    debug!(
                        "Received {} embeddings - Dimension: {}",
                        embeddings.len(),
                        embeddings.first().map(Vec::len).unwrap_or(0)
                    );
                    return Ok(embeddings);
                }
                Err(e) => {
                    if attempt < max_retries {
                        let delay = std::time::Duration::from_secs(2u64.pow(attempt - 1));
                        warn!(
                            "Embedding request failed (attempt {}/{}): {}. Retrying in {:?}...",
                            attempt, max_retries, e, delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| NewsSeekError::provider("All retries failed")))
    }

    /// Single attempt to generate embeddings
    async fn try_embed(&self, url: &str, request: &EmbedRequest) -> Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| NewsSeekError::provider(format!("Failed to send embedding request: {}", e)))?
            .error_for_status()
            .map_err(|e| NewsSeekError::provider(format!("Ollama embedding API error: {}", e)))?;

        let result: EmbedResponse = response.json().await.map_err(|e| {
            NewsSeekError::provider(format!("Failed to parse embedding response: {}", e))
        })?;

        if result.embeddings.is_empty() && !request.input.is_empty() {
            return Err(NewsSeekError::provider("Empty embedding from Ollama"));
        }

        Ok(result.embeddings)
    }
}
