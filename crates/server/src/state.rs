use newsseek_common::{AppConfig, NewsSeekError, Result};
use newsseek_embedding::{load_provider, EmbeddingProvider};
use newsseek_vector::{QueryEngine, SearchSettings, VectorStore};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

/// Shared application state
///
/// The provider and the query engine are loaded on first use and kept for
/// the life of the process. A failed load is retried on the next request.
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    provider: OnceCell<Arc<dyn EmbeddingProvider>>,
    engine: OnceCell<Arc<QueryEngine>>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            provider: OnceCell::new(),
            engine: OnceCell::new(),
        }
    }

    /// State with an already loaded provider
    pub fn with_provider(config: AppConfig, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            config,
            provider: OnceCell::new_with(Some(provider)),
            engine: OnceCell::new(),
        }
    }

    /// Embedding provider, loaded once
    pub async fn provider(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        self.provider
            .get_or_try_init(|| load_provider(&self.config))
            .await
            .cloned()
    }

    /// Query engine over the configured collection, opened once
    ///
    /// An absent collection is `StoreUnavailable` and an empty one is
    /// `NotReady`; neither is cached, so a later ingestion is picked up.
    pub async fn engine(&self) -> Result<Arc<QueryEngine>> {
        self.engine
            .get_or_try_init(|| async {
                let provider = self.provider().await?;
                let store = VectorStore::open(&self.config.store_path, &self.config.collection_name)
                    .await?
                    .with_write_batch_size(self.config.write_batch_size);
                if store.count().await == 0 {
                    return Err(NewsSeekError::not_ready(
                        "the news collection is empty; run ingestion first",
                    ));
                }
                let engine = QueryEngine::new(
                    provider,
                    Arc::new(store),
                    SearchSettings::from_config(&self.config),
                )
                .await?;
                info!("Collection '{}' opened for search", self.config.collection_name);
                Ok::<_, NewsSeekError>(Arc::new(engine))
            })
            .await
            .cloned()
    }
}
