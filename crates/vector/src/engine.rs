use newsseek_common::{AppConfig, NewsSeekError, Result};
use newsseek_embedding::EmbeddingProvider;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::similarity::distance_to_similarity;
use crate::store::VectorStore;
use crate::types::{CandidateResult, SearchHit, StoreStats};

/// Retrieval tuning knobs
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    /// Candidates fetched from the store before filtering
    pub max_candidates: usize,

    /// Candidates at or beyond this distance are dropped
    pub distance_threshold: f32,

    /// Maximum results returned
    pub max_results: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_candidates: 30,
            distance_threshold: 1.3,
            max_results: 10,
        }
    }
}

impl SearchSettings {
    /// Settings from application configuration
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_candidates: config.max_candidates,
            distance_threshold: config.distance_threshold,
            max_results: config.max_results,
        }
    }

    /// Lowest similarity a result can have under the distance threshold
    pub fn min_similarity(&self) -> f32 {
        distance_to_similarity(self.distance_threshold)
    }
}

/// Number of candidates to request for a store of `total` records
///
/// Falls back to 1 on an empty store so the request is never zero-sized.
pub fn candidate_count(total: usize, max_candidates: usize) -> usize {
    if total > 0 {
        max_candidates.min(total)
    } else {
        1
    }
}

/// Filter and cap nearest-first candidates
///
/// Keeps candidates strictly under the distance threshold and truncates to
/// `max_results`, preserving order.
pub fn rank_candidates(candidates: Vec<CandidateResult>, settings: &SearchSettings) -> Vec<SearchHit> {
    candidates
        .into_iter()
        .filter(|c| c.distance < settings.distance_threshold)
        .take(settings.max_results)
        .map(|c| SearchHit {
            similarity: distance_to_similarity(c.distance),
            distance: c.distance,
            document: c.document,
        })
        .collect()
}

/// Semantic query engine over one collection
pub struct QueryEngine {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<VectorStore>,
    settings: SearchSettings,
}

impl QueryEngine {
    /// Create a query engine
    ///
    /// Fails if the collection was built with a different model or dimension.
    pub async fn new(
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<VectorStore>,
        settings: SearchSettings,
    ) -> Result<Self> {
        store
            .check_embedding(provider.model_name(), provider.dimension())
            .await?;

        info!(
            "Query engine ready - model: {}, candidates: {}, threshold: {}, max results: {}",
            provider.model_name(),
            settings.max_candidates,
            settings.distance_threshold,
            settings.max_results
        );

        Ok(Self {
            provider,
            store,
            settings,
        })
    }

    /// Active settings
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Collection statistics
    pub async fn stats(&self) -> StoreStats {
        self.store.stats().await
    }

    /// Fail with `NotReady` unless the collection holds documents
    pub async fn ensure_ready(&self) -> Result<usize> {
        match self.store.count().await {
            0 => Err(NewsSeekError::not_ready(
                "the news collection is empty; run ingestion first",
            )),
            count => Ok(count),
        }
    }

    /// Search for news articles similar to `query`
    ///
    /// Results are nearest first, all under the distance threshold, at most
    /// `max_results` long. An empty collection yields an empty list.
    /// The query is embedded exactly as given. A query whose embedding is the
    /// zero vector carries no signal and matches nothing.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Err(NewsSeekError::invalid_input("Query cannot be empty"));
        }

        let total = self.store.count().await;
        if total == 0 {
            warn!("Search on empty collection");
        }

        let query_embedding = self.provider.embed_query(query).await?;
        if query_embedding.iter().all(|x| *x == 0.0) {
            info!("Query {:?} has no embeddable content; no results", query);
            return Ok(Vec::new());
        }

        let k = candidate_count(total, self.settings.max_candidates);
        debug!("Searching for: {:?} (candidates={}, total={})", query, k, total);

        let candidates = self.store.query(&query_embedding, k).await?;
        let fetched = candidates.len();
        let hits = rank_candidates(candidates, &self.settings);

        info!(
            "Search completed - {} results (filtered from {} candidates)",
            hits.len(),
            fetched
        );
        Ok(hits)
    }
}
