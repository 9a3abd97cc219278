//! newsseek vector store and query engine
//!
//! Flat persisted collection of embedded news articles with exact
//! nearest-neighbor search, thresholding and ranking

mod engine;
mod similarity;
mod store;
mod types;

pub use engine::{candidate_count, rank_candidates, QueryEngine, SearchSettings};
pub use similarity::{cosine_similarity, distance_to_similarity, euclidean_distance};
pub use store::{VectorStore, DEFAULT_WRITE_BATCH_SIZE};
pub use types::{
    BatchEntry, CandidateResult, CollectionManifest, DocumentRecord, NewsMetadata, SearchHit,
    StoreStats,
};
