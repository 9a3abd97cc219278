use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current on-disk manifest format
pub const MANIFEST_FORMAT_VERSION: u32 = 1;

/// News article metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsMetadata {
    /// Article subject (unmerged)
    pub subject: String,

    /// Publication date as found in the source
    pub news_date: String,

    /// News category
    pub news_type: String,
}

/// Stored document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Unique id within the collection
    pub id: String,

    /// Merged subject + content text that was embedded
    pub text: String,

    /// Normalized embedding
    pub embedding: Vec<f32>,

    /// Article metadata
    pub metadata: NewsMetadata,
}

impl DocumentRecord {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        embedding: Vec<f32>,
        metadata: NewsMetadata,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            embedding,
            metadata,
        }
    }
}

/// Nearest-neighbor candidate before thresholding
#[derive(Debug, Clone)]
pub struct CandidateResult {
    pub document: DocumentRecord,

    /// Euclidean distance to the query vector
    pub distance: f32,
}

/// Ranked search result
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub document: DocumentRecord,

    /// Cosine similarity derived from the distance
    pub similarity: f32,

    /// Euclidean distance to the query vector
    pub distance: f32,
}

/// One committed write batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    /// File name under `batches/`
    pub file: String,

    /// Records in the batch
    pub records: usize,

    /// SHA-256 of the batch file contents (hex)
    pub sha256: String,
}

/// Persisted collection manifest
///
/// Only batches listed here are part of the collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionManifest {
    pub format_version: u32,

    /// Collection name
    pub name: String,

    /// Model that produced the stored embeddings
    #[serde(default)]
    pub embedding_model: Option<String>,

    /// Embedding dimension
    #[serde(default)]
    pub dimension: Option<usize>,

    /// Total committed records
    pub record_count: usize,

    /// Committed batches in write order
    #[serde(default)]
    pub batches: Vec<BatchEntry>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl CollectionManifest {
    /// Create an empty manifest
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            format_version: MANIFEST_FORMAT_VERSION,
            name: name.into(),
            embedding_model: None,
            dimension: None,
            record_count: 0,
            batches: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Collection statistics
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub collection: String,
    pub embedding_model: Option<String>,
    pub dimension: Option<usize>,
    pub total_documents: usize,
    pub batches: usize,
    pub updated_at: DateTime<Utc>,
}
