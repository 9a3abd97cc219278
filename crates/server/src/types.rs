use chrono::{DateTime, Utc};
use newsseek_vector::SearchHit;
use serde::{Deserialize, Serialize};

/// Search query
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search query text
    #[serde(default)]
    pub q: String,
}

/// One ranked article
#[derive(Debug, Serialize)]
pub struct SearchResultItem {
    pub id: String,
    pub subject: String,
    pub news_date: String,
    pub news_type: String,

    /// Stored text (subject, blank line, content)
    pub text: String,

    pub similarity: f32,
    pub distance: f32,
}

impl From<SearchHit> for SearchResultItem {
    fn from(hit: SearchHit) -> Self {
        let doc = hit.document;
        Self {
            id: doc.id,
            subject: doc.metadata.subject,
            news_date: doc.metadata.news_date,
            news_type: doc.metadata.news_type,
            text: doc.text,
            similarity: hit.similarity,
            distance: hit.distance,
        }
    }
}

/// Search response
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub count: usize,
    pub results: Vec<SearchResultItem>,
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error kind
    pub error: String,

    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}
