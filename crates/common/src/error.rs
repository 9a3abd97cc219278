/// newsseek error types
#[derive(Debug, thiserror::Error)]
pub enum NewsSeekError {
    /// Embedding model could not be loaded or failed to compute
    #[error("Embedding provider error: {0}")]
    Provider(String),

    /// Required input columns are absent
    #[error("Schema error: missing required fields {missing:?}")]
    Schema { missing: Vec<String> },

    /// Record id already present in the collection
    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    /// Persisted store is missing or corrupt
    #[error("Vector store unavailable: {0}")]
    StoreUnavailable(String),

    /// Query attempted before the store was populated
    #[error("Not ready: {0}")]
    NotReady(String),

    /// Ingestion failed after some batches were already committed
    #[error(
        "Partial write: {committed_records}/{total_records} records in {committed_batches} batches committed before failure: {reason}"
    )]
    PartialWrite {
        committed_batches: usize,
        committed_records: usize,
        total_records: usize,
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General error (anyhow integration)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NewsSeekError {
    /// Create provider error
    pub fn provider<S: Into<String>>(msg: S) -> Self {
        Self::Provider(msg.into())
    }

    /// Create schema error from the list of missing field names
    pub fn schema<I, S>(missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Schema {
            missing: missing.into_iter().map(Into::into).collect(),
        }
    }

    /// Create duplicate id error
    pub fn duplicate_id<S: Into<String>>(id: S) -> Self {
        Self::DuplicateId(id.into())
    }

    /// Create store unavailable error
    pub fn store_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    /// Create not ready error
    pub fn not_ready<S: Into<String>>(msg: S) -> Self {
        Self::NotReady(msg.into())
    }

    /// Create config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether running ingestion can resolve this error
    pub fn is_recoverable_by_ingest(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::NotReady(_))
    }
}

// HTTP response conversion
impl NewsSeekError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::Schema { .. } => 400,
            Self::Json(_) => 400,
            Self::DuplicateId(_) => 409,
            Self::Provider(_) => 502,
            Self::StoreUnavailable(_) => 503,
            Self::NotReady(_) => 503,
            Self::PartialWrite { .. } => 500,
            Self::Config(_) => 500,
            Self::Io(_) => 500,
            Self::Other(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_lists_fields() {
        let err = NewsSeekError::schema(["NEWS_TYPE"]);
        match &err {
            NewsSeekError::Schema { missing } => assert_eq!(missing, &vec!["NEWS_TYPE".to_string()]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("NEWS_TYPE"));
    }

    #[test]
    fn test_partial_write_message() {
        let err = NewsSeekError::PartialWrite {
            committed_batches: 2,
            committed_records: 2000,
            total_records: 2500,
            reason: "disk full".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("2000/2500"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(NewsSeekError::not_ready("empty").status_code(), 503);
        assert_eq!(NewsSeekError::store_unavailable("missing").status_code(), 503);
        assert_eq!(NewsSeekError::invalid_input("blank").status_code(), 400);
        assert_eq!(NewsSeekError::duplicate_id("doc_0").status_code(), 409);
    }

    #[test]
    fn test_recoverable_by_ingest() {
        assert!(NewsSeekError::not_ready("empty").is_recoverable_by_ingest());
        assert!(NewsSeekError::store_unavailable("missing").is_recoverable_by_ingest());
        assert!(!NewsSeekError::provider("oom").is_recoverable_by_ingest());
    }
}
