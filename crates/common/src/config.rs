use crate::error::NewsSeekError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// newsseek application configuration
///
/// Ingestion and query share one configuration so both sides agree on the
/// store location, collection and embedding model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Vector store root directory
    pub store_path: PathBuf,

    /// Collection name inside the store
    pub collection_name: String,

    /// Embedding backend ("ollama" or "hash")
    pub embedding_provider: String,

    /// Embedding model name
    pub embedding_model: String,

    /// Ollama API base URL
    pub ollama_base_url: String,

    /// Texts per embedding request
    pub embed_batch_size: usize,

    /// Output dimension of the hashing provider
    pub hash_dimension: usize,

    /// Records per store write batch
    pub write_batch_size: usize,

    /// Candidates fetched from the store before filtering
    pub max_candidates: usize,

    /// Results at or beyond this distance are dropped
    pub distance_threshold: f32,

    /// Maximum results returned per query
    pub max_results: usize,

    /// Server bind address
    pub server_host: String,

    /// Server port
    pub server_port: u16,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("./vector_storage"),
            collection_name: "tsmc_news".to_string(),
            embedding_provider: "ollama".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            embed_batch_size: 32,
            hash_dimension: 384,
            write_batch_size: 1000,
            max_candidates: 30,
            distance_threshold: 1.3,
            max_results: 10,
            server_host: "127.0.0.1".to_string(),
            server_port: 8000,
            log_dir: PathBuf::from("./log"),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self, NewsSeekError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        let defaults = Self::default();
        let config = Self {
            store_path: Self::get_env_path("STORE_PATH").unwrap_or(defaults.store_path),
            collection_name: std::env::var("COLLECTION_NAME")
                .unwrap_or(defaults.collection_name),
            embedding_provider: std::env::var("EMBEDDING_PROVIDER")
                .unwrap_or(defaults.embedding_provider),
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or(defaults.embedding_model),
            ollama_base_url: std::env::var("OLLAMA_BASE_URL")
                .unwrap_or(defaults.ollama_base_url),
            embed_batch_size: Self::get_env_parsed("EMBED_BATCH_SIZE")?
                .unwrap_or(defaults.embed_batch_size),
            hash_dimension: Self::get_env_parsed("HASH_DIMENSION")?
                .unwrap_or(defaults.hash_dimension),
            write_batch_size: Self::get_env_parsed("WRITE_BATCH_SIZE")?
                .unwrap_or(defaults.write_batch_size),
            max_candidates: Self::get_env_parsed("MAX_CANDIDATES")?
                .unwrap_or(defaults.max_candidates),
            distance_threshold: Self::get_env_parsed("DISTANCE_THRESHOLD")?
                .unwrap_or(defaults.distance_threshold),
            max_results: Self::get_env_parsed("MAX_RESULTS")?
                .unwrap_or(defaults.max_results),
            server_host: std::env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: Self::get_env_parsed("SERVER_PORT")?
                .unwrap_or(defaults.server_port),
            log_dir: Self::get_env_path("LOG_DIR").unwrap_or(defaults.log_dir),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
        };

        config.validate()?;
        config.ensure_directories()?;

        Ok(config)
    }

    /// Get PathBuf from environment variable
    fn get_env_path(key: &str) -> Option<PathBuf> {
        std::env::var(key).ok().map(PathBuf::from)
    }

    /// Parse an environment variable, rejecting malformed values
    fn get_env_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>, NewsSeekError> {
        match std::env::var(key) {
            Ok(raw) => raw.trim().parse().map(Some).map_err(|_| {
                NewsSeekError::config(format!("Invalid value for {}: {:?}", key, raw))
            }),
            Err(_) => Ok(None),
        }
    }

    /// Ensure required directories exist, create if not
    ///
    /// The store directory is left alone: only ingestion may create it.
    pub fn ensure_directories(&self) -> Result<(), NewsSeekError> {
        if !self.log_dir.exists() {
            std::fs::create_dir_all(&self.log_dir).map_err(|e| {
                NewsSeekError::config(format!(
                    "Failed to create directory {}: {}",
                    self.log_dir.display(),
                    e
                ))
            })?;
        }

        Ok(())
    }

    /// Directory holding the configured collection
    pub fn collection_path(&self) -> PathBuf {
        self.store_path.join(&self.collection_name)
    }

    /// Get log file path
    pub fn get_log_path(&self, filename: &str) -> PathBuf {
        self.log_dir.join(filename)
    }

    /// Get server bind address (host:port)
    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), NewsSeekError> {
        if self.collection_name.trim().is_empty() {
            return Err(NewsSeekError::config("Collection name cannot be empty"));
        }

        if self
            .collection_name
            .chars()
            .any(|c| c == '/' || c == '\\' || c == '.')
        {
            return Err(NewsSeekError::config(
                "Collection name cannot contain path separators or dots",
            ));
        }

        if self.embedding_model.trim().is_empty() {
            return Err(NewsSeekError::config("Embedding model name cannot be empty"));
        }

        match self.embedding_provider.as_str() {
            "ollama" => {
                if !self.ollama_base_url.starts_with("http://")
                    && !self.ollama_base_url.starts_with("https://")
                {
                    return Err(NewsSeekError::config(
                        "Ollama base URL must start with http:// or https://",
                    ));
                }
            }
            "hash" => {
                if self.hash_dimension == 0 {
                    return Err(NewsSeekError::config("Hash dimension cannot be 0"));
                }
            }
            other => {
                return Err(NewsSeekError::config(format!(
                    "Unknown embedding provider '{}' (expected 'ollama' or 'hash')",
                    other
                )));
            }
        }

        if self.embed_batch_size == 0 || self.write_batch_size == 0 {
            return Err(NewsSeekError::config("Batch sizes cannot be 0"));
        }

        if self.max_candidates == 0 || self.max_results == 0 {
            return Err(NewsSeekError::config(
                "max_candidates and max_results must be at least 1",
            ));
        }

        if !(self.distance_threshold.is_finite() && self.distance_threshold > 0.0) {
            return Err(NewsSeekError::config(
                "Distance threshold must be a positive number",
            ));
        }

        if self.server_port == 0 {
            return Err(NewsSeekError::config("Server port cannot be 0"));
        }

        Ok(())
    }
}
