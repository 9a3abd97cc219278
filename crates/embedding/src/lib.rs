//! newsseek embedding providers
//!
//! Ollama-backed model embeddings and an offline feature-hashing fallback

mod client;
mod hashing;
mod loader;
mod ollama;
mod provider;
mod types;

pub use client::OllamaClient;
pub use hashing::{tokenize, HashEmbedder, HASH_MODEL_NAME};
pub use loader::load_provider;
pub use ollama::OllamaEmbedder;
pub use provider::{l2_normalize, EmbeddingProvider};
pub use types::{EmbedRequest, EmbedResponse};
