use serde::{Deserialize, Serialize};

/// Ollama batch embedding request (`/api/embed`)
#[derive(Debug, Clone, Serialize)]
pub struct EmbedRequest {
    /// Model name (e.g., "nomic-embed-text", "bge-m3")
    pub model: String,

    /// Texts to embed
    pub input: Vec<String>,

    /// Truncate inputs that exceed the model context instead of failing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncate: Option<bool>,
}

/// Ollama batch embedding response
#[derive(Debug, Clone, Deserialize)]
pub struct EmbedResponse {
    /// Model name
    #[serde(default)]
    pub model: Option<String>,

    /// One embedding per input, in request order
    #[serde(default)]
    pub embeddings: Vec<Vec<f32>>,
}
