use async_trait::async_trait;
use newsseek_common::{NewsSeekError, Result};

/// Common trait for embedding backends
///
/// Every implementation returns one vector per input text, all of the same
/// dimension. With `normalize` set, non-zero vectors have unit L2 norm so
/// that Euclidean distance and cosine similarity are interchangeable:
/// `cosine = 1 - distance² / 2`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts
    async fn embed(&self, texts: &[String], normalize: bool) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query text, always normalized
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()], true)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| NewsSeekError::provider("Empty embedding response for query"))
    }

    /// Output dimension
    fn dimension(&self) -> usize;

    /// Model identifier persisted alongside the store
    fn model_name(&self) -> &str;
}

/// Scale a vector to unit length in place
///
/// Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 1e-12 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// Check that a backend returned one vector per input with the expected dimension
pub(crate) fn check_embeddings(
    embeddings: &[Vec<f32>],
    expected_count: usize,
    dimension: usize,
) -> Result<()> {
    if embeddings.len() != expected_count {
        return Err(NewsSeekError::provider(format!(
            "Expected {} embeddings, got {}",
            expected_count,
            embeddings.len()
        )));
    }

    if let Some((idx, bad)) = embeddings
        .iter()
        .enumerate()
        .find(|(_, e)| e.len() != dimension)
    {
        return Err(NewsSeekError::provider(format!(
            "Embedding {} has dimension {}, expected {}",
            idx,
            bad.len(),
            dimension
        )));
    }

    if embeddings.iter().flatten().any(|x| !x.is_finite()) {
        return Err(NewsSeekError::provider("Embedding contains non-finite values"));
    }

    Ok(())
}
