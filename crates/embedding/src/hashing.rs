//! Deterministic feature-hashing embedder
//!
//! Maps each token to a bucket of a fixed-size vector using SHA-256, so it
//! needs no model download and no network. Useful for air-gapped runs and
//! for tests; retrieval quality is lexical rather than semantic.

use async_trait::async_trait;
use newsseek_common::{NewsSeekError, Result};
use sha2::{Digest, Sha256};

use crate::provider::{l2_normalize, EmbeddingProvider};

/// Model identifier recorded in the store manifest
pub const HASH_MODEL_NAME: &str = "feature-hash-v1";

/// Token feature-hashing embedding provider
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    /// Create a hashing embedder with the given output dimension
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(NewsSeekError::provider("Hash embedder dimension must be > 0"));
        }
        Ok(Self { dimension })
    }

    /// Embed one text without normalization
    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in tokenize(text) {
            vector[self.bucket(&token)] += 1.0;
        }
        vector
    }

    fn bucket(&self, token: &str) -> usize {
        let digest = Sha256::digest(token.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(prefix) % self.dimension as u64) as usize
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, texts: &[String], normalize: bool) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut vector = self.embed_one(text);
                if normalize {
                    l2_normalize(&mut vector);
                }
                vector
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        HASH_MODEL_NAME
    }
}

/// Lowercased word tokens; CJK, kana and hangul characters are single tokens
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        if is_ideographic(ch) {
            flush(&mut current, &mut tokens);
            tokens.push(ch.to_string());
        } else if ch.is_alphanumeric() {
            current.extend(ch.to_lowercase());
        } else {
            flush(&mut current, &mut tokens);
        }
    }
    flush(&mut current, &mut tokens);

    tokens
}

fn flush(current: &mut String, tokens: &mut Vec<String>) {
    if !current.is_empty() {
        tokens.push(std::mem::take(current));
    }
}

fn is_ideographic(ch: char) -> bool {
    matches!(ch,
        '\u{3040}'..='\u{30FF}'   // hiragana, katakana
        | '\u{3400}'..='\u{4DBF}' // CJK extension A
        | '\u{4E00}'..='\u{9FFF}' // CJK unified
        | '\u{AC00}'..='\u{D7AF}' // hangul syllables
        | '\u{F900}'..='\u{FAFF}' // CJK compatibility
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Fab Expansion, 2024!"), vec!["fab", "expansion", "2024"]);
        assert_eq!(tokenize("台積電 news"), vec!["台", "積", "電", "news"]);
        assert!(tokenize("  \n\n ").is_empty());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(HashEmbedder::new(0).is_err());
    }

    #[tokio::test]
    async fn test_deterministic_and_normalized() {
        let embedder = HashEmbedder::new(64).unwrap();
        let texts = vec!["fab expansion".to_string(), "fab expansion".to_string()];
        let out = embedder.embed(&texts, true).await.unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].len(), 64);
        assert_eq!(out[0], out[1]);
        assert!((norm(&out[0]) - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_unnormalized_counts_tokens() {
        let embedder = HashEmbedder::new(128).unwrap();
        let out = embedder.embed(&["a a a".to_string()], false).await.unwrap();
        assert!((out[0].iter().sum::<f32>() - 3.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let embedder = HashEmbedder::new(16).unwrap();
        let out = embedder.embed_query("").await.unwrap();
        assert_eq!(out.len(), 16);
        assert!(out.iter().all(|x| *x == 0.0));
    }
}
