//! Hash embeddings (xf-style)
//!
//! Implements FNV-1a based hash embeddings for semantic similarity.
//! No ML model dependencies - fully deterministic. Input is truncated to a
//! fixed token budget before hashing so long judgments embed the same way
//! every time.

use std::sync::Arc;

use unicode_normalization::UnicodeNormalization;

use crate::config::SearchConfig;
use crate::error::{LgError, Result};
use crate::search::embeddings_api::ApiEmbedder;

/// Pluggable embedding backend interface
pub trait Embedder: Send + Sync {
    /// Map text to a vector of length [`Embedder::dims`].
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
    fn dims(&self) -> usize;
    fn name(&self) -> &str;
}

/// Build an embedder from search config.
pub fn build_embedder(config: &SearchConfig) -> Result<Arc<dyn Embedder>> {
    let backend = config.embedding_backend.trim().to_lowercase();
    let dims = config.embedding_dims as usize;
    if dims == 0 {
        return Err(LgError::Config(
            "search.embedding_dims must be greater than 0".to_string(),
        ));
    }
    let max_tokens = config.max_input_tokens as usize;

    match backend.as_str() {
        "" | "hash" => Ok(Arc::new(HashEmbedder::new(dims).with_max_tokens(max_tokens))),
        "api" => {
            let url = config.embedding_url.as_deref().ok_or_else(|| {
                LgError::MissingConfig(
                    "search.embedding_url is required for embedding_backend=api".to_string(),
                )
            })?;
            let embedder = ApiEmbedder::new(
                url,
                dims,
                max_tokens,
                std::time::Duration::from_millis(config.embedding_timeout_ms),
            )?;
            Ok(Arc::new(embedder))
        }
        other => Err(LgError::Config(format!(
            "unknown embedding backend: {other}"
        ))),
    }
}

/// Hash embedder using FNV-1a
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    /// Embedding dimension (default: 384)
    dim: usize,
    /// Tokens beyond this budget are ignored; `0` means unbounded
    max_tokens: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self {
            dim: 384,
            max_tokens: 512,
        }
    }
}

impl HashEmbedder {
    /// Create embedder with specified dimension
    #[must_use]
    pub const fn new(dim: usize) -> Self {
        Self {
            dim,
            max_tokens: 512,
        }
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Embed text into an L2-normalized vector
    #[must_use]
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        if self.dim == 0 {
            return Vec::new();
        }

        let mut tokens = tokenize(text);
        if self.max_tokens > 0 {
            tokens.truncate(self.max_tokens);
        }
        let mut embedding = vec![0.0; self.dim];

        if tokens.is_empty() {
            return embedding;
        }

        for token in &tokens {
            accumulate_embedding(&mut embedding, token, 1.0);
        }

        for window in tokens.windows(2) {
            let bigram = format!("{} {}", window[0], window[1]);
            accumulate_embedding(&mut embedding, &bigram, 0.5);
        }

        l2_normalize(&mut embedding);
        embedding
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    fn dims(&self) -> usize {
        self.dim
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Compute cosine similarity between two embeddings
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Keep the first `max_tokens` whitespace-delimited tokens of `text`.
///
/// Used by remote backends, which tokenize on their side; `0` keeps everything.
#[must_use]
pub fn truncate_tokens(text: &str, max_tokens: usize) -> String {
    if max_tokens == 0 {
        return text.trim().to_string();
    }
    text.split_whitespace()
        .take(max_tokens)
        .collect::<Vec<_>>()
        .join(" ")
}

fn tokenize(text: &str) -> Vec<String> {
    let normalized: String = text.nfkc().collect::<String>().to_lowercase();
    normalized
        .split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '&'))
        .filter(|token| token.chars().count() >= 2)
        .map(ToString::to_string)
        .collect()
}

fn accumulate_embedding(embedding: &mut [f32], token: &str, weight: f32) {
    let token_hash = fnv1a_hash(token.as_bytes());
    let len = embedding.len();

    for i in 0..len {
        let dim_hash = fnv1a_hash_with_salt(token_hash, i as u64);
        let sign = if dim_hash & 1 == 0 { weight } else { -weight };
        #[allow(clippy::cast_possible_truncation)]
        let dim = ((dim_hash >> 1) as usize) % len;
        embedding[dim] += sign;
    }
}

fn fnv1a_hash_with_salt(seed: u64, salt: u64) -> u64 {
    let mut bytes = [0u8; 16];
    bytes[..8].copy_from_slice(&seed.to_le_bytes());
    bytes[8..].copy_from_slice(&salt.to_le_bytes());
    fnv1a_hash(&bytes)
}

fn fnv1a_hash(data: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    let mut hash = FNV_OFFSET;
    for byte in data {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn l2_normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vec.iter_mut() {
            *value /= norm;
        }
    }
}
