//! Remote embedding backend (HTTP JSON)
//!
//! Talks to a text-embeddings server that accepts
//! `{"inputs": ["..."], "truncate": true}` and answers with one vector per
//! input, e.g. a LegalBERT deployment behind `text-embeddings-inference`.
//!
//! ```toml
//! [search]
//! embedding_backend = "api"
//! embedding_url = "http://localhost:8080/embed"
//! embedding_dims = 768
//! ```

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use tracing::debug;

use crate::error::{LgError, Result};
use crate::search::embeddings::{Embedder, truncate_tokens};

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    inputs: [&'a str; 1],
    truncate: bool,
}

/// Embedder backed by an HTTP embedding service
#[derive(Debug)]
pub struct ApiEmbedder {
    client: Client,
    url: String,
    dims: usize,
    max_tokens: usize,
}

impl ApiEmbedder {
    /// Create a client for `url`; every request is bounded by `timeout`.
    pub fn new(url: &str, dims: usize, max_tokens: usize, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            dims,
            max_tokens,
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Embedder for ApiEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let input = truncate_tokens(text, self.max_tokens);
        debug!(url = %self.url, tokens = input.split_whitespace().count(), "requesting embedding");

        let response = self
            .client
            .post(&self.url)
            .json(&EmbedRequest {
                inputs: [input.as_str()],
                truncate: true,
            })
            .send()?
            .error_for_status()?;

        let mut vectors: Vec<Vec<f32>> = response.json()?;
        let vector = vectors.pop().ok_or_else(|| {
            LgError::BackendUnavailable("embedding service returned no vectors".to_string())
        })?;

        if vector.len() != self.dims {
            return Err(LgError::BackendUnavailable(format!(
                "embedding dims mismatch: expected {}, got {}",
                self.dims,
                vector.len()
            )));
        }
        Ok(vector)
    }

    fn dims(&self) -> usize {
        self.dims
    }

    fn name(&self) -> &str {
        "api"
    }
}
