//! Embedding collaborator: trait plus the HTTP client implementation.

use serde::Deserialize;

use crate::errors::{IndexError, IndexResult};

/// Produces embedding vectors for text.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_batch(&self, inputs: &[String]) -> IndexResult<Vec<Vec<f32>>>;

    async fn embed(&self, input: &str) -> IndexResult<Vec<f32>> {
        let mut vectors = self.embed_batch(&[input.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| IndexError::Embedding("embedding response missing vectors".to_string()))
    }
}

/// HTTP client for an Ollama-style `/api/embed` endpoint.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    base_url: String,
    model: String,
    batch_size: usize,
    client: reqwest::Client,
}

impl EmbeddingClient {
    pub fn new(base_url: &str, model: &str, batch_size: usize) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            batch_size: batch_size.max(1),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_settings(settings: &quill_core::IndexSettings) -> Self {
        Self::new(
            &settings.embedding_url,
            &settings.embedding_model,
            settings.embedding_batch,
        )
    }

    async fn request_batch(&self, inputs: &[String]) -> IndexResult<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.base_url);
        let body = EmbedRequest {
            model: self.model.clone(),
            input: inputs.to_vec(),
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| IndexError::Embedding(format!("embedding request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(IndexError::Embedding(format!(
                "embedding request failed: {status} {text}"
            )));
        }

        let payload: EmbedResponse = response
            .json()
            .await
            .map_err(|e| IndexError::Embedding(format!("embedding response unreadable: {e}")))?;

        if let Some(embeddings) = payload.embeddings {
            return Ok(embeddings);
        }
        if let Some(embedding) = payload.embedding {
            return Ok(vec![embedding]);
        }

        Err(IndexError::Embedding(
            "embedding response missing vectors".to_string(),
        ))
    }
}

#[async_trait::async_trait]
impl Embedder for EmbeddingClient {
    async fn embed_batch(&self, inputs: &[String]) -> IndexResult<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = Vec::with_capacity(inputs.len());
        for batch in inputs.chunks(self.batch_size) {
            vectors.extend(self.request_batch(batch).await?);
        }

        if vectors.len() != inputs.len() {
            return Err(IndexError::Embedding(format!(
                "embedding count mismatch: sent {}, received {}",
                inputs.len(),
                vectors.len()
            )));
        }

        Ok(vectors)
    }
}

#[derive(Debug, Clone, serde::Serialize)]
struct EmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbedResponse {
    embeddings: Option<Vec<Vec<f32>>>,
    embedding: Option<Vec<f32>>,
}
