//! HTTP embedding provider for OpenAI-style `/embeddings` endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::EmbeddingProvider;
use crate::types::PipelineError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Calls an OpenAI-compatible embeddings endpoint.
///
/// The same provider instance (same endpoint, same model) must be used at
/// index time and query time.
#[derive(Debug, Clone)]
pub struct HttpEmbeddingProvider {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    dims: usize,
    timeout: Duration,
}

impl HttpEmbeddingProvider {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, dims: usize) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: None,
            dims,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = self.client.post(&self.endpoint).json(&EmbeddingsRequest {
            model: &self.model,
            input: texts,
        });
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        // The deadline covers the body read as well: a collaborator that
        // sends headers and then stalls must still trip the timeout.
        let call = async {
            let response = request
                .send()
                .await?
                .error_for_status()
                .map_err(|err| PipelineError::Index(err.to_string()))?;
            response
                .json::<EmbeddingsResponse>()
                .await
                .map_err(|err| PipelineError::Index(format!("malformed embeddings response: {err}")))
        };
        let mut body = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| PipelineError::Timeout {
                service: "embedding",
                secs: self.timeout.as_secs(),
            })??;
        if body.data.len() != texts.len() {
            return Err(PipelineError::Index(format!(
                "embedding endpoint returned {} vectors for {} inputs",
                body.data.len(),
                texts.len()
            )));
        }

        // Responses may arrive out of order; the index field is contractual.
        body.data.sort_by_key(|row| row.index);
        debug!(inputs = texts.len(), "embedded batch");
        Ok(body.data.into_iter().map(|row| row.embedding).collect())
    }
}
