//! Passage reranking: a second, more precise relevance pass over the small
//! candidate set surfaced by vector search.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Passage, Reranker, ScoredPassage};
use crate::types::PipelineError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Calls a Cohere-style `/rerank` endpoint.
#[derive(Debug, Clone)]
pub struct HttpReranker {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpReranker {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: None,
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
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: Vec<&'a str>,
    top_n: usize,
}

#[derive(Deserialize)]
struct RerankResponse {
    results: Vec<RerankRow>,
}

#[derive(Deserialize)]
struct RerankRow {
    index: usize,
    relevance_score: f32,
}

#[async_trait]
impl Reranker for HttpReranker {
    async fn rerank(
        &self,
        query: &str,
        passages: Vec<Passage>,
    ) -> Result<Vec<ScoredPassage>, PipelineError> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }

        let documents: Vec<&str> = passages.iter().map(|p| p.text.as_str()).collect();
        let mut request = self.client.post(&self.endpoint).json(&RerankRequest {
            model: &self.model,
            query,
            top_n: documents.len(),
            documents,
        });
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        // The deadline covers the body read as well, not just the headers.
        let call = async {
            let response = request
                .send()
                .await?
                .error_for_status()
                .map_err(|err| PipelineError::Rerank(err.to_string()))?;
            response
                .json::<RerankResponse>()
                .await
                .map_err(|err| PipelineError::Rerank(format!("malformed rerank response: {err}")))
        };
        let body = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| PipelineError::Timeout {
                service: "rerank",
                secs: self.timeout.as_secs(),
            })??;

        let mut scored = Vec::with_capacity(body.results.len());
        for row in body.results {
            let passage = passages.get(row.index).cloned().ok_or_else(|| {
                PipelineError::Rerank(format!("rerank result index {} out of range", row.index))
            })?;
            scored.push(ScoredPassage {
                passage,
                score: row.relevance_score,
            });
        }
        // Endpoints return results ranked already; keep the order honest.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(scored)
    }
}

/// Local reranker scoring passages by query-term overlap.
///
/// Deterministic and dependency-free: the score is the fraction of distinct
/// query terms that appear in the passage. Ties keep the incoming order.
#[derive(Debug, Clone, Default)]
pub struct LexicalOverlapReranker;

impl LexicalOverlapReranker {
    pub fn new() -> Self {
        Self
    }

    fn score(query_terms: &HashSet<String>, text: &str) -> f32 {
        if query_terms.is_empty() {
            return 0.0;
        }
        let text = text.to_lowercase();
        let hits = query_terms
            .iter()
            .filter(|term| text.contains(term.as_str()))
            .count();
        hits as f32 / query_terms.len() as f32
    }
}

#[async_trait]
impl Reranker for LexicalOverlapReranker {
    async fn rerank(
        &self,
        query: &str,
        passages: Vec<Passage>,
    ) -> Result<Vec<ScoredPassage>, PipelineError> {
        let query_terms: HashSet<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let mut scored: Vec<ScoredPassage> = passages
            .into_iter()
            .map(|passage| {
                let score = Self::score(&query_terms, &passage.text);
                ScoredPassage { passage, score }
            })
            .collect();
        // Stable sort keeps first-seen order for equal scores.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(scored)
    }
}
