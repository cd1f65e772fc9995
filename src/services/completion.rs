//! Text generation via OpenAI-style chat completion endpoints.
//!
//! Decoding is pinned to temperature zero: the answer must be a
//! deterministic function of the grounding prompt.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::CompletionProvider;
use crate::types::PipelineError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Calls an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct HttpCompletionProvider {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpCompletionProvider {
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
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[async_trait]
impl CompletionProvider for HttpCompletionProvider {
    async fn complete(&self, prompt: &str) -> Result<String, PipelineError> {
        let mut request = self.client.post(&self.endpoint).json(&ChatRequest {
            model: &self.model,
            temperature: 0.0,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
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
                .map_err(|err| PipelineError::Generation(err.to_string()))?;
            response.json::<ChatResponse>().await.map_err(|err| {
                PipelineError::Generation(format!("malformed completion response: {err}"))
            })
        };
        let body = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| PipelineError::Timeout {
                service: "generation",
                secs: self.timeout.as_secs(),
            })??;
        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| PipelineError::Generation("completion returned no choices".into()))
    }
}

/// Completion provider that always returns a fixed answer. Used by tests
/// and the demo binary.
#[derive(Debug, Clone)]
pub struct StaticCompletionProvider {
    response: String,
}

impl StaticCompletionProvider {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl CompletionProvider for StaticCompletionProvider {
    async fn complete(&self, _prompt: &str) -> Result<String, PipelineError> {
        Ok(self.response.clone())
    }
}
