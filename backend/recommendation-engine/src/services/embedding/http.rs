// ============================================
// HTTP Embedding Provider
// ============================================
//
// Talks to any OpenAI-compatible `/embeddings` endpoint, e.g. a local
// sentence-transformers server hosting all-MiniLM-L6-v2.

use super::{EmbeddingError, EmbeddingProvider, Result};
use crate::config::EmbeddingConfig;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub struct HttpEmbeddingProvider {
    client: HttpClient,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpEmbeddingProvider {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbeddingError::Unavailable(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: model.to_string(),
            api_key,
        })
    }

    /// Build from configuration. Returns `None` when no endpoint is configured.
    pub fn from_config(config: &EmbeddingConfig) -> Option<Result<Self>> {
        config.url.as_deref().map(|url| {
            Self::new(
                url,
                &config.model,
                config.api_key.clone(),
                Duration::from_secs(config.timeout_secs),
            )
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

/// Order response vectors by their `index` field when the server supplies one.
fn into_ordered_vectors(response: EmbeddingResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
    let mut data = response.data;
    if data.len() != expected {
        return Err(EmbeddingError::MalformedResponse(format!(
            "expected {} embeddings, got {}",
            expected,
            data.len()
        )));
    }

    if data.iter().all(|d| d.index.is_some()) {
        data.sort_by_key(|d| d.index);
        if data.iter().enumerate().any(|(i, d)| d.index != Some(i)) {
            return Err(EmbeddingError::MalformedResponse(
                "embedding indices are not contiguous".to_string(),
            ));
        }
    }

    Ok(data.into_iter().map(|d| d.embedding).collect())
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| EmbeddingError::RequestFailed(format!("Embedding API error: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::RequestFailed(format!(
                "Embedding API returned {}: {}",
                status, error_text
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::MalformedResponse(format!("Parse error: {}", e)))?;

        debug!(
            model = %self.model,
            count = result.data.len(),
            "Embedding batch received"
        );

        into_ordered_vectors(result, texts.len())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
