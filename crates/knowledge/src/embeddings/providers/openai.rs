//! OpenAI embedding provider (`/v1/embeddings`).

use crate::embeddings::{EmbeddingConfig, EmbeddingProvider};
use async_trait::async_trait;
use docqa_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiProvider {
    pub fn new(
        config: &EmbeddingConfig,
        api_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout.unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)))
            .build()
            .map_err(|e| {
                AppError::EmbeddingService(format!("Failed to create HTTP client for OpenAI: {}", e))
            })?;

        let base_url = config
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_OPENAI_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), provider = "openai"))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/v1/embeddings", self.base_url);
        debug!("Sending {} texts to {}", texts.len(), url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| {
                AppError::EmbeddingService(format!("Failed to send request to OpenAI: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::EmbeddingService(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            AppError::EmbeddingService(format!("Failed to parse OpenAI response: {}", e))
        })?;

        into_vectors(body, texts.len())
    }
}

/// Place each returned embedding at its `index`; every input slot must be filled exactly once.
fn into_vectors(body: EmbeddingResponse, expected: usize) -> AppResult<Vec<Vec<f32>>> {
    if body.data.len() != expected {
        return Err(AppError::EmbeddingService(format!(
            "OpenAI returned {} embeddings for {} inputs",
            body.data.len(),
            expected
        )));
    }

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for item in body.data {
        let slot = slots.get_mut(item.index).ok_or_else(|| {
            AppError::EmbeddingService(format!(
                "OpenAI returned embedding index {} for {} inputs",
                item.index, expected
            ))
        })?;
        if slot.is_some() {
            return Err(AppError::EmbeddingService(format!(
                "OpenAI returned embedding index {} twice",
                item.index
            )));
        }
        *slot = Some(item.embedding);
    }

    // Counts match and no index repeats, so every slot is filled.
    Ok(slots.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_metadata() {
        let config = EmbeddingConfig {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            ..Default::default()
        };

        let provider = OpenAiProvider::new(&config, "sk-test", None).unwrap();
        assert_eq!(provider.provider_name(), "openai");
        assert_eq!(provider.model_name(), "text-embedding-3-small");
        assert_eq!(provider.dimensions(), 1536);
        assert_eq!(provider.base_url, "https://api.openai.com");
    }

    fn body(json: &str) -> EmbeddingResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_vectors_follow_input_order() {
        let response = body(
            r#"{"data":[{"index":2,"embedding":[0.75]},{"index":0,"embedding":[0.25]},{"index":1,"embedding":[0.5]}]}"#,
        );

        let vectors = into_vectors(response, 3).unwrap();
        assert_eq!(vectors, vec![vec![0.25], vec![0.5], vec![0.75]]);
    }

    #[test]
    fn test_too_few_vectors_rejected() {
        let response = body(r#"{"data":[{"index":0,"embedding":[0.25]}]}"#);

        match into_vectors(response, 2) {
            Err(AppError::EmbeddingService(msg)) => assert!(msg.contains("1 embeddings for 2 inputs")),
            other => panic!("expected embedding error, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let response = body(
            r#"{"data":[{"index":0,"embedding":[0.25]},{"index":0,"embedding":[0.5]}]}"#,
        );

        match into_vectors(response, 2) {
            Err(AppError::EmbeddingService(msg)) => assert!(msg.contains("twice")),
            other => panic!("expected embedding error, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let response = body(r#"{"data":[{"index":5,"embedding":[0.25]}]}"#);
        assert!(matches!(
            into_vectors(response, 1),
            Err(AppError::EmbeddingService(_))
        ));
    }
}
