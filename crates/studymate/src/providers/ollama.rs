//! Ollama embedding provider

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Embeddings from a local Ollama server
pub struct OllamaEmbedder {
    /// HTTP client
    client: Client,
    /// Ollama base URL without trailing slash
    base_url: String,
    /// Embedding model name
    model: String,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let request = EmbedRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                Error::embedding(format!(
                    "Embedding request to {} failed: {} (is Ollama running?)",
                    self.base_url, e
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::embedding(format!(
                "Embedding failed with model '{}': HTTP {} - {}",
                self.model, status, body
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("Failed to parse embedding response: {}", e)))?;

        if embed_response.embedding.is_empty() {
            return Err(Error::embedding(format!(
                "Model '{}' returned an empty embedding",
                self.model
            )));
        }

        Ok(embed_response.embedding)
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> EmbeddingConfig {
        EmbeddingConfig {
            base_url: format!("{}/", server.uri()),
            model: "nomic-embed-text".to_string(),
            ..EmbeddingConfig::default()
        }
    }

    #[tokio::test]
    async fn test_embed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .and(body_json(serde_json::json!({
                "model": "nomic-embed-text",
                "prompt": "photosynthesis"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embedding": [0.1, 0.2, 0.3]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let embedder = OllamaEmbedder::new(&config_for(&server)).unwrap();
        let vector = embedder.embed("photosynthesis").await.unwrap();

        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
        assert_eq!(embedder.model(), "nomic-embed-text");
    }

    #[tokio::test]
    async fn test_embed_batch_keeps_order() {
        let server = MockServer::start().await;
        for (prompt, value) in [("a", 1.0), ("b", 2.0)] {
            Mock::given(method("POST"))
                .and(path("/api/embeddings"))
                .and(body_json(serde_json::json!({ "model": "nomic-embed-text", "prompt": prompt })))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(serde_json::json!({ "embedding": [value] })),
                )
                .mount(&server)
                .await;
        }

        let embedder = OllamaEmbedder::new(&config_for(&server)).unwrap();
        let vectors = embedder
            .embed_batch(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        assert_eq!(vectors, vec![vec![1.0], vec![2.0]]);
    }

    #[tokio::test]
    async fn test_unknown_model_is_embedding_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let embedder = OllamaEmbedder::new(&config_for(&server)).unwrap();
        let err = embedder.embed("x").await.unwrap_err();

        assert!(matches!(err, Error::Embedding(ref msg) if msg.contains("model not found")));
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        let config = EmbeddingConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..EmbeddingConfig::default()
        };
        let embedder = OllamaEmbedder::new(&config).unwrap();
        assert!(!embedder.health_check().await.unwrap());
    }
}
