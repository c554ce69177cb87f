use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub const OLLAMA_HOST: &str = "http://localhost:11434";
pub const EMBEDDING_MODEL: &str = "all-minilm";

/// Turns text into embedding vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    /// One embedding per input, in input order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| anyhow!("Embedding endpoint returned no vectors"))
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub host: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            host: OLLAMA_HOST.to_string(),
            model: EMBEDDING_MODEL.to_string(),
            api_key: None,
        }
    }
}

/// Embedder for the OpenAI `/v1/embeddings` protocol, also served by Ollama
pub struct OpenAiEmbedder {
    client: Client,
    config: EmbeddingConfig,
}

impl OpenAiEmbedder {
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/v1/embeddings", self.config.host.trim_end_matches('/'));
        let mut request = self.client.post(&url).json(&json!({
            "model": self.config.model,
            "input": texts,
        }));
        if let Some(key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Embedding request failed: {}\nResponse: {}", status, body));
        }

        let body: Value = response.json().await?;
        let data = body
            .get("data")
            .and_then(|d| d.as_array())
            .ok_or_else(|| anyhow!("Malformed embedding response: missing data"))?;

        // Entries carry an index; don't rely on the array order
        let mut embeddings: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        for (position, item) in data.iter().enumerate() {
            let index = item
                .get("index")
                .and_then(|i| i.as_u64())
                .map(|i| i as usize)
                .unwrap_or(position);
            let vector = item
                .get("embedding")
                .and_then(|e| e.as_array())
                .ok_or_else(|| anyhow!("Malformed embedding response: missing embedding"))?
                .iter()
                .map(|v| v.as_f64().map(|f| f as f32))
                .collect::<Option<Vec<f32>>>()
                .ok_or_else(|| anyhow!("Malformed embedding response: non-numeric value"))?;
            if let Some(slot) = embeddings.get_mut(index) {
                *slot = Some(vector);
            }
        }

        embeddings
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| anyhow!("Embedding response did not cover every input"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_embed_orders_by_index() -> Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(body_partial_json(json!({"model": "all-minilm"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"index": 1, "embedding": [0.0, 1.0]},
                    {"index": 0, "embedding": [1.0, 0.0]}
                ]
            })))
            .mount(&mock_server)
            .await;

        let embedder = OpenAiEmbedder::new(EmbeddingConfig {
            host: mock_server.uri(),
            ..EmbeddingConfig::default()
        })?;

        let vectors = embedder
            .embed(&["first".to_string(), "second".to_string()])
            .await?;
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        Ok(())
    }

    #[tokio::test]
    async fn test_embed_error_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&mock_server)
            .await;

        let embedder = OpenAiEmbedder::new(EmbeddingConfig {
            host: mock_server.uri(),
            ..EmbeddingConfig::default()
        })
        .unwrap();

        let err = embedder.embed_one("hello").await.unwrap_err();
        assert!(err.to_string().contains("model not found"));
    }
}
