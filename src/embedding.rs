//! HTTP embedding backends.
//!
//! `[embedding].provider` picks one of:
//! - `disabled`: [`DisabledProvider`], every call fails. Commands that only
//!   read the collection still work.
//! - `openai`: [`OpenAIProvider`], `POST /v1/embeddings`.
//! - `ollama`: [`OllamaProvider`], `POST /api/embed` on a local server.
//!
//! ```rust,no_run
//! # use voiceprint::config::EmbeddingConfig;
//! # use voiceprint::embedding::create_provider;
//! let provider = create_provider(&EmbeddingConfig::default()).unwrap();
//! assert_eq!(provider.dims(), 0);
//! ```
//!
//! # Failure Handling
//!
//! Each `embed_batch` call is exactly one HTTP request. Network errors,
//! non-2xx responses and malformed bodies all surface as
//! [`Error::EmbeddingProvider`]; retrying is left to the caller.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use voiceprint_core::embedding::{ensure_batch_len, EmbeddingProvider};
use voiceprint_core::{Error, Result};

use crate::config::EmbeddingConfig;

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_OPENAI_MODEL: &str = "text-embedding-3-small";

// ============ Disabled Provider ============

/// Stand-in provider for `provider = "disabled"`.
pub struct DisabledProvider;

#[async_trait]
impl EmbeddingProvider for DisabledProvider {
    fn model_name(&self) -> &str {
        "disabled"
    }
    fn dims(&self) -> usize {
        0
    }
    fn is_enabled(&self) -> bool {
        false
    }
    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(Error::embedding(
            "embedding provider is disabled; set [embedding].provider in the config",
        ))
    }
}

// ============ OpenAI Provider ============

/// OpenAI embeddings endpoint.
///
/// Requires the `OPENAI_API_KEY` environment variable. All texts of a
/// batch go out in a single request.
pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dims: usize,
}

impl OpenAIProvider {
    /// Reads the key from `OPENAI_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `OPENAI_API_KEY` is not set.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| Error::config("OPENAI_API_KEY environment variable not set"))?;
        Self::with_api_key(config, api_key)
    }

    /// Create a provider with an explicit key (used by tests and embedders).
    pub fn with_api_key(config: &EmbeddingConfig, api_key: String) -> Result<Self> {
        let model = config
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());
        let dims = config.dims.unwrap_or(match model.as_str() {
            "text-embedding-3-large" => 3072,
            _ => 1536,
        });
        let base_url = config
            .url
            .clone()
            .unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string());

        Ok(Self {
            client: http_client(config.timeout_secs)?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            dims,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::embedding_with("OpenAI request failed", e))?;

        let json = read_json(response, "OpenAI").await?;
        let vectors = parse_openai_response(&json)?;
        ensure_batch_len(&vectors, texts.len())?;
        Ok(vectors)
    }
}

/// Parse the OpenAI embeddings response, ordering vectors by `index`.
pub fn parse_openai_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| Error::embedding("Invalid OpenAI response: missing data array"))?;

    let mut indexed = Vec::with_capacity(data.len());

    for (position, item) in data.iter().enumerate() {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| Error::embedding("Invalid OpenAI response: missing embedding"))?;
        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .map(|i| i as usize)
            .unwrap_or(position);
        indexed.push((index, to_f32_vec(embedding)?));
    }

    indexed.sort_by_key(|(i, _)| *i);
    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

// ============ Ollama Provider ============

/// Ollama's batch embed endpoint. No key needed.
///
/// Calls `POST /api/embed` on the configured URL (default:
/// `http://localhost:11434`).
pub struct OllamaProvider {
    client: reqwest::Client,
    url: String,
    model: String,
    dims: usize,
}

impl OllamaProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| Error::config("embedding.model required for Ollama provider"))?;
        let dims = config
            .dims
            .ok_or_else(|| Error::config("embedding.dims required for Ollama provider"))?;
        let url = config
            .url
            .clone()
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

        Ok(Self {
            client: http_client(config.timeout_secs)?,
            url: url.trim_end_matches('/').to_string(),
            model,
            dims,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let response = self
            .client
            .post(format!("{}/api/embed", self.url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                Error::embedding_with(
                    format!("Ollama connection error (is Ollama running at {}?)", self.url),
                    e,
                )
            })?;

        let json = read_json(response, "Ollama").await?;
        let vectors = parse_ollama_response(&json)?;
        ensure_batch_len(&vectors, texts.len())?;
        Ok(vectors)
    }
}

pub fn parse_ollama_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let embeddings = json
        .get("embeddings")
        .and_then(|e| e.as_array())
        .ok_or_else(|| Error::embedding("Invalid Ollama response: missing embeddings array"))?;

    embeddings
        .iter()
        .map(|embedding| {
            let values = embedding.as_array().ok_or_else(|| {
                Error::embedding("Invalid Ollama response: embedding is not an array")
            })?;
            to_f32_vec(values)
        })
        .collect()
}

// ============ Shared helpers ============

fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Error::embedding_with("failed to build HTTP client", e))
}

async fn read_json(response: reqwest::Response, provider: &str) -> Result<serde_json::Value> {
    let status = response.status();
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        return Err(Error::embedding(format!(
            "{} API error {}: {}",
            provider, status, body_text
        )));
    }
    response
        .json()
        .await
        .map_err(|e| Error::embedding_with(format!("{} returned invalid JSON", provider), e))
}

fn to_f32_vec(values: &[serde_json::Value]) -> Result<Vec<f32>> {
    values
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| Error::embedding("embedding contains a non-numeric value"))
        })
        .collect()
}

/// Build the provider named by `[embedding].provider`.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledProvider)),
        "openai" => Ok(Arc::new(OpenAIProvider::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaProvider::new(config)?)),
        other => Err(Error::config(format!(
            "Unknown embedding provider: {}",
            other
        ))),
    }
}
