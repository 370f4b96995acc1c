//! Language-model providers for drafting text.
//!
//! Implements the core [`Generator`] trait for:
//! - **[`DisabledGenerator`]** — always errors; the default.
//! - **[`OpenAIGenerator`]** — `POST /v1/chat/completions`, key from `OPENAI_API_KEY`.
//! - **[`AnthropicGenerator`]** — `POST /v1/messages`, key from `ANTHROPIC_API_KEY`.
//!
//! The prompt itself comes from [`build_prompt`]; providers only differ in
//! transport and response shape. One request per call, no retries.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use voiceprint_core::generation::{build_prompt, Generator};
use voiceprint_core::{Error, Result};

use crate::config::GenerationConfig;

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct DisabledGenerator;

#[async_trait]
impl Generator for DisabledGenerator {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn generate(
        &self,
        _context: &str,
        _query: &str,
        _style_hint: Option<&str>,
    ) -> Result<String> {
        Err(Error::generation(
            "generation provider is disabled; set [generation].provider in the config",
        ))
    }
}

/// Settings shared by the HTTP generators.
struct Settings {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl Settings {
    fn new(
        config: &GenerationConfig,
        api_key: String,
        default_url: &str,
        default_model: &str,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::generation_with("failed to build HTTP client", e))?;
        Ok(Self {
            client,
            base_url: config
                .url
                .as_deref()
                .unwrap_or(default_url)
                .trim_end_matches('/')
                .to_string(),
            api_key,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| default_model.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

fn api_key(var: &str) -> Result<String> {
    std::env::var(var).map_err(|_| Error::config(format!("{} environment variable not set", var)))
}

async fn send_json(
    request: reqwest::RequestBuilder,
    provider: &str,
) -> Result<serde_json::Value> {
    let response = request
        .send()
        .await
        .map_err(|e| Error::generation_with(format!("{} request failed", provider), e))?;
    let status = response.status();
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        return Err(Error::generation(format!(
            "{} API error {}: {}",
            provider, status, body_text
        )));
    }
    response
        .json()
        .await
        .map_err(|e| Error::generation_with(format!("{} returned invalid JSON", provider), e))
}

// ============ OpenAI ============

pub struct OpenAIGenerator {
    settings: Settings,
}

impl OpenAIGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        Self::with_api_key(config, api_key("OPENAI_API_KEY")?)
    }

    pub fn with_api_key(config: &GenerationConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            settings: Settings::new(config, api_key, DEFAULT_OPENAI_URL, "gpt-4o")?,
        })
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    fn model_name(&self) -> &str {
        &self.settings.model
    }

    async fn generate(&self, context: &str, query: &str, style_hint: Option<&str>) -> Result<String> {
        let s = &self.settings;
        let body = serde_json::json!({
            "model": s.model,
            "temperature": s.temperature,
            "max_tokens": s.max_tokens,
            "messages": [
                {"role": "user", "content": build_prompt(context, query, style_hint)}
            ],
        });
        let request = s
            .client
            .post(format!("{}/v1/chat/completions", s.base_url))
            .header("Authorization", format!("Bearer {}", s.api_key))
            .json(&body);
        let json = send_json(request, "OpenAI").await?;
        parse_openai_chat(&json)
    }
}

pub fn parse_openai_chat(json: &serde_json::Value) -> Result<String> {
    json.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| Error::generation("Invalid OpenAI response: missing choices[0].message.content"))
}

// ============ Anthropic ============

pub struct AnthropicGenerator {
    settings: Settings,
}

impl AnthropicGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        Self::with_api_key(config, api_key("ANTHROPIC_API_KEY")?)
    }

    pub fn with_api_key(config: &GenerationConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            settings: Settings::new(
                config,
                api_key,
                DEFAULT_ANTHROPIC_URL,
                "claude-3-5-sonnet-latest",
            )?,
        })
    }
}

#[async_trait]
impl Generator for AnthropicGenerator {
    fn model_name(&self) -> &str {
        &self.settings.model
    }

    async fn generate(&self, context: &str, query: &str, style_hint: Option<&str>) -> Result<String> {
        let s = &self.settings;
        let body = serde_json::json!({
            "model": s.model,
            "temperature": s.temperature,
            "max_tokens": s.max_tokens,
            "messages": [
                {"role": "user", "content": build_prompt(context, query, style_hint)}
            ],
        });
        let request = s
            .client
            .post(format!("{}/v1/messages", s.base_url))
            .header("x-api-key", &s.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);
        let json = send_json(request, "Anthropic").await?;
        parse_anthropic_message(&json)
    }
}

/// Concatenate the `text` blocks of an Anthropic messages response.
pub fn parse_anthropic_message(json: &serde_json::Value) -> Result<String> {
    let blocks = json
        .get("content")
        .and_then(|c| c.as_array())
        .ok_or_else(|| Error::generation("Invalid Anthropic response: missing content array"))?;
    let text: String = blocks
        .iter()
        .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
        .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
        .collect();
    if text.is_empty() {
        return Err(Error::generation("Invalid Anthropic response: no text content"));
    }
    Ok(text)
}

/// Create the configured [`Generator`].
pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn Generator>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledGenerator)),
        "openai" => Ok(Arc::new(OpenAIGenerator::new(config)?)),
        "anthropic" => Ok(Arc::new(AnthropicGenerator::new(config)?)),
        other => Err(Error::config(format!(
            "Unknown generation provider: {}",
            other
        ))),
    }
}
