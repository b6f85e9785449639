use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::Client;
use rig::{client::CompletionClient, completion::Prompt, providers::openrouter};
use serde_json::{Value, json};
use std::time::Duration;

use crate::error::{ConsultError, Result};

const OPENROUTER_CHAT_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// A single-shot text generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f64,
    pub preamble: String,
}

impl ModelSettings {
    pub fn new(model: impl Into<String>, preamble: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.0,
            preamble: preamble.into(),
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

/// OpenRouter-hosted model driven through a rig agent.
pub struct OpenRouterGenerator {
    client: openrouter::Client,
    settings: ModelSettings,
}

impl OpenRouterGenerator {
    pub fn new(api_key: &str, settings: ModelSettings) -> Self {
        Self {
            client: openrouter::Client::new(api_key),
            settings,
        }
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }
}

#[async_trait]
impl TextGenerator for OpenRouterGenerator {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let agent = self
            .client
            .agent(&self.settings.model)
            .preamble(&self.settings.preamble)
            .temperature(self.settings.temperature)
            .build();

        let response = agent.prompt(prompt).await?;
        Ok(response)
    }
}

/// Vision-capable chat completion call used for OCR of rendered report pages.
pub struct OpenRouterVision {
    http: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl OpenRouterVision {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConsultError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_tokens: 4000,
        })
    }

    /// Sends a text instruction followed by PNG pages encoded as base64.
    pub async fn read_pages(&self, instruction: &str, pages_base64: &[String]) -> anyhow::Result<String> {
        let mut content = vec![json!({
            "type": "text",
            "text": instruction,
        })];
        content.extend(pages_base64.iter().map(|page| {
            json!({
                "type": "image_url",
                "image_url": {
                    "url": format!("data:image/png;base64,{}", page)
                }
            })
        }));

        let payload = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": content
                }
            ],
            "max_tokens": self.max_tokens,
            "temperature": 0.0
        });

        let response = self
            .http
            .post(OPENROUTER_CHAT_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("LLM API request failed: {}", response.status()));
        }

        let body: Value = response.json().await?;
        extract_message_content(&body)
    }
}

fn extract_message_content(body: &Value) -> anyhow::Result<String> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Invalid response format from LLM"))
}
