//! OpenAI-compatible chat-completions client.
//!
//! Works against any endpoint speaking the OpenAI chat API, which covers
//! most hosted and self-hosted structured-generation backends.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{extract_json, ModelClient, ModelError, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiModelConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
    pub max_tokens: u32,
}

impl Default for OpenAiModelConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            max_tokens: 4096,
        }
    }
}

pub struct OpenAiModelClient {
    client: Client,
    config: OpenAiModelConfig,
    base_url: String,
}

impl OpenAiModelClient {
    pub fn new(config: OpenAiModelConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self { client, config, base_url }
    }

    async fn chat(&self, body: serde_json::Value) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(ModelError::RateLimited { retry_after_secs: retry_after });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ModelError::Auth("invalid API key".to_string()));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ModelError::Api { status: status.as_u16(), message });
        }

        let json: serde_json::Value = response.json().await?;
        json["choices"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|c| c["message"]["content"].as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| ModelError::InvalidResponse("missing content".to_string()))
    }
}

#[async_trait]
impl ModelClient for OpenAiModelClient {
    fn id(&self) -> &str {
        "openai"
    }

    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let system = format!(
            "You produce JSON only, no prose. The output must match this schema:\n{}",
            schema
        );
        let body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": prompt}
            ]
        });

        let content = self.chat(body).await?;
        let json_str = extract_json(&content)
            .ok_or_else(|| ModelError::InvalidResponse("no JSON object in reply".to_string()))?;
        Ok(serde_json::from_str(json_str)?)
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": 200,
            "messages": [
                {"role": "user", "content": prompt}
            ]
        });
        Ok(self.chat(body).await?.trim().to_string())
    }
}
