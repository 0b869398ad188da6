use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::core::speech::providers::SpeechProvider;
use crate::core::speech::types::{OutputFormat, Result, SpeechError};

const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io/v1";

/// Rachel — ElevenLabs' always-available premade voice.
const DEFAULT_VOICE: &str = "21m00Tcm4TlvDq8ikWAM";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElevenLabsConfig {
    pub api_key: String,
    pub model_id: Option<String>,
    pub base_url: Option<String>,
}

pub struct ElevenLabsProvider {
    client: Client,
    config: ElevenLabsConfig,
    base_url: String,
}

impl ElevenLabsProvider {
    pub fn new(config: ElevenLabsConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self { client, config, base_url }
    }
}

#[async_trait]
impl SpeechProvider for ElevenLabsProvider {
    fn id(&self) -> &'static str {
        "elevenlabs"
    }

    fn default_voice(&self) -> &'static str {
        DEFAULT_VOICE
    }

    async fn synthesize(&self, text: &str, voice_id: &str, format: OutputFormat) -> Result<Vec<u8>> {
        let url = format!("{}/text-to-speech/{}", self.base_url, voice_id);

        let model_id = self
            .config
            .model_id
            .as_deref()
            .unwrap_or("eleven_monolingual_v1");

        let body = json!({
            "text": text,
            "model_id": model_id,
        });

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .header("Accept", format.mime_type())
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
            return Err(SpeechError::RateLimited { retry_after_secs: retry_after });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(SpeechError::AuthDenied("invalid API key".to_string()));
        }

        // ElevenLabs answers 403 for voices the subscription tier may not use
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(SpeechError::AuthDenied(format!("voice {voice_id} not permitted")));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SpeechError::Api { status: status.as_u16(), message });
        }

        Ok(response.bytes().await?.to_vec())
    }
}
