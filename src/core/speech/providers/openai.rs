use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::core::speech::providers::SpeechProvider;
use crate::core::speech::types::{OutputFormat, Result, SpeechError};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const DEFAULT_VOICE: &str = "alloy";

/// Available OpenAI TTS voices
pub const OPENAI_TTS_VOICES: &[&str] = &["alloy", "echo", "fable", "onyx", "nova", "shimmer"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSpeechConfig {
    pub api_key: String,
    /// "tts-1" or "tts-1-hd"
    pub model: String,
    pub base_url: Option<String>,
}

impl Default for OpenAiSpeechConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "tts-1".to_string(),
            base_url: None,
        }
    }
}

pub struct OpenAiSpeechProvider {
    client: Client,
    config: OpenAiSpeechConfig,
    base_url: String,
}

impl OpenAiSpeechProvider {
    pub fn new(config: OpenAiSpeechConfig) -> Self {
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
impl SpeechProvider for OpenAiSpeechProvider {
    fn id(&self) -> &'static str {
        "openai"
    }

    fn default_voice(&self) -> &'static str {
        DEFAULT_VOICE
    }

    async fn synthesize(&self, text: &str, voice_id: &str, format: OutputFormat) -> Result<Vec<u8>> {
        let url = format!("{}/audio/speech", self.base_url);

        let response_format = match format {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Wav => "wav",
            OutputFormat::Ogg => "opus",
        };

        let body = json!({
            "model": self.config.model,
            "input": text,
            "voice": voice_id,
            "response_format": response_format
        });

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
            return Err(SpeechError::RateLimited { retry_after_secs: retry_after });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(SpeechError::AuthDenied("API key rejected".to_string()));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SpeechError::Api { status: status.as_u16(), message });
        }

        Ok(response.bytes().await?.to_vec())
    }
}
