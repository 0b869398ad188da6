use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::cache::StoreConfig;
use crate::core::speech::providers::elevenlabs::ElevenLabsConfig;
use crate::core::speech::providers::openai::OpenAiSpeechConfig;
use crate::core::speech::types::OutputFormat;

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub data: DataConfig,
    pub speech: SpeechSettings,
    pub model: ModelSettings,
    pub store: StoreConfig,
    pub prefetch: PrefetchSettings,
}

/// Data directory configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DataConfig {
    /// Override the default data directory.
    pub data_dir: Option<PathBuf>,
}

/// Speech synthesis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    /// Providers in fallback priority order.
    pub provider_order: Vec<String>,
    /// Hard per-provider timeout during the fallback walk.
    pub provider_timeout_secs: u64,
    pub format: OutputFormat,
    /// Manifest of pre-baked audio shipped with the application.
    pub manifest_path: Option<PathBuf>,
    /// Directory the manifest's filenames are relative to. Defaults to
    /// the manifest's own directory.
    pub assets_dir: Option<PathBuf>,
    pub elevenlabs: Option<ElevenLabsConfig>,
    pub openai: Option<OpenAiSpeechConfig>,
}

/// Generative model configuration (boards and hints).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    /// Hard timeout on one board-generation call.
    pub request_timeout_secs: u64,
    /// Generation attempts before falling back to the offline corpus.
    pub max_attempts: u32,
}

/// Background prefetch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefetchSettings {
    /// Ready boards to hold per difficulty.
    pub target_size: usize,
    /// Delay step between replenishment requests in one batch.
    pub stagger_ms: u64,
    /// Concurrent hint generations per batch.
    pub hint_batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            speech: SpeechSettings::default(),
            model: ModelSettings::default(),
            store: StoreConfig::default(),
            prefetch: PrefetchSettings::default(),
        }
    }
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            provider_order: vec!["elevenlabs".to_string(), "openai".to_string()],
            provider_timeout_secs: 20,
            format: OutputFormat::Mp3,
            manifest_path: None,
            assets_dir: None,
            elevenlabs: None,
            openai: None,
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            max_tokens: 4096,
            request_timeout_secs: 30,
            max_attempts: 3,
        }
    }
}

impl Default for PrefetchSettings {
    fn default() -> Self {
        Self {
            target_size: 3,
            stagger_ms: 750,
            hint_batch_size: 3,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from `~/.config/quizdeck/config.toml`.
    /// Returns `Default` if the file is missing or unparseable.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    log::warn!(
                        "Failed to parse config at {}: {e} — using defaults",
                        config_path.display()
                    );
                    Self::default()
                }
            },
            Err(_) => {
                log::debug!(
                    "No config file at {} — using defaults",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    /// Load from an explicit path, falling back to defaults the same way.
    pub fn load_from(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                log::warn!("Failed to parse config at {}: {e} — using defaults", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quizdeck")
            .join("config.toml")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.speech.provider_order, vec!["elevenlabs", "openai"]);
        assert_eq!(config.prefetch.target_size, 3);
        assert_eq!(config.model.max_attempts, 3);
        assert!(config.speech.elevenlabs.is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: PipelineConfig = toml::from_str(
            r#"
            [prefetch]
            target_size = 5

            [speech.openai]
            api_key = "sk-test"
            "#,
        )
        .unwrap();

        assert_eq!(config.prefetch.target_size, 5);
        assert_eq!(config.prefetch.hint_batch_size, 3);
        assert_eq!(config.speech.openai.as_ref().unwrap().api_key, "sk-test");
        assert_eq!(config.speech.openai.as_ref().unwrap().model, "tts-1");
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let config = PipelineConfig::load_from(std::path::Path::new("/nonexistent/config.toml"));
        assert_eq!(config.prefetch.target_size, 3);
    }
}
