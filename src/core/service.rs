//! Asset service assembly.
//!
//! Builds the full pipeline — store, manifest, speech chain, board
//! generator, prefetchers — from configuration, wiring providers in the
//! configured priority order. Components are constructed explicitly and
//! injected; nothing here is a process-wide singleton.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::PipelineConfig;
use crate::core::board::{BoardGenerator, BoardGeneratorConfig, SeenSet};
use crate::core::cache::{AssetStore, StoreError};
use crate::core::manifest::ManifestResolver;
use crate::core::model::{ModelClient, OpenAiModelClient, OpenAiModelConfig};
use crate::core::prefetch::{HintPrefetcher, PrefetchConfig, PrefetchScheduler};
use crate::core::speech::{
    ElevenLabsProvider, OpenAiSpeechProvider, SpeechPipeline, SpeechPipelineConfig, SpeechProvider,
};

/// The assembled asset pipeline, one per process.
pub struct AssetService {
    pub speech: SpeechPipeline,
    pub boards: PrefetchScheduler,
    pub hints: HintPrefetcher,
    pub store: Arc<AssetStore>,
    pub seen: Arc<SeenSet>,
}

impl AssetService {
    /// Assemble the pipeline from configuration. Only the asset store can
    /// fail to come up; everything else degrades per its own contract.
    pub async fn from_config(config: &PipelineConfig) -> Result<Self, StoreError> {
        let data_dir = config.data.data_dir.clone().unwrap_or_else(default_data_dir);

        let store = Arc::new(
            AssetStore::open(data_dir.join("asset_store"), config.store.clone()).await?,
        );

        let manifest = match &config.speech.manifest_path {
            Some(path) => {
                let assets_dir = config
                    .speech
                    .assets_dir
                    .clone()
                    .or_else(|| path.parent().map(PathBuf::from))
                    .unwrap_or_default();
                Arc::new(ManifestResolver::new(path.clone(), assets_dir))
            }
            None => Arc::new(ManifestResolver::empty()),
        };

        let providers = build_providers(config);
        if providers.is_empty() {
            log::warn!("No speech providers configured — synthesis will always defer to platform speech");
        }

        let speech = SpeechPipeline::with_config(
            providers,
            Arc::clone(&store),
            manifest,
            SpeechPipelineConfig {
                provider_timeout: Duration::from_secs(config.speech.provider_timeout_secs),
                format: config.speech.format,
            },
        );

        let model: Arc<dyn ModelClient> = Arc::new(OpenAiModelClient::new(OpenAiModelConfig {
            api_key: config.model.api_key.clone(),
            model: config.model.model.clone(),
            base_url: config.model.base_url.clone(),
            max_tokens: config.model.max_tokens,
        }));

        let seen = Arc::new(SeenSet::load(data_dir.join("seen_boards.log")).await);

        let generator = Arc::new(BoardGenerator::with_config(
            Arc::clone(&model),
            Arc::clone(&seen),
            BoardGeneratorConfig {
                request_timeout: Duration::from_secs(config.model.request_timeout_secs),
                max_attempts: config.model.max_attempts,
            },
        ));

        let boards = PrefetchScheduler::new(
            generator,
            PrefetchConfig {
                target_size: config.prefetch.target_size,
                stagger: Duration::from_millis(config.prefetch.stagger_ms),
            },
        );

        let hints = HintPrefetcher::with_batch_size(model, config.prefetch.hint_batch_size);

        Ok(Self { speech, boards, hints, store, seen })
    }

    /// Kick off background warm-up of every board pool.
    pub fn warm_up(&self) {
        let boards = self.boards.clone();
        tokio::spawn(async move {
            boards.top_up_all().await;
        });
    }
}

fn build_providers(config: &PipelineConfig) -> Vec<Arc<dyn SpeechProvider>> {
    let mut providers: Vec<Arc<dyn SpeechProvider>> = Vec::new();

    for id in &config.speech.provider_order {
        match id.as_str() {
            "elevenlabs" => {
                if let Some(cfg) = &config.speech.elevenlabs {
                    providers.push(Arc::new(ElevenLabsProvider::new(cfg.clone())));
                }
            }
            "openai" => {
                if let Some(cfg) = &config.speech.openai {
                    providers.push(Arc::new(OpenAiSpeechProvider::new(cfg.clone())));
                }
            }
            other => log::warn!("Unknown speech provider '{other}' in provider_order — skipping"),
        }
    }

    providers
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quizdeck")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::core::speech::providers::{ElevenLabsConfig, OpenAiSpeechConfig};
    use tempfile::TempDir;

    fn test_config(temp: &TempDir) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.data.data_dir = Some(temp.path().to_path_buf());
        config
    }

    #[tokio::test]
    async fn test_assembles_with_no_providers() {
        let temp = TempDir::new().unwrap();
        let service = AssetService::from_config(&test_config(&temp)).await.unwrap();

        // With nothing configured, synthesis still returns a usable value
        let payload = service
            .speech
            .synthesize("Hello", crate::core::speech::VoiceRole::Host)
            .await;
        assert_eq!(payload.produced_by, "platform");
    }

    #[tokio::test]
    async fn test_provider_order_respected() {
        let temp = TempDir::new().unwrap();
        let mut config = test_config(&temp);
        config.speech.elevenlabs = Some(ElevenLabsConfig {
            api_key: "key".to_string(),
            model_id: None,
            base_url: None,
        });
        config.speech.openai = Some(OpenAiSpeechConfig {
            api_key: "key".to_string(),
            ..Default::default()
        });
        config.speech.provider_order = vec!["openai".to_string(), "elevenlabs".to_string()];

        let providers = build_providers(&config);
        assert_eq!(providers.len(), 2);
        assert_eq!(providers[0].id(), "openai");
        assert_eq!(providers[1].id(), "elevenlabs");
    }

    #[tokio::test]
    async fn test_unconfigured_providers_are_skipped() {
        let temp = TempDir::new().unwrap();
        let mut config = test_config(&temp);
        config.speech.openai = Some(OpenAiSpeechConfig {
            api_key: "key".to_string(),
            ..Default::default()
        });

        let providers = build_providers(&config);
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].id(), "openai");
    }
}
