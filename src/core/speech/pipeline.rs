//! Speech Fallback Pipeline
//!
//! Turns (text, voice role) into a playable [`AudioPayload`] without ever
//! failing: manifest → persistent store → ordered provider chain →
//! platform-speech fallback. Concurrent requests for the same uncached
//! key share a single in-flight synthesis.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::core::addresser::{canonicalize, AssetKey};
use crate::core::cache::AssetStore;
use crate::core::manifest::ManifestResolver;
use crate::core::speech::providers::SpeechProvider;
use crate::core::speech::types::{AudioPayload, OutputFormat, Result, SpeechError};
use crate::core::speech::voices::{voice_for, VoiceRole};

type SharedSynthesis = Shared<BoxFuture<'static, AudioPayload>>;

/// Configuration for the fallback pipeline.
#[derive(Debug, Clone)]
pub struct SpeechPipelineConfig {
    /// Hard ceiling per provider hop, so a stuck provider cannot stall
    /// the walk to the next fallback step.
    pub provider_timeout: Duration,
    pub format: OutputFormat,
}

impl Default for SpeechPipelineConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(20),
            format: OutputFormat::Mp3,
        }
    }
}

/// The provider fallback chain. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SpeechPipeline {
    inner: Arc<PipelineInner>,
}

struct PipelineInner {
    /// Providers in priority order.
    providers: Vec<Arc<dyn SpeechProvider>>,
    store: Arc<AssetStore>,
    manifest: Arc<ManifestResolver>,
    config: SpeechPipelineConfig,
    /// In-flight synthesis registry: later callers for the same key await
    /// the shared result instead of issuing duplicate provider calls.
    inflight: Mutex<HashMap<AssetKey, SharedSynthesis>>,
}

impl SpeechPipeline {
    pub fn new(
        providers: Vec<Arc<dyn SpeechProvider>>,
        store: Arc<AssetStore>,
        manifest: Arc<ManifestResolver>,
    ) -> Self {
        Self::with_config(providers, store, manifest, SpeechPipelineConfig::default())
    }

    pub fn with_config(
        providers: Vec<Arc<dyn SpeechProvider>>,
        store: Arc<AssetStore>,
        manifest: Arc<ManifestResolver>,
        config: SpeechPipelineConfig,
    ) -> Self {
        Self {
            inner: Arc::new(PipelineInner {
                providers,
                store,
                manifest,
                config,
                inflight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Synthesize speech for a text and voice role.
    ///
    /// Guaranteed to terminate in a playable result: worst case is an
    /// estimate-only platform-speech payload. Never returns an error.
    pub async fn synthesize(&self, text: &str, role: VoiceRole) -> AudioPayload {
        let canonical = canonicalize(text);
        let key = AssetKey::for_speech(&canonical, role.as_str());

        // 1. Pre-baked assets shipped with the application
        if let Some(bytes) = self.inner.manifest.fetch(&key).await {
            log::debug!("Speech for key {key} served from manifest");
            return AudioPayload::from_bytes(bytes, self.inner.config.format, &canonical, "manifest", true);
        }

        // 2. Persistent store
        if let Some((bytes, origin)) = self.inner.store.get_with_origin(&key).await {
            log::debug!("Speech for key {key} served from store (origin {origin})");
            return AudioPayload::from_bytes(bytes, self.inner.config.format, &canonical, &origin, true);
        }

        // 3/4. Providers and platform fallback, single-flighted per key
        let fut = {
            let mut inflight = self.inner.inflight.lock().await;
            if let Some(existing) = inflight.get(&key) {
                log::debug!("Joining in-flight synthesis for key {key}");
                existing.clone()
            } else {
                let inner = Arc::clone(&self.inner);
                let text = canonical.clone();
                let generation_key = key.clone();
                let fut = async move { inner.generate(text, role, generation_key).await }
                    .boxed()
                    .shared();
                inflight.insert(key.clone(), fut.clone());
                fut
            }
        };

        let payload = fut.await;
        self.inner.inflight.lock().await.remove(&key);
        payload
    }
}

impl PipelineInner {
    /// Walk the provider chain; fall back to platform speech if every
    /// provider fails.
    async fn generate(self: Arc<Self>, text: String, role: VoiceRole, key: AssetKey) -> AudioPayload {
        for provider in &self.providers {
            let voice = voice_for(role, provider.id(), provider.default_voice());

            match self.attempt(provider.as_ref(), &text, voice).await {
                Ok(bytes) => {
                    self.store.put(&key, &bytes, provider.id()).await;
                    return AudioPayload::from_bytes(bytes, self.config.format, &text, provider.id(), false);
                }
                Err(SpeechError::AuthDenied(reason)) => {
                    log::warn!("Provider {} denied voice {voice}: {reason}", provider.id());
                    // A restricted voice does not disqualify the provider:
                    // retry once with its default voice before moving on.
                    let fallback_voice = provider.default_voice();
                    if fallback_voice != voice {
                        match self.attempt(provider.as_ref(), &text, fallback_voice).await {
                            Ok(bytes) => {
                                self.store.put(&key, &bytes, provider.id()).await;
                                return AudioPayload::from_bytes(
                                    bytes,
                                    self.config.format,
                                    &text,
                                    provider.id(),
                                    false,
                                );
                            }
                            Err(e) => {
                                log::warn!(
                                    "Provider {} default voice {fallback_voice} also failed: {e}",
                                    provider.id()
                                );
                            }
                        }
                    }
                }
                Err(e) => {
                    log::warn!("Provider {} failed: {e}", provider.id());
                }
            }
        }

        log::info!("All speech providers exhausted for key {key} — deferring to platform speech");
        AudioPayload::platform(&text)
    }

    async fn attempt(&self, provider: &dyn SpeechProvider, text: &str, voice: &str) -> Result<Vec<u8>> {
        match timeout(
            self.config.provider_timeout,
            provider.synthesize(text, voice, self.config.format),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(SpeechError::Timeout),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
