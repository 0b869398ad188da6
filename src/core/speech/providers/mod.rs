use async_trait::async_trait;

use super::types::{OutputFormat, Result};

pub mod elevenlabs;
pub mod openai;

pub use elevenlabs::{ElevenLabsConfig, ElevenLabsProvider};
pub use openai::{OpenAiSpeechConfig, OpenAiSpeechProvider};

/// A remote speech synthesis provider.
///
/// Implementations classify their own failure modes into [`SpeechError`]
/// variants so the fallback chain never inspects provider-specific error
/// shapes.
///
/// [`SpeechError`]: super::types::SpeechError
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Unique identifier for the provider (e.g. "elevenlabs")
    fn id(&self) -> &'static str;

    /// The provider's documented default voice, used when a requested
    /// voice is denied or unmapped.
    fn default_voice(&self) -> &'static str;

    /// Synthesize speech from text with a provider-specific voice id.
    async fn synthesize(&self, text: &str, voice_id: &str, format: OutputFormat) -> Result<Vec<u8>>;
}
