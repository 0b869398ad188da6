//! Speech synthesis: provider fallback chain, voice mapping, audio types.

pub mod pipeline;
pub mod providers;
pub mod types;
pub mod voices;

pub use pipeline::{SpeechPipeline, SpeechPipelineConfig};
pub use providers::{
    ElevenLabsConfig, ElevenLabsProvider, OpenAiSpeechConfig, OpenAiSpeechProvider, SpeechProvider,
};
pub use types::{AudioBody, AudioPayload, OutputFormat, SpeechError};
pub use voices::{voice_for, VoiceRole};
