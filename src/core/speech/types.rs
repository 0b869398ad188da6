//! Speech synthesis domain types and error taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors a synthesis provider can surface, classified so the fallback
/// chain can decide its next hop without inspecting provider-specific
/// payload shapes.
#[derive(Error, Debug)]
pub enum SpeechError {
    /// Credentials rejected or the requested voice is restricted. The
    /// chain retries the same provider once with its default voice.
    #[error("authorization denied: {0}")]
    AuthDenied(String),

    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, SpeechError>;

// ============================================================================
// Audio Types
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Mp3,
    Wav,
    Ogg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Ogg => "ogg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
            Self::Ogg => "audio/ogg",
        }
    }
}

/// The audio content of a synthesis result.
///
/// `PlatformTts` is the degraded, always-available last resort: no bytes
/// were produced and the consumer should hand the text to the host
/// platform's own speech facility. Callers distinguish the two variants
/// rather than sniffing for empty byte buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioBody {
    Bytes { data: Vec<u8>, format: OutputFormat },
    PlatformTts,
}

/// A playable synthesis result. The pipeline's contract is that one of
/// these is always returned — degraded at worst, never an error.
#[derive(Debug, Clone)]
pub struct AudioPayload {
    pub body: AudioBody,
    /// Estimated playback duration, derived from the text. Present for
    /// both variants so UI timing never branches on the audio source.
    pub estimated_duration_ms: u64,
    /// Provider id that produced the payload ("manifest", "elevenlabs",
    /// "openai", "platform", ...)
    pub produced_by: String,
    /// Whether the payload was served from the manifest or the store.
    pub cached: bool,
}

impl AudioPayload {
    pub fn from_bytes(data: Vec<u8>, format: OutputFormat, text: &str, produced_by: &str, cached: bool) -> Self {
        Self {
            body: AudioBody::Bytes { data, format },
            estimated_duration_ms: estimate_duration_ms(text),
            produced_by: produced_by.to_string(),
            cached,
        }
    }

    /// The estimate-only fallback result: no bytes, platform speech.
    pub fn platform(text: &str) -> Self {
        Self {
            body: AudioBody::PlatformTts,
            estimated_duration_ms: estimate_duration_ms(text),
            produced_by: "platform".to_string(),
            cached: false,
        }
    }

    pub fn has_audio(&self) -> bool {
        matches!(self.body, AudioBody::Bytes { .. })
    }
}

/// Words-per-minute model for playback duration. 150 wpm is a typical
/// synthesized-narration pace; the floor covers one-word exclamations.
pub fn estimate_duration_ms(text: &str) -> u64 {
    let words = text.split_whitespace().count() as u64;
    (words * 60_000 / 150).max(600)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_scales_with_word_count() {
        let short = estimate_duration_ms("Correct!");
        let long = estimate_duration_ms("That is exactly right, well done, ten points to you!");
        assert!(long > short);
        assert_eq!(estimate_duration_ms("one two three four five"), 2000);
    }

    #[test]
    fn test_estimate_has_floor() {
        assert_eq!(estimate_duration_ms(""), 600);
    }

    #[test]
    fn test_platform_payload_has_no_audio() {
        let payload = AudioPayload::platform("Read this aloud");
        assert!(!payload.has_audio());
        assert_eq!(payload.produced_by, "platform");
        assert!(payload.estimated_duration_ms >= 600);
    }

    #[test]
    fn test_bytes_payload_has_audio() {
        let payload = AudioPayload::from_bytes(vec![1, 2, 3], OutputFormat::Mp3, "Hello there", "openai", false);
        assert!(payload.has_audio());
    }
}
