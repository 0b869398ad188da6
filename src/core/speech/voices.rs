//! Voice role mapping.
//!
//! The rest of the pipeline speaks in abstract voice roles; each provider
//! has its own voice taxonomy. The mapping is a static table resolved per
//! provider, and an unmapped role falls back to the provider's documented
//! default rather than failing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Abstract voice parameter used by callers and in cache keys. Cache keys
/// are derived from the role, not the provider voice id, so an asset
/// produced by any provider satisfies later lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceRole {
    /// Reads clues and runs the game flow.
    Host,
    /// Delivers hints and tutoring asides.
    Coach,
    /// Intros, category reveals, dramatic beats.
    Narrator,
    /// Celebrations and reactions.
    Sidekick,
}

impl VoiceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Coach => "coach",
            Self::Narrator => "narrator",
            Self::Sidekick => "sidekick",
        }
    }
}

impl fmt::Display for VoiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the role→provider-voice table.
pub struct VoiceMapping {
    pub role: VoiceRole,
    pub provider: &'static str,
    pub voice_id: &'static str,
}

/// Static role→voice table, one row per (role, provider).
pub const VOICE_TABLE: &[VoiceMapping] = &[
    // OpenAI TTS voices
    VoiceMapping { role: VoiceRole::Host, provider: "openai", voice_id: "onyx" },
    VoiceMapping { role: VoiceRole::Coach, provider: "openai", voice_id: "nova" },
    VoiceMapping { role: VoiceRole::Narrator, provider: "openai", voice_id: "fable" },
    VoiceMapping { role: VoiceRole::Sidekick, provider: "openai", voice_id: "shimmer" },
    // ElevenLabs premade voices
    VoiceMapping { role: VoiceRole::Host, provider: "elevenlabs", voice_id: "TxGEqnHWrfWFTfGW9XjX" },
    VoiceMapping { role: VoiceRole::Coach, provider: "elevenlabs", voice_id: "EXAVITQu4vr4xnSDxMaL" },
    VoiceMapping { role: VoiceRole::Narrator, provider: "elevenlabs", voice_id: "pNInz6obpgDQGcFmaJgB" },
    VoiceMapping { role: VoiceRole::Sidekick, provider: "elevenlabs", voice_id: "21m00Tcm4TlvDq8ikWAM" },
];

/// Resolve a role to a provider-specific voice id. Unmapped combinations
/// resolve to the provider's default voice.
pub fn voice_for(role: VoiceRole, provider: &str, provider_default: &'static str) -> &'static str {
    VOICE_TABLE
        .iter()
        .find(|m| m.role == role && m.provider == provider)
        .map(|m| m.voice_id)
        .unwrap_or(provider_default)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_role_mapped_for_known_providers() {
        for provider in ["openai", "elevenlabs"] {
            for role in [VoiceRole::Host, VoiceRole::Coach, VoiceRole::Narrator, VoiceRole::Sidekick] {
                let mapped = VOICE_TABLE
                    .iter()
                    .any(|m| m.role == role && m.provider == provider);
                assert!(mapped, "role {role} unmapped for {provider}");
            }
        }
    }

    #[test]
    fn test_unknown_provider_falls_back_to_default() {
        assert_eq!(voice_for(VoiceRole::Host, "acme-tts", "standard"), "standard");
    }

    #[test]
    fn test_mapped_lookup() {
        assert_eq!(voice_for(VoiceRole::Host, "openai", "alloy"), "onyx");
    }
}
