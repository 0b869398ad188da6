//! Content Addressing
//!
//! Canonicalizes prompt text and derives stable cache keys from it.
//! The same canonicalization must run at generation time and at lookup
//! time, or cache lookups silently miss.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

// ============================================================================
// Canonicalization
// ============================================================================

/// `[bracketed stage directions]`
static STAGE_DIRECTIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]").expect("valid regex"));

/// `*asterisk-delimited actions*`
static ACTIONS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*[^*]*\*").expect("valid regex"));

/// `(parenthetical asides)`
static ASIDES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)").expect("valid regex"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Strip performance markup from prompt text and collapse whitespace.
///
/// Stage directions, actions and asides are cues for the synthesizer's
/// delivery, not content; two prompts differing only in markup must map
/// to the same asset.
pub fn canonicalize(text: &str) -> String {
    let stripped = STAGE_DIRECTIONS.replace_all(text, " ");
    let stripped = ACTIONS.replace_all(&stripped, " ");
    let stripped = ASIDES.replace_all(&stripped, " ");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

// ============================================================================
// AssetKey
// ============================================================================

/// Number of hex characters kept from the SHA-256 digest.
///
/// 64 bits of key space is plenty for deduplication within one
/// application's asset corpus; this is not a security boundary.
const KEY_HEX_LEN: usize = 16;

/// Deterministic content hash identifying a cached asset.
///
/// Identical canonicalized input (plus voice, for speech) always yields
/// the identical key, independent of which provider eventually produces
/// the payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetKey(String);

impl AssetKey {
    /// Key for a speech asset: canonical text plus the abstract voice role.
    pub fn for_speech(text: &str, voice: &str) -> Self {
        Self::digest(&[canonicalize(text).as_bytes(), voice.as_bytes()])
    }

    /// Key for a non-speech asset (e.g. a serialized dataset).
    pub fn for_data(text: &str) -> Self {
        Self::digest(&[canonicalize(text).as_bytes()])
    }

    fn digest(parts: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                // Separator to prevent collisions between adjacent parts
                hasher.update(b"|");
            }
            hasher.update(part);
        }
        let result = hasher.finalize();
        Self(hex::encode(&result[..KEY_HEX_LEN / 2]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_strips_markup() {
        assert_eq!(
            canonicalize("[cheerfully] Welcome back, *waves* everyone (pause)"),
            "Welcome back, everyone"
        );
    }

    #[test]
    fn test_canonicalize_collapses_whitespace() {
        assert_eq!(canonicalize("  two   hundred\n points  "), "two hundred points");
    }

    #[test]
    fn test_canonicalize_plain_text_unchanged() {
        assert_eq!(canonicalize("What is the capital of France?"), "What is the capital of France?");
    }

    #[test]
    fn test_key_idempotent() {
        let a = AssetKey::for_speech("Correct! Ten points.", "host");
        let b = AssetKey::for_speech("Correct! Ten points.", "host");
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_ignores_markup() {
        let plain = AssetKey::for_speech("Correct! Ten points.", "host");
        let marked = AssetKey::for_speech("*claps* Correct! [beat] Ten points.", "host");
        assert_eq!(plain, marked);
    }

    #[test]
    fn test_key_differs_by_text() {
        let a = AssetKey::for_speech("Correct!", "host");
        let b = AssetKey::for_speech("Incorrect!", "host");
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_differs_by_voice() {
        let a = AssetKey::for_speech("Correct!", "host");
        let b = AssetKey::for_speech("Correct!", "coach");
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_length_fixed() {
        let key = AssetKey::for_data("any text at all");
        assert_eq!(key.as_str().len(), 16);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
