//! Generative model adapter.
//!
//! A thin seam over structured-generation providers so the board and
//! hint paths never see a specific SDK's error representation.

use async_trait::async_trait;

pub mod openai;

pub use openai::{OpenAiModelClient, OpenAiModelConfig};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during model calls.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("request timeout")]
    Timeout,

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;

// ============================================================================
// Model Client Trait
// ============================================================================

/// A generative model endpoint.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Unique identifier for the client (e.g. "openai")
    fn id(&self) -> &str;

    /// Request JSON output constrained by a schema description.
    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value>;

    /// Request a short free-text completion (hint generation).
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Extract the JSON object embedded in a model reply: models wrap JSON in
/// prose or code fences often enough that taking the outermost braces is
/// the reliable parse.
pub fn extract_json(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&content[start..=end])
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_from_fenced_reply() {
        let reply = "Here is the board:\n```json\n{\"categories\": []}\n```\nEnjoy!";
        assert_eq!(extract_json(reply), Some("{\"categories\": []}"));
    }

    #[test]
    fn test_extract_json_plain() {
        assert_eq!(extract_json("{\"a\": 1}"), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_json_absent() {
        assert_eq!(extract_json("no json here"), None);
    }
}
