//! HTTP-level provider tests: error classification against a mock server.

use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quizdeck::core::model::{ModelClient, ModelError, OpenAiModelClient, OpenAiModelConfig};
use quizdeck::core::speech::providers::elevenlabs::{ElevenLabsConfig, ElevenLabsProvider};
use quizdeck::core::speech::providers::openai::{OpenAiSpeechConfig, OpenAiSpeechProvider};
use quizdeck::core::speech::{OutputFormat, SpeechError, SpeechProvider};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn elevenlabs(server: &MockServer) -> ElevenLabsProvider {
    init_logging();
    ElevenLabsProvider::new(ElevenLabsConfig {
        api_key: "test-key".to_string(),
        model_id: None,
        base_url: Some(server.uri()),
    })
}

fn openai_speech(server: &MockServer) -> OpenAiSpeechProvider {
    init_logging();
    OpenAiSpeechProvider::new(OpenAiSpeechConfig {
        api_key: "test-key".to_string(),
        base_url: Some(server.uri()),
        ..Default::default()
    })
}

fn openai_model(server: &MockServer) -> OpenAiModelClient {
    init_logging();
    OpenAiModelClient::new(OpenAiModelConfig {
        api_key: "test-key".to_string(),
        base_url: Some(server.uri()),
        ..Default::default()
    })
}

// ============================================================================
// ElevenLabs speech provider
// ============================================================================

#[tokio::test]
async fn elevenlabs_success_returns_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/text-to-speech/voice-1"))
        .and(header("xi-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp3-bytes".to_vec()))
        .mount(&server)
        .await;

    let bytes = elevenlabs(&server)
        .synthesize("Hello", "voice-1", OutputFormat::Mp3)
        .await
        .unwrap();
    assert_eq!(bytes, b"mp3-bytes");
}

#[tokio::test]
async fn elevenlabs_429_classified_as_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&server)
        .await;

    let err = elevenlabs(&server)
        .synthesize("Hello", "voice-1", OutputFormat::Mp3)
        .await
        .unwrap_err();
    assert!(matches!(err, SpeechError::RateLimited { retry_after_secs: 7 }));
}

#[tokio::test]
async fn elevenlabs_401_classified_as_auth_denied() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = elevenlabs(&server)
        .synthesize("Hello", "voice-1", OutputFormat::Mp3)
        .await
        .unwrap_err();
    assert!(matches!(err, SpeechError::AuthDenied(_)));
}

#[tokio::test]
async fn elevenlabs_403_restricted_voice_classified_as_auth_denied() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/text-to-speech/premium-voice"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = elevenlabs(&server)
        .synthesize("Hello", "premium-voice", OutputFormat::Mp3)
        .await
        .unwrap_err();
    match err {
        SpeechError::AuthDenied(reason) => assert!(reason.contains("premium-voice")),
        other => panic!("expected AuthDenied, got {other:?}"),
    }
}

#[tokio::test]
async fn elevenlabs_500_classified_as_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let err = elevenlabs(&server)
        .synthesize("Hello", "voice-1", OutputFormat::Mp3)
        .await
        .unwrap_err();
    match err {
        SpeechError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "upstream exploded");
        }
        other => panic!("expected Api, got {other:?}"),
    }
}

// ============================================================================
// OpenAI speech provider
// ============================================================================

#[tokio::test]
async fn openai_speech_success_sends_voice_and_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/speech"))
        .and(body_partial_json(serde_json::json!({
            "voice": "onyx",
            "response_format": "mp3"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"audio".to_vec()))
        .mount(&server)
        .await;

    let bytes = openai_speech(&server)
        .synthesize("Hello", "onyx", OutputFormat::Mp3)
        .await
        .unwrap();
    assert_eq!(bytes, b"audio");
}

#[tokio::test]
async fn openai_speech_429_classified_as_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = openai_speech(&server)
        .synthesize("Hello", "onyx", OutputFormat::Mp3)
        .await
        .unwrap_err();
    // No retry-after header: falls back to the documented 60s default
    assert!(matches!(err, SpeechError::RateLimited { retry_after_secs: 60 }));
}

// ============================================================================
// OpenAI model client
// ============================================================================

#[tokio::test]
async fn model_structured_generation_extracts_fenced_json() {
    let server = MockServer::start().await;
    let reply = serde_json::json!({
        "choices": [{
            "message": {
                "content": "Here you go:\n```json\n{\"categories\": [1, 2, 3]}\n```"
            }
        }]
    });
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply))
        .mount(&server)
        .await;

    let value = openai_model(&server)
        .generate_structured("make a board", &serde_json::json!({"type": "object"}))
        .await
        .unwrap();
    assert_eq!(value["categories"], serde_json::json!([1, 2, 3]));
}

#[tokio::test]
async fn model_missing_content_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
        .mount(&server)
        .await;

    let err = openai_model(&server)
        .generate_structured("make a board", &serde_json::json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::InvalidResponse(_)));
}

#[tokio::test]
async fn model_401_classified_as_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = openai_model(&server).complete("hint please").await.unwrap_err();
    assert!(matches!(err, ModelError::Auth(_)));
}

#[tokio::test]
async fn model_429_classified_as_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "12"))
        .mount(&server)
        .await;

    let err = openai_model(&server).complete("hint please").await.unwrap_err();
    assert!(matches!(err, ModelError::RateLimited { retry_after_secs: 12 }));
}

#[tokio::test]
async fn model_completion_trims_reply() {
    let server = MockServer::start().await;
    let reply = serde_json::json!({
        "choices": [{"message": {"content": "  Think of a striped big cat.  \n"}}]
    });
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply))
        .mount(&server)
        .await;

    let hint = openai_model(&server).complete("hint please").await.unwrap();
    assert_eq!(hint, "Think of a striped big cat.");
}
