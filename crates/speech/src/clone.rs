//! Voice-clone provider client
//!
//! Implements the ElevenLabs voice API: cloning a voice from an uploaded
//! audio sample and synthesizing speech with a cloned voice id.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::SpeechError;

/// Voice-clone provider interface.
///
/// Implementations:
/// - `ElevenLabsClient` - ElevenLabs voice API
#[async_trait]
pub trait VoiceCloneApi: Send + Sync + 'static {
    /// Clone a voice from an audio sample, returning the new voice id
    async fn clone_voice(&self, name: &str, sample_path: &Path) -> Result<String, SpeechError>;

    /// Synthesize text with a cloned voice, returning audio bytes (MP3)
    async fn synthesize(&self, voice_id: &str, text: &str) -> Result<Vec<u8>, SpeechError>;
}

/// Configuration for the ElevenLabs client
#[derive(Debug, Clone)]
pub struct ElevenLabsConfig {
    /// API key (from ELEVENLABS_API_KEY or direct)
    pub api_key: String,
    /// API endpoint (for testing or proxy)
    pub endpoint: String,
    /// Synthesis model id
    pub model_id: String,
    /// Voice stability setting
    pub stability: f32,
    /// Voice similarity boost setting
    pub similarity_boost: f32,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("ELEVENLABS_API_KEY").unwrap_or_default(),
            endpoint: "https://api.elevenlabs.io".to_string(),
            model_id: "eleven_monolingual_v1".to_string(),
            stability: 0.5,
            similarity_boost: 0.75,
            timeout: Duration::from_secs(30),
        }
    }
}

impl ElevenLabsConfig {
    /// Create config with API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Set endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// ElevenLabs voice API client
pub struct ElevenLabsClient {
    config: ElevenLabsConfig,
    client: Client,
}

impl ElevenLabsClient {
    /// Create a new client
    pub fn new(config: ElevenLabsConfig) -> Result<Self, SpeechError> {
        if config.api_key.is_empty() {
            return Err(SpeechError::Configuration(
                "ELEVENLABS_API_KEY not set. Set it via environment or config.".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl VoiceCloneApi for ElevenLabsClient {
    async fn clone_voice(&self, name: &str, sample_path: &Path) -> Result<String, SpeechError> {
        let sample = tokio::fs::read(sample_path).await?;
        let file_name = sample_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sample.mp3".to_string());

        let form = multipart::Form::new()
            .text("name", name.to_string())
            .text("description", "Cloned from user voice sample")
            .part(
                "files",
                multipart::Part::bytes(sample)
                    .file_name(file_name)
                    .mime_str("audio/mpeg")
                    .map_err(|e| SpeechError::Provider(e.to_string()))?,
            );

        let response = self
            .client
            .post(format!("{}/v1/voices/add", self.config.endpoint))
            .header("xi-api-key", &self.config.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SpeechError::Provider(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: CloneVoiceResponse = response
            .json()
            .await
            .map_err(|e| SpeechError::Provider(e.to_string()))?;

        tracing::info!(voice_id = %body.voice_id, "Voice cloned");
        Ok(body.voice_id)
    }

    async fn synthesize(&self, voice_id: &str, text: &str) -> Result<Vec<u8>, SpeechError> {
        let request = TtsRequest {
            text: text.to_string(),
            model_id: self.config.model_id.clone(),
            voice_settings: VoiceSettings {
                stability: self.config.stability,
                similarity_boost: self.config.similarity_boost,
            },
        };

        let voice_id = urlencoding::encode(voice_id);
        let response = self
            .client
            .post(format!(
                "{}/v1/text-to-speech/{}",
                self.config.endpoint, voice_id
            ))
            .header("xi-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SpeechError::Provider(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

// =============================================================================
// ElevenLabs API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct TtsRequest {
    text: String,
    model_id: String,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

#[derive(Debug, Deserialize)]
struct CloneVoiceResponse {
    voice_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_rejected() {
        let config = ElevenLabsConfig {
            api_key: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            ElevenLabsClient::new(config),
            Err(SpeechError::Configuration(_))
        ));
    }

    #[test]
    fn test_tts_request_serialization() {
        let request = TtsRequest {
            text: "Hello!".to_string(),
            model_id: "eleven_monolingual_v1".to_string(),
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.75,
            },
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""text":"Hello!""#));
        assert!(json.contains(r#""model_id":"eleven_monolingual_v1""#));
        assert!(json.contains(r#""stability":0.5"#));
    }

    #[test]
    fn test_clone_response_parsing() {
        let json = r#"{"voice_id": "abc123", "name": "Test_Voice"}"#;
        let response: CloneVoiceResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.voice_id, "abc123");
    }
}
